//! Circular arc barriers for curved walls and round bumpers
//!
//! An arc is defined in polar coordinates around its own centre:
//! - radius: distance from the centre to the wall surface
//! - theta_start: angle where the wall begins (radians, anticlockwise from +x)
//! - span: anticlockwise angular extent, up to a full circle
//!
//! A concave arc keeps particles inside the circle (a domed arena roof), a
//! convex arc keeps them outside (a round bumper).

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::barrier::Collider;
use super::collision::bounce_off_surface;
use super::vector::{Vector2D, Vector2DExt};
use crate::error::{Result, SimError};
use crate::{cartesian_to_polar, normalize_angle, polar_to_cartesian};

/// Which side of the arc is the permitted side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcKind {
    /// Particles live inside the circle; the normal points at the centre
    Concave,
    /// Particles live outside the circle; the normal points away from the centre
    Convex,
}

/// A circular wall covering part (or all) of a circle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArcState")]
pub struct ArcBarrier {
    centre: Vector2D,
    radius: f64,
    /// Start angle (radians, normalized to [0, 2π))
    theta_start: f64,
    /// Anticlockwise extent in (0, 2π]
    span: f64,
    /// Serialized as `arc`; `kind` is the [`Barrier`](super::Barrier) tag
    #[serde(rename = "arc")]
    kind: ArcKind,
}

/// Stored form of an [`ArcBarrier`]; loading re-checks radius and span
#[derive(Deserialize)]
struct ArcState {
    centre: Vector2D,
    radius: f64,
    theta_start: f64,
    span: f64,
    #[serde(rename = "arc")]
    kind: ArcKind,
}

impl TryFrom<ArcState> for ArcBarrier {
    type Error = SimError;

    fn try_from(state: ArcState) -> Result<Self> {
        check_circle(state.centre, state.radius)?;
        if !(0.0..TAU).contains(&state.theta_start) {
            return Err(SimError::InvalidArc("start angle must lie in [0, 2π)"));
        }
        if !(state.span > 0.0 && state.span <= TAU) {
            return Err(SimError::InvalidArc("angular span must lie in (0, 2π]"));
        }
        Ok(Self {
            centre: state.centre,
            radius: state.radius,
            theta_start: state.theta_start,
            span: state.span,
            kind: state.kind,
        })
    }
}

fn check_circle(centre: Vector2D, radius: f64) -> Result<()> {
    if !centre.is_finite() {
        return Err(SimError::InvalidArc("centre must be finite"));
    }
    if !(radius > 0.0 && radius.is_finite()) {
        return Err(SimError::InvalidArc("radius must be positive and finite"));
    }
    Ok(())
}

impl ArcBarrier {
    /// Build an arc running anticlockwise from `theta_start` to `theta_end`.
    ///
    /// An end angle a full turn or more past the start gives a closed circle;
    /// an end angle below the start wraps around through 2π.
    pub fn new(
        centre: Vector2D,
        radius: f64,
        theta_start: f64,
        theta_end: f64,
        kind: ArcKind,
    ) -> Result<Self> {
        check_circle(centre, radius)?;
        if !(theta_start.is_finite() && theta_end.is_finite()) {
            return Err(SimError::InvalidArc("angles must be finite"));
        }

        let raw = theta_end - theta_start;
        let span = if raw >= TAU {
            TAU
        } else if raw > 0.0 {
            raw
        } else {
            // Wraparound case (e.g., start=170°, end=-170°)
            normalize_angle(raw)
        };
        if span <= 0.0 {
            return Err(SimError::InvalidArc("angular span is empty"));
        }

        Ok(Self {
            centre,
            radius,
            theta_start: normalize_angle(theta_start),
            span,
            kind,
        })
    }

    /// Closed circle of the given kind
    pub fn circle(centre: Vector2D, radius: f64, kind: ArcKind) -> Result<Self> {
        Self::new(centre, radius, 0.0, TAU, kind)
    }

    pub fn centre(&self) -> Vector2D {
        self.centre
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn kind(&self) -> ArcKind {
        self.kind
    }

    pub fn theta_start(&self) -> f64 {
        self.theta_start
    }

    /// End angle (radians, normalized to [0, 2π))
    pub fn theta_end(&self) -> f64 {
        normalize_angle(self.theta_start + self.span)
    }

    /// Angular span of the arc (handles wraparound)
    pub fn angular_span(&self) -> f64 {
        self.span
    }

    /// Check if an angle is within the arc's angular extent
    pub fn contains_angle(&self, theta: f64) -> bool {
        if self.span >= TAU {
            return true;
        }
        normalize_angle(theta - self.theta_start) <= self.span
    }

    /// Point on the wall at the middle of the span
    pub fn midpoint(&self) -> Vector2D {
        self.centre + polar_to_cartesian(self.radius, self.theta_start + self.span / 2.0)
    }

    /// Unit normal at `pos`, pointing to the permitted side
    pub fn normal_at(&self, pos: Vector2D) -> Result<Vector2D> {
        let outward = (pos - self.centre).checked_normalize()?;
        Ok(match self.kind {
            ArcKind::Concave => -outward,
            ArcKind::Convex => outward,
        })
    }
}

impl Collider for ArcBarrier {
    fn is_circle_colliding(&self, centre: Vector2D, radius: f64) -> bool {
        let (dist, theta) = cartesian_to_polar(centre - self.centre);
        if !self.contains_angle(theta) {
            return false;
        }
        match self.kind {
            ArcKind::Concave => dist + radius >= self.radius,
            ArcKind::Convex => dist - radius <= self.radius,
        }
    }

    fn velocity_after_collision(&self, pos: Vector2D, vel: Vector2D) -> Vector2D {
        // A centre sitting exactly on the arc centre has no radial direction
        match self.normal_at(pos) {
            Ok(normal) => bounce_off_surface(vel, normal.rotate90_anticlockwise(), normal),
            Err(_) => vel,
        }
    }
}
