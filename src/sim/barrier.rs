//! Static barriers: immovable colliders that bounce particles back
//!
//! Every shape exposes the same two operations through [`Collider`]; the
//! simulation only ever talks to that trait, so adding a shape means adding
//! a type and a [`Barrier`] variant.

use serde::{Deserialize, Serialize};

use super::arc::ArcBarrier;
use super::collision::bounce_off_surface;
use super::vector::{Vector2D, Vector2DExt};
use crate::error::{Result, SimError};

/// Collision capability shared by every barrier shape
pub trait Collider {
    /// Whether a circle at `centre` with `radius` overlaps the barrier
    fn is_circle_colliding(&self, centre: Vector2D, radius: f64) -> bool;

    /// Velocity after bouncing off the barrier at `pos`
    fn velocity_after_collision(&self, pos: Vector2D, vel: Vector2D) -> Vector2D;
}

/// A straight wall between two endpoints.
///
/// The permitted side is to the left when walking from `start` to `end`
/// (the unit tangent rotated a quarter turn anticlockwise), so listing a
/// closed outline anticlockwise makes every normal face inwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SegmentGeometry", try_from = "SegmentGeometry")]
pub struct SegmentBarrier {
    start: Vector2D,
    end: Vector2D,
    unit_tangent: Vector2D,
    unit_normal: Vector2D,
    length: f64,
    /// Wall thickness behind the surface; `None` is an infinite half-plane
    depth: Option<f64>,
}

/// Defining fields of a segment; the derived basis is rebuilt on load
#[derive(Serialize, Deserialize)]
struct SegmentGeometry {
    start: Vector2D,
    end: Vector2D,
    #[serde(default)]
    depth: Option<f64>,
}

impl From<SegmentBarrier> for SegmentGeometry {
    fn from(seg: SegmentBarrier) -> Self {
        Self {
            start: seg.start,
            end: seg.end,
            depth: seg.depth,
        }
    }
}

impl TryFrom<SegmentGeometry> for SegmentBarrier {
    type Error = SimError;

    fn try_from(geometry: SegmentGeometry) -> Result<Self> {
        match geometry.depth {
            Some(depth) => Self::with_depth(geometry.start, geometry.end, depth),
            None => Self::new(geometry.start, geometry.end),
        }
    }
}

impl SegmentBarrier {
    pub fn new(start: Vector2D, end: Vector2D) -> Result<Self> {
        Self::build(start, end, None)
    }

    /// Segment that only registers collisions within `depth` behind its surface
    pub fn with_depth(start: Vector2D, end: Vector2D, depth: f64) -> Result<Self> {
        if !(depth > 0.0 && depth.is_finite()) {
            return Err(SimError::InvalidDepth(depth));
        }
        Self::build(start, end, Some(depth))
    }

    fn build(start: Vector2D, end: Vector2D, depth: Option<f64>) -> Result<Self> {
        let along = end - start;
        let length = along.length();
        let unit_tangent = along
            .checked_normalize()
            .map_err(|_| SimError::DegenerateSegment { x: start.x, y: start.y })?;
        Ok(Self {
            start,
            end,
            unit_tangent,
            unit_normal: unit_tangent.rotate90_anticlockwise(),
            length,
            depth,
        })
    }

    pub fn start(&self) -> Vector2D {
        self.start
    }

    pub fn end(&self) -> Vector2D {
        self.end
    }

    pub fn unit_tangent(&self) -> Vector2D {
        self.unit_tangent
    }

    pub fn unit_normal(&self) -> Vector2D {
        self.unit_normal
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn depth(&self) -> Option<f64> {
        self.depth
    }

    /// Signed distance from the supporting line (positive on the permitted side)
    pub fn signed_distance(&self, point: Vector2D) -> f64 {
        (point - self.start).dot(self.unit_normal)
    }
}

impl Collider for SegmentBarrier {
    fn is_circle_colliding(&self, centre: Vector2D, radius: f64) -> bool {
        let ap = centre - self.start;
        let dist_to_surface = ap.dot(self.unit_normal);
        let dist_along = ap.dot(self.unit_tangent);
        let within_depth = match self.depth {
            Some(depth) => dist_to_surface >= -(depth + radius),
            None => true,
        };
        dist_to_surface <= radius && within_depth && dist_along >= 0.0 && dist_along <= self.length
    }

    fn velocity_after_collision(&self, _pos: Vector2D, vel: Vector2D) -> Vector2D {
        bounce_off_surface(vel, self.unit_tangent, self.unit_normal)
    }
}

/// A single fixed point, e.g. a corner cap between two segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointBarrier {
    pos: Vector2D,
}

impl PointBarrier {
    pub fn new(pos: Vector2D) -> Self {
        Self { pos }
    }

    pub fn pos(&self) -> Vector2D {
        self.pos
    }
}

impl Collider for PointBarrier {
    fn is_circle_colliding(&self, centre: Vector2D, radius: f64) -> bool {
        centre.dist(self.pos) <= radius
    }

    fn velocity_after_collision(&self, pos: Vector2D, vel: Vector2D) -> Vector2D {
        // A centre sitting exactly on the point has no outward direction
        match (pos - self.pos).checked_normalize() {
            Ok(normal) => bounce_off_surface(vel, normal.rotate90_anticlockwise(), normal),
            Err(_) => vel,
        }
    }
}

/// Closed set of barrier shapes held by a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Barrier {
    Segment(SegmentBarrier),
    Point(PointBarrier),
    Arc(ArcBarrier),
}

impl Barrier {
    pub fn segment(start: Vector2D, end: Vector2D, depth: Option<f64>) -> Result<Self> {
        SegmentGeometry { start, end, depth }
            .try_into()
            .map(Barrier::Segment)
    }

    pub fn point(pos: Vector2D) -> Self {
        Barrier::Point(PointBarrier::new(pos))
    }

    /// Consecutive segments joining `points` in order.
    ///
    /// List the outline anticlockwise for normals that face the enclosed area.
    pub fn polyline(points: &[Vector2D], depth: Option<f64>) -> Result<Vec<Self>> {
        points
            .windows(2)
            .map(|pair| Barrier::segment(pair[0], pair[1], depth))
            .collect()
    }
}

impl Collider for Barrier {
    fn is_circle_colliding(&self, centre: Vector2D, radius: f64) -> bool {
        match self {
            Barrier::Segment(b) => b.is_circle_colliding(centre, radius),
            Barrier::Point(b) => b.is_circle_colliding(centre, radius),
            Barrier::Arc(b) => b.is_circle_colliding(centre, radius),
        }
    }

    fn velocity_after_collision(&self, pos: Vector2D, vel: Vector2D) -> Vector2D {
        match self {
            Barrier::Segment(b) => b.velocity_after_collision(pos, vel),
            Barrier::Point(b) => b.velocity_after_collision(pos, vel),
            Barrier::Arc(b) => b.velocity_after_collision(pos, vel),
        }
    }
}
