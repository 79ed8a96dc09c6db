//! Simulation constants and serde scenario descriptions
//!
//! A scenario file is JSON with four optional sections:
//!
//! ```json
//! {
//!   "sim": { "gravity": 9.8, "dt": 0.0005, "sub_steps": 10, "restitution": 0.9 },
//!   "particles": [
//!     { "pos": [1.0, 8.0], "vel": [0.0, 0.0], "radius": 0.1, "mass": 1.0,
//!       "integrator": "improved", "rolling_friction": 0.0 }
//!   ],
//!   "barriers": [
//!     { "kind": "segment", "start": [0.0, 0.0], "end": [10.0, 0.0], "depth": 0.1 },
//!     { "kind": "point", "pos": [5.0, 5.0] },
//!     { "kind": "arc", "centre": [5.0, 5.0], "radius": 5.0,
//!       "start_angle": 0.0, "end_angle": 3.14159, "arc": "concave" },
//!     { "kind": "polyline", "points": [[0, 0], [10, 0], [10, 10]] }
//!   ],
//!   "connectors": [
//!     { "first": 0, "second": 1, "natural_length": 1.0, "stiffness": 20000.0,
//!       "damping": 1000.0, "slack": false }
//!   ],
//!   "scatter": { "seed": 7, "count": 20, "min": [1, 1], "max": [9, 9],
//!                "radius": 0.1, "mass": 1.0 }
//! }
//! ```
//!
//! Connector endpoints index the combined particle list: explicit particles
//! first, then scattered ones.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{DELTA_T, GRAVITY, RESTITUTION, SUB_STEPS_PER_FRAME};
use crate::error::{Result, SimError};
use crate::sim::{
    ArcBarrier, ArcKind, Barrier, Connector, Integrator, Particle, ParticleId, Simulation,
    Vector2D,
};

/// Global simulation constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Gravitational acceleration magnitude, applied along -y
    pub gravity: f64,
    /// Fixed sub-step size in seconds
    pub dt: f64,
    /// Sub-steps per rendered frame. Higher = more stable
    pub sub_steps: u32,
    /// Coefficient of restitution for particle pairs, in [0, 1]
    pub restitution: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            dt: DELTA_T,
            sub_steps: SUB_STEPS_PER_FRAME,
            restitution: RESTITUTION,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_sub_steps(mut self, sub_steps: u32) -> Self {
        self.sub_steps = sub_steps;
        self
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    /// Check every constant before a simulation is allowed to run
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::InvalidTimestep(self.dt));
        }
        if self.sub_steps == 0 {
            return Err(SimError::InvalidSubSteps(self.sub_steps));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimError::InvalidRestitution(self.restitution));
        }
        if !self.gravity.is_finite() {
            return Err(SimError::Config(format!("gravity must be finite (got {})", self.gravity)));
        }
        Ok(())
    }

    /// Simulated seconds covered by one rendered frame
    pub fn frame_time(&self) -> f64 {
        self.dt * self.sub_steps as f64
    }
}

/// Initial state of one particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSpec {
    pub pos: Vector2D,
    #[serde(default)]
    pub vel: Vector2D,
    pub radius: f64,
    pub mass: f64,
    #[serde(default)]
    pub integrator: Integrator,
    #[serde(default)]
    pub rolling_friction: f64,
    #[serde(default)]
    pub tag: u32,
}

impl ParticleSpec {
    pub fn build(&self) -> Result<Particle> {
        Particle::new(self.pos, self.vel, self.radius, self.mass)?
            .with_integrator(self.integrator)
            .with_rolling_friction(self.rolling_friction)
            .map(|p| p.with_tag(self.tag))
    }
}

/// Geometry of one barrier (or a chain of segments)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BarrierSpec {
    Segment {
        start: Vector2D,
        end: Vector2D,
        #[serde(default)]
        depth: Option<f64>,
    },
    Point {
        pos: Vector2D,
    },
    Arc {
        centre: Vector2D,
        radius: f64,
        /// Radians, anticlockwise from +x
        start_angle: f64,
        /// Radians; a full turn past `start_angle` closes the circle
        end_angle: f64,
        arc: ArcKind,
    },
    Polyline {
        points: Vec<Vector2D>,
        #[serde(default)]
        depth: Option<f64>,
    },
}

impl BarrierSpec {
    pub fn build(&self) -> Result<Vec<Barrier>> {
        match self {
            BarrierSpec::Segment { start, end, depth } => {
                Ok(vec![Barrier::segment(*start, *end, *depth)?])
            }
            BarrierSpec::Point { pos } => Ok(vec![Barrier::point(*pos)]),
            BarrierSpec::Arc {
                centre,
                radius,
                start_angle,
                end_angle,
                arc,
            } => Ok(vec![Barrier::Arc(ArcBarrier::new(
                *centre,
                *radius,
                *start_angle,
                *end_angle,
                *arc,
            )?)]),
            BarrierSpec::Polyline { points, depth } => {
                if points.len() < 2 {
                    return Err(SimError::Config("polyline needs at least two points".to_string()));
                }
                Barrier::polyline(points, *depth)
            }
        }
    }
}

/// A spring-damper between two particles, by index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub first: usize,
    pub second: usize,
    pub natural_length: f64,
    pub stiffness: f64,
    #[serde(default)]
    pub damping: f64,
    #[serde(default)]
    pub slack: bool,
    #[serde(default)]
    pub truncation: Option<f64>,
}

impl ConnectorSpec {
    pub fn build(&self) -> Result<Connector> {
        let connector = Connector::new(
            ParticleId(self.first),
            ParticleId(self.second),
            self.natural_length,
            self.stiffness,
            self.damping,
        )?
        .with_slack(self.slack);
        match self.truncation {
            Some(bound) => connector.with_truncation(bound),
            None => Ok(connector),
        }
    }
}

/// Seeded scattering of identical particles inside a box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterSpec {
    /// Run seed for reproducibility
    pub seed: u64,
    pub count: usize,
    /// Lower-left corner of the spawn box
    pub min: Vector2D,
    /// Upper-right corner of the spawn box
    pub max: Vector2D,
    pub radius: f64,
    pub mass: f64,
    /// Upper bound on the random initial speed
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default)]
    pub integrator: Integrator,
    #[serde(default)]
    pub rolling_friction: f64,
}

impl ScatterSpec {
    /// Generate the particles; the same seed always yields the same list
    pub fn build(&self) -> Result<Vec<Particle>> {
        if !(self.min.is_finite() && self.max.is_finite() && (self.max - self.min).is_finite()) {
            return Err(SimError::Config("scatter box must be finite".to_string()));
        }
        if !(self.min.x <= self.max.x && self.min.y <= self.max.y) {
            return Err(SimError::Config("scatter box min must not exceed max".to_string()));
        }
        if !(self.max_speed >= 0.0 && self.max_speed.is_finite()) {
            return Err(SimError::Config("scatter max_speed must be finite and >= 0".to_string()));
        }

        let mut rng = Pcg32::seed_from_u64(self.seed);
        (0..self.count)
            .map(|_| {
                let pos = Vector2D::new(
                    rng.random_range(self.min.x..=self.max.x),
                    rng.random_range(self.min.y..=self.max.y),
                );
                let heading = rng.random_range(0.0..std::f64::consts::TAU);
                let speed = rng.random_range(0.0..=self.max_speed);
                let vel = Vector2D::from_angle(heading) * speed;
                Particle::new(pos, vel, self.radius, self.mass)?
                    .with_integrator(self.integrator)
                    .with_rolling_friction(self.rolling_friction)
            })
            .collect()
    }
}

/// Top-level scenario configuration loaded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub sim: SimConfig,
    pub particles: Vec<ParticleSpec>,
    pub barriers: Vec<BarrierSpec>,
    pub connectors: Vec<ConnectorSpec>,
    pub scatter: Option<ScatterSpec>,
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        log::info!("Loaded scenario from {}", path.display());
        Self::from_json_str(&json)
    }

    /// Validate every entity and assemble a ready-to-step simulation
    pub fn build(&self) -> Result<Simulation> {
        let mut sim = Simulation::new(self.sim.clone())?;

        for spec in &self.particles {
            sim.add_particle(spec.build()?);
        }
        if let Some(scatter) = &self.scatter {
            for particle in scatter.build()? {
                sim.add_particle(particle);
            }
        }
        for spec in &self.barriers {
            for barrier in spec.build()? {
                sim.add_barrier(barrier);
            }
        }
        for spec in &self.connectors {
            sim.add_connector(spec.build()?)?;
        }

        log::info!(
            "Scenario: {} particles, {} barriers, {} connectors, dt={} x{}",
            sim.particles().len(),
            sim.barriers().len(),
            sim.connectors().len(),
            self.sim.dt,
            self.sim.sub_steps
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.gravity, 9.8);
        assert_eq!(cfg.sub_steps, 10);
        assert!((cfg.frame_time() - 0.005).abs() < 1e-12);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_constants() {
        assert_eq!(
            SimConfig::new().with_dt(0.0).validate(),
            Err(SimError::InvalidTimestep(0.0))
        );
        assert_eq!(
            SimConfig::new().with_sub_steps(0).validate(),
            Err(SimError::InvalidSubSteps(0))
        );
        assert_eq!(
            SimConfig::new().with_restitution(1.5).validate(),
            Err(SimError::InvalidRestitution(1.5))
        );
        assert!(Simulation::new(SimConfig::new().with_gravity(f64::NAN)).is_err());
    }

    #[test]
    fn test_partial_sim_section_uses_defaults() {
        let cfg: SimConfig = serde_json::from_str(r#"{ "dt": 0.01 }"#).unwrap();
        assert_eq!(cfg.dt, 0.01);
        assert_eq!(cfg.restitution, RESTITUTION);
    }

    #[test]
    fn test_barrier_spec_kinds() {
        let specs: Vec<BarrierSpec> = serde_json::from_str(
            r#"[
                { "kind": "segment", "start": [0, 0], "end": [1, 0] },
                { "kind": "point", "pos": [2, 2] },
                { "kind": "arc", "centre": [0, 0], "radius": 1.0,
                  "start_angle": 0.0, "end_angle": 6.3, "arc": "convex" },
                { "kind": "polyline", "points": [[0, 0], [1, 0], [1, 1]], "depth": 0.2 }
            ]"#,
        )
        .unwrap();
        let built: Vec<usize> = specs.iter().map(|s| s.build().unwrap().len()).collect();
        assert_eq!(built, vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_degenerate_specs_fail_at_build() {
        let seg = BarrierSpec::Segment {
            start: Vector2D::ONE,
            end: Vector2D::ONE,
            depth: None,
        };
        assert!(matches!(seg.build(), Err(SimError::DegenerateSegment { .. })));

        let particle = ParticleSpec {
            pos: Vector2D::ZERO,
            vel: Vector2D::ZERO,
            radius: 0.1,
            mass: -1.0,
            integrator: Integrator::Basic,
            rolling_friction: 0.0,
            tag: 0,
        };
        assert_eq!(particle.build().unwrap_err(), SimError::InvalidMass(-1.0));
    }

    #[test]
    fn test_scatter_is_seeded() {
        let spec = ScatterSpec {
            seed: 42,
            count: 16,
            min: Vector2D::new(1.0, 1.0),
            max: Vector2D::new(9.0, 4.0),
            radius: 0.05,
            mass: 1.0,
            max_speed: 2.0,
            integrator: Integrator::Improved,
            rolling_friction: 0.0,
        };
        let a = spec.build().unwrap();
        let b = spec.build().unwrap();
        assert_eq!(a.len(), 16);
        for (p, q) in a.iter().zip(&b) {
            assert_eq!(p.pos(), q.pos());
            assert_eq!(p.vel(), q.vel());
            assert!(p.pos().x >= 1.0 && p.pos().x <= 9.0);
            assert!(p.pos().y >= 1.0 && p.pos().y <= 4.0);
            assert!(p.vel().length() <= 2.0 + 1e-12);
        }

        let other = ScatterSpec { seed: 43, ..spec }.build().unwrap();
        assert_ne!(other[0].pos(), a[0].pos());
    }

    #[test]
    fn test_scatter_rejects_unbounded_box() {
        let spec: ScatterSpec = serde_json::from_str(
            r#"{ "seed": 1, "count": 4, "min": [-1e308, 0.0], "max": [1e308, 1.0],
                 "radius": 0.1, "mass": 1.0 }"#,
        )
        .unwrap();
        assert!(matches!(spec.build(), Err(SimError::Config(_))));

        let inverted = ScatterSpec {
            min: Vector2D::new(2.0, 0.0),
            max: Vector2D::new(1.0, 1.0),
            ..spec
        };
        assert!(matches!(inverted.build(), Err(SimError::Config(_))));
    }
}
