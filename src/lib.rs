//! pointmass2d - deterministic 2D point-mass physics
//!
//! Core modules:
//! - `sim`: Fixed-step simulation (particles, barriers, connectors, step order)
//! - `config`: Serde scenario descriptions and simulation constants
//! - `error`: Construction and operation errors
//!
//! The crate never draws, polls input or paces frames. A driver calls
//! [`sim::Simulation::step`] (or `run_frame`) and reads positions back.

pub mod config;
pub mod error;
pub mod sim;

pub use config::{BarrierSpec, ConnectorSpec, ParticleSpec, ScatterSpec, ScenarioConfig, SimConfig};
pub use error::{Result, SimError};
pub use sim::{
    ArcBarrier, ArcKind, Barrier, BarrierId, Collider, Connector, ConnectorId, Integrator,
    Particle, ParticleId, PointBarrier, SegmentBarrier, Simulation, StepEvent, Vector2D,
    Vector2DExt,
};

/// Simulation default constants
pub mod consts {
    /// Gravitational acceleration (m/s²), applied along -y
    pub const GRAVITY: f64 = 9.8;
    /// Delay between two rendered frames (seconds)
    pub const FRAME_DELAY: f64 = 0.02;
    /// Physics sub-steps per rendered frame
    pub const SUB_STEPS_PER_FRAME: u32 = 10;
    /// Fixed sub-step size (seconds), a quarter of the real frame slice
    pub const DELTA_T: f64 = FRAME_DELAY / SUB_STEPS_PER_FRAME as f64 / 4.0;
    /// Coefficient of restitution for every particle pair
    pub const RESTITUTION: f64 = 0.9;
}

/// Normalized angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> Vector2D {
    Vector2D::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vector2D) -> (f64, f64) {
    (pos.length(), pos.y.atan2(pos.x))
}
