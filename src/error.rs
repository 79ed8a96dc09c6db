//! Error types for simulation construction and operations.

use std::fmt;

use crate::sim::{BarrierId, ConnectorId, ParticleId};

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised when building or driving a simulation.
///
/// Configuration errors are detected when an entity is constructed, so a
/// running step never sees degenerate geometry or masses.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Mass must be positive and finite.
    InvalidMass(f64),
    /// Radius must be positive and finite.
    InvalidRadius(f64),
    /// Timestep must be positive and finite.
    InvalidTimestep(f64),
    /// At least one sub-step per frame is required.
    InvalidSubSteps(u32),
    /// Restitution must lie in [0, 1].
    InvalidRestitution(f64),
    /// Rolling friction must be finite and non-negative.
    InvalidFriction(f64),
    /// A zero-length vector was normalized.
    DegenerateVector,
    /// Segment endpoints coincide.
    DegenerateSegment { x: f64, y: f64 },
    /// Barrier depth must be positive and finite.
    InvalidDepth(f64),
    /// Arc radius or angular span is unusable.
    InvalidArc(&'static str),
    /// Connector parameters are unusable.
    InvalidConnector(&'static str),
    /// Particle handle does not belong to this simulation.
    UnknownParticle { id: ParticleId, count: usize },
    /// Barrier handle does not belong to this simulation.
    UnknownBarrier { id: BarrierId, count: usize },
    /// Connector handle does not belong to this simulation.
    UnknownConnector { id: ConnectorId, count: usize },
    /// Collision resolution was requested for a pair that is not colliding.
    /// `pair` is filled in when the particles belong to a simulation.
    NotColliding { pair: Option<(ParticleId, ParticleId)> },
    /// Scenario file could not be read or parsed.
    Config(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidMass(m) => write!(f, "mass must be positive and finite (got {})", m),
            SimError::InvalidRadius(r) => {
                write!(f, "radius must be positive and finite (got {})", r)
            }
            SimError::InvalidTimestep(dt) => {
                write!(f, "timestep must be positive and finite (got {})", dt)
            }
            SimError::InvalidSubSteps(n) => write!(f, "sub-steps per frame must be >= 1 (got {})", n),
            SimError::InvalidRestitution(e) => write!(f, "restitution must be in [0, 1] (got {})", e),
            SimError::InvalidFriction(k) => {
                write!(f, "rolling friction must be finite and >= 0 (got {})", k)
            }
            SimError::DegenerateVector => write!(f, "cannot normalize a zero-length vector"),
            SimError::DegenerateSegment { x, y } => {
                write!(f, "segment endpoints coincide at ({}, {})", x, y)
            }
            SimError::InvalidDepth(d) => {
                write!(f, "barrier depth must be positive and finite (got {})", d)
            }
            SimError::InvalidArc(reason) => write!(f, "invalid arc barrier: {}", reason),
            SimError::InvalidConnector(reason) => write!(f, "invalid connector: {}", reason),
            SimError::UnknownParticle { id, count } => {
                write!(f, "particle {} out of bounds (count: {})", id.0, count)
            }
            SimError::UnknownBarrier { id, count } => {
                write!(f, "barrier {} out of bounds (count: {})", id.0, count)
            }
            SimError::UnknownConnector { id, count } => {
                write!(f, "connector {} out of bounds (count: {})", id.0, count)
            }
            SimError::NotColliding { pair: Some((a, b)) } => write!(
                f,
                "particles {} and {} are not colliding; refusing to resolve",
                a.0, b.0
            ),
            SimError::NotColliding { pair: None } => {
                write!(f, "particles are not colliding; refusing to resolve")
            }
            SimError::Config(msg) => write!(f, "scenario config error: {}", msg),
        }
    }
}

impl std::error::Error for SimError {}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Config(err.to_string())
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Config(err.to_string())
    }
}
