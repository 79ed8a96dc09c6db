//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (by insertion index)
//! - No rendering, input or platform dependencies

pub mod arc;
pub mod barrier;
pub mod collision;
pub mod connector;
pub mod particle;
pub mod state;
pub mod tick;
pub mod vector;

pub use arc::{ArcBarrier, ArcKind};
pub use barrier::{Barrier, Collider, PointBarrier, SegmentBarrier};
pub use collision::{bounce_off_surface, particles_colliding, resolve_elastic_collision};
pub use connector::Connector;
pub use particle::{Integrator, Particle};
pub use state::{BarrierId, ConnectorId, ParticleId, Simulation, StepEvent};
pub use vector::{Vector2D, Vector2DExt};
