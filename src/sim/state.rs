//! Simulation state and the queries an event layer runs between steps
//!
//! Everything a step reads or writes lives in [`Simulation`]. Entities are
//! addressed by index handles that stay valid for the whole run (nothing is
//! ever removed), so the collections keep a stable enumeration order.

use serde::{Deserialize, Serialize};

use super::barrier::{Barrier, Collider};
use super::collision::resolve_elastic_collision;
use super::connector::Connector;
use super::particle::Particle;
use super::vector::{Vector2D, Vector2DExt};
use crate::config::SimConfig;
use crate::error::{Result, SimError};

/// Handle to a particle owned by a [`Simulation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub usize);

/// Handle to a barrier owned by a [`Simulation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BarrierId(pub usize);

/// Handle to a connector owned by a [`Simulation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorId(pub usize);

/// Something that happened during a step, reported back to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepEvent {
    /// A barrier overwrote this particle's velocity
    BarrierContact { particle: ParticleId, barrier: BarrierId },
    /// Two particles exchanged a collision impulse
    ParticleCollision { first: ParticleId, second: ParticleId },
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    /// Global constants
    pub(super) config: SimConfig,
    /// Particles in enumeration order
    pub(super) particles: Vec<Particle>,
    /// Persistent per-particle forces (thrusters), indexed like `particles`
    pub(super) external_forces: Vec<Vector2D>,
    /// Barriers in enumeration order
    pub(super) barriers: Vec<Barrier>,
    /// Connectors in enumeration order
    pub(super) connectors: Vec<Connector>,
    /// Sub-steps completed so far
    pub(super) time_ticks: u64,
}

impl Simulation {
    /// Create an empty simulation; fails if the constants are unusable
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            particles: Vec::new(),
            external_forces: Vec::new(),
            barriers: Vec::new(),
            connectors: Vec::new(),
            time_ticks: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Sub-steps completed so far
    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Simulated time in seconds
    pub fn elapsed(&self) -> f64 {
        self.time_ticks as f64 * self.config.dt
    }

    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        let id = ParticleId(self.particles.len());
        log::debug!(
            "particle {} added at ({:.3}, {:.3}) r={} m={}",
            id.0,
            particle.pos().x,
            particle.pos().y,
            particle.radius(),
            particle.mass()
        );
        self.particles.push(particle);
        self.external_forces.push(Vector2D::ZERO);
        id
    }

    pub fn add_barrier(&mut self, barrier: Barrier) -> BarrierId {
        let id = BarrierId(self.barriers.len());
        log::debug!("barrier {} added: {:?}", id.0, barrier);
        self.barriers.push(barrier);
        id
    }

    /// Insert a connector between steps; both endpoints must already exist
    pub fn add_connector(&mut self, connector: Connector) -> Result<ConnectorId> {
        self.check_particle(connector.first())?;
        self.check_particle(connector.second())?;
        let id = ConnectorId(self.connectors.len());
        log::debug!(
            "connector {} links particles {} and {} at tick {}",
            id.0,
            connector.first().0,
            connector.second().0,
            self.time_ticks
        );
        self.connectors.push(connector);
        Ok(id)
    }

    fn check_particle(&self, id: ParticleId) -> Result<()> {
        if id.0 < self.particles.len() {
            Ok(())
        } else {
            Err(SimError::UnknownParticle {
                id,
                count: self.particles.len(),
            })
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn particle(&self, id: ParticleId) -> Result<&Particle> {
        self.particles.get(id.0).ok_or(SimError::UnknownParticle {
            id,
            count: self.particles.len(),
        })
    }

    pub fn barrier(&self, id: BarrierId) -> Result<&Barrier> {
        self.barriers.get(id.0).ok_or(SimError::UnknownBarrier {
            id,
            count: self.barriers.len(),
        })
    }

    pub fn connector(&self, id: ConnectorId) -> Result<&Connector> {
        self.connectors.get(id.0).ok_or(SimError::UnknownConnector {
            id,
            count: self.connectors.len(),
        })
    }

    /// Current distance between a connector's endpoints
    pub fn connector_length(&self, id: ConnectorId) -> Result<f64> {
        self.connector(id)?.length(&self.particles)
    }

    /// Current signed tension in a connector; positive pulls the endpoints together
    pub fn connector_tension(&self, id: ConnectorId) -> Result<f64> {
        self.connector(id)?.tension(&self.particles)
    }

    pub fn position(&self, id: ParticleId) -> Result<Vector2D> {
        self.particle(id).map(Particle::pos)
    }

    pub fn velocity(&self, id: ParticleId) -> Result<Vector2D> {
        self.particle(id).map(Particle::vel)
    }

    pub fn radius(&self, id: ParticleId) -> Result<f64> {
        self.particle(id).map(Particle::radius)
    }

    /// Persistent force added to the particle at the start of every step
    pub fn set_external_force(&mut self, id: ParticleId, force: Vector2D) -> Result<()> {
        self.check_particle(id)?;
        self.external_forces[id.0] = force;
        Ok(())
    }

    pub fn clear_external_force(&mut self, id: ParticleId) -> Result<()> {
        self.set_external_force(id, Vector2D::ZERO)
    }

    pub fn external_force(&self, id: ParticleId) -> Result<Vector2D> {
        self.check_particle(id)?;
        Ok(self.external_forces[id.0])
    }

    /// Whether the particle currently overlaps the barrier
    pub fn is_colliding(&self, particle: ParticleId, barrier: BarrierId) -> Result<bool> {
        let p = self.particle(particle)?;
        let b = self.barrier(barrier)?;
        Ok(b.is_circle_colliding(p.pos(), p.radius()))
    }

    /// Whether the particle is currently clear of the barrier
    pub fn is_clear_of(&self, particle: ParticleId, barrier: BarrierId) -> Result<bool> {
        self.is_colliding(particle, barrier).map(|hit| !hit)
    }

    /// Other particles whose centres lie strictly within `distance` of `id`
    pub fn particles_within(&self, id: ParticleId, distance: f64) -> Result<Vec<ParticleId>> {
        let centre = self.position(id)?;
        Ok(self
            .particles
            .iter()
            .enumerate()
            .filter(|(i, p)| *i != id.0 && p.pos().dist(centre) < distance)
            .map(|(i, _)| ParticleId(i))
            .collect())
    }

    /// Resolve a collision between two particles with the configured restitution.
    ///
    /// Errors if either id is unknown, if both ids are the same particle, or if
    /// the pair is not currently colliding.
    pub fn resolve_pair(&mut self, first: ParticleId, second: ParticleId) -> Result<f64> {
        self.check_particle(first)?;
        self.check_particle(second)?;
        let restitution = self.config.restitution;
        let Some((a, b)) = pair_mut(&mut self.particles, first.0, second.0) else {
            return Err(SimError::NotColliding {
                pair: Some((first, second)),
            });
        };
        resolve_elastic_collision(a, b, restitution).map_err(|err| match err {
            SimError::NotColliding { .. } => SimError::NotColliding {
                pair: Some((first, second)),
            },
            other => other,
        })
    }

    /// Total kinetic energy of all particles
    pub fn kinetic_energy(&self) -> f64 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    /// Serialize the full state to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a state produced by [`to_json`](Simulation::to_json).
    ///
    /// Every particle, barrier and connector goes through the same checks as
    /// its constructor, so a hand-edited snapshot cannot smuggle in a zero
    /// mass or a degenerate segment.
    pub fn from_json(json: &str) -> Result<Self> {
        let sim: Simulation = serde_json::from_str(json)?;
        sim.config.validate()?;
        if sim.external_forces.len() != sim.particles.len() {
            return Err(SimError::Config(
                "external force table does not match particle count".to_string(),
            ));
        }
        for connector in &sim.connectors {
            sim.check_particle(connector.first())?;
            sim.check_particle(connector.second())?;
        }
        Ok(sim)
    }
}

/// Two distinct mutable elements of a slice
pub(super) fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> Option<(&mut T, &mut T)> {
    if i == j || i >= items.len() || j >= items.len() {
        return None;
    }
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        Some((&mut head[i], &mut tail[0]))
    } else {
        let (head, tail) = items.split_at_mut(i);
        Some((&mut tail[0], &mut head[j]))
    }
}
