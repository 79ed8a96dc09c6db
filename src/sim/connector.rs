//! Spring-damper connectors between pairs of particles

use serde::{Deserialize, Serialize};

use super::particle::Particle;
use super::state::ParticleId;
use super::vector::{Vector2D, Vector2DExt};
use crate::error::{Result, SimError};

/// An elastic link between two particles.
///
/// The connector refers to its endpoints by id; the particles stay owned by
/// the simulation. Tension follows Hooke's law plus a damping term on the rate
/// of extension, and is added to both endpoints' force accumulators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConnectorState")]
pub struct Connector {
    first: ParticleId,
    second: ParticleId,
    natural_length: f64,
    stiffness: f64,
    damping: f64,
    /// Cable semantics: no force while shorter than the natural length
    can_go_slack: bool,
    /// Bound on the magnitude of the Hooke's law term
    truncation: Option<f64>,
}

/// Stored form of a [`Connector`]; loading re-runs construction checks
#[derive(Deserialize)]
struct ConnectorState {
    first: ParticleId,
    second: ParticleId,
    natural_length: f64,
    stiffness: f64,
    damping: f64,
    can_go_slack: bool,
    truncation: Option<f64>,
}

impl TryFrom<ConnectorState> for Connector {
    type Error = SimError;

    fn try_from(state: ConnectorState) -> Result<Self> {
        let connector = Connector::new(
            state.first,
            state.second,
            state.natural_length,
            state.stiffness,
            state.damping,
        )?
        .with_slack(state.can_go_slack);
        match state.truncation {
            Some(bound) => connector.with_truncation(bound),
            None => Ok(connector),
        }
    }
}

fn non_negative(value: f64) -> bool {
    value >= 0.0 && value.is_finite()
}

impl Connector {
    pub fn new(
        first: ParticleId,
        second: ParticleId,
        natural_length: f64,
        stiffness: f64,
        damping: f64,
    ) -> Result<Self> {
        if first == second {
            return Err(SimError::InvalidConnector("endpoints must be distinct particles"));
        }
        if !non_negative(natural_length) {
            return Err(SimError::InvalidConnector("natural length must be finite and >= 0"));
        }
        if !non_negative(stiffness) {
            return Err(SimError::InvalidConnector("stiffness must be finite and >= 0"));
        }
        if !non_negative(damping) {
            return Err(SimError::InvalidConnector("damping must be finite and >= 0"));
        }
        Ok(Self {
            first,
            second,
            natural_length,
            stiffness,
            damping,
            can_go_slack: false,
            truncation: None,
        })
    }

    pub fn with_slack(mut self, can_go_slack: bool) -> Self {
        self.can_go_slack = can_go_slack;
        self
    }

    /// Cap the spring term to `[-bound, bound]`
    pub fn with_truncation(mut self, bound: f64) -> Result<Self> {
        if !(bound > 0.0 && bound.is_finite()) {
            return Err(SimError::InvalidConnector("truncation bound must be positive"));
        }
        self.truncation = Some(bound);
        Ok(self)
    }

    pub fn first(&self) -> ParticleId {
        self.first
    }

    pub fn second(&self) -> ParticleId {
        self.second
    }

    pub fn natural_length(&self) -> f64 {
        self.natural_length
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn can_go_slack(&self) -> bool {
        self.can_go_slack
    }

    pub fn truncation(&self) -> Option<f64> {
        self.truncation
    }

    fn endpoints<'a>(&self, particles: &'a [Particle]) -> Result<(&'a Particle, &'a Particle)> {
        let lookup = |id: ParticleId| {
            particles.get(id.0).ok_or(SimError::UnknownParticle {
                id,
                count: particles.len(),
            })
        };
        Ok((lookup(self.first)?, lookup(self.second)?))
    }

    /// Current distance between the endpoints
    pub fn length(&self, particles: &[Particle]) -> Result<f64> {
        let (p1, p2) = self.endpoints(particles)?;
        Ok(p1.pos().dist(p2.pos()))
    }

    /// Unit vector from the first endpoint to the second, if they are apart
    fn axis(p1: &Particle, p2: &Particle) -> Option<Vector2D> {
        (p2.pos() - p1.pos()).checked_normalize().ok()
    }

    /// Rate at which the connector is lengthening (negative while closing)
    pub fn extension_rate(&self, particles: &[Particle]) -> Result<f64> {
        let (p1, p2) = self.endpoints(particles)?;
        Ok(Self::rate_between(p1, p2))
    }

    fn rate_between(p1: &Particle, p2: &Particle) -> f64 {
        match Self::axis(p1, p2) {
            Some(axis) => (p2.vel() - p1.vel()).dot(axis),
            None => 0.0,
        }
    }

    /// Signed tension; positive pulls the endpoints together
    pub fn tension(&self, particles: &[Particle]) -> Result<f64> {
        let (p1, p2) = self.endpoints(particles)?;
        Ok(self.tension_between(p1, p2))
    }

    fn tension_between(&self, p1: &Particle, p2: &Particle) -> f64 {
        let length = p1.pos().dist(p2.pos());
        if self.can_go_slack && length < self.natural_length {
            return 0.0;
        }

        let mut hooke = self.stiffness * (length - self.natural_length);
        if let Some(bound) = self.truncation {
            hooke = hooke.clamp(-bound, bound);
        }
        hooke + self.damping * Self::rate_between(p1, p2)
    }

    /// Add equal and opposite tension forces to both endpoints.
    ///
    /// Returns the tension applied, or `None` when the endpoints coincide and
    /// the connector has no direction to pull along.
    pub(crate) fn apply_tension(&self, particles: &mut [Particle]) -> Result<Option<f64>> {
        let (p1, p2) = self.endpoints(particles)?;
        let Some(axis) = Self::axis(p1, p2) else {
            return Ok(None);
        };
        let tension = self.tension_between(p1, p2);

        let mut on_first = axis;
        on_first.scale_by(tension);
        particles[self.first.0].apply_force(on_first);
        particles[self.second.0].apply_force(-on_first);
        Ok(Some(tension))
    }
}
