//! Dynamic point masses and their explicit integrators

use serde::{Deserialize, Serialize};

use super::vector::{Vector2D, Vector2DExt};
use crate::error::{Result, SimError};

/// Explicit integration scheme used by a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    /// Explicit Euler: position advances with the pre-update velocity
    Basic,
    /// Heun-style improved Euler (averages predictor and corrector)
    #[default]
    Improved,
}

/// A point mass with a circular collision radius
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ParticleState")]
pub struct Particle {
    pos: Vector2D,
    vel: Vector2D,
    /// Force accumulated during the current step (reset every step)
    force: Vector2D,
    radius: f64,
    mass: f64,
    /// Rolling friction coefficient (0 disables it)
    rolling_friction: f64,
    integrator: Integrator,
    /// Opaque tag for the renderer (colour, sprite id...)
    tag: u32,
}

/// Stored form of a [`Particle`]; loading re-runs construction checks
#[derive(Deserialize)]
struct ParticleState {
    pos: Vector2D,
    vel: Vector2D,
    force: Vector2D,
    radius: f64,
    mass: f64,
    rolling_friction: f64,
    integrator: Integrator,
    tag: u32,
}

impl TryFrom<ParticleState> for Particle {
    type Error = SimError;

    fn try_from(state: ParticleState) -> Result<Self> {
        if !(state.pos.is_finite() && state.vel.is_finite() && state.force.is_finite()) {
            return Err(SimError::Config(
                "particle position, velocity and force must be finite".to_string(),
            ));
        }
        let mut particle = Particle::new(state.pos, state.vel, state.radius, state.mass)?
            .with_integrator(state.integrator)
            .with_rolling_friction(state.rolling_friction)?
            .with_tag(state.tag);
        particle.force = state.force;
        Ok(particle)
    }
}

impl Particle {
    /// Create a particle; radius and mass must be positive and finite
    pub fn new(pos: Vector2D, vel: Vector2D, radius: f64, mass: f64) -> Result<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(SimError::InvalidRadius(radius));
        }
        if !(mass > 0.0 && mass.is_finite()) {
            return Err(SimError::InvalidMass(mass));
        }
        Ok(Self {
            pos,
            vel,
            force: Vector2D::ZERO,
            radius,
            mass,
            rolling_friction: 0.0,
            integrator: Integrator::default(),
            tag: 0,
        })
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Set the rolling friction coefficient (finite, >= 0)
    pub fn with_rolling_friction(mut self, coefficient: f64) -> Result<Self> {
        if !(coefficient >= 0.0 && coefficient.is_finite()) {
            return Err(SimError::InvalidFriction(coefficient));
        }
        self.rolling_friction = coefficient;
        Ok(self)
    }

    pub fn with_tag(mut self, tag: u32) -> Self {
        self.tag = tag;
        self
    }

    #[inline]
    pub fn pos(&self) -> Vector2D {
        self.pos
    }

    #[inline]
    pub fn vel(&self) -> Vector2D {
        self.vel
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn rolling_friction(&self) -> f64 {
        self.rolling_friction
    }

    #[inline]
    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    #[inline]
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Net force accumulated so far this step
    #[inline]
    pub fn total_force(&self) -> Vector2D {
        self.force
    }

    /// Kinetic energy: 0.5 * m * |v|²
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.vel.length_squared()
    }

    /// Linear momentum: m * v
    pub fn momentum(&self) -> Vector2D {
        self.vel * self.mass
    }

    pub(crate) fn set_vel(&mut self, vel: Vector2D) {
        self.vel = vel;
    }

    /// Add a force into this step's accumulator
    pub fn apply_force(&mut self, force: Vector2D) {
        self.force += force;
    }

    /// Zero the accumulator at the start of a step
    pub fn reset_force(&mut self) {
        self.force = Vector2D::ZERO;
    }

    fn apply_weight(&mut self, gravity: f64) {
        self.apply_force(Vector2D::new(0.0, -gravity * self.mass));
    }

    fn apply_rolling_friction(&mut self) {
        let mut friction = self.vel;
        friction.scale_by(-self.rolling_friction * self.mass);
        self.apply_force(friction);
    }

    /// Add weight and rolling friction, then advance one sub-step of `dt`.
    ///
    /// Both schemes treat the accumulated force as constant across the
    /// sub-step. The improved scheme reuses the start-of-step acceleration
    /// for its corrector instead of evaluating forces at the predicted state,
    /// so it is only exact for constant forces.
    pub fn integrate(&mut self, dt: f64, gravity: f64) {
        self.apply_weight(gravity);
        if self.rolling_friction != 0.0 {
            self.apply_rolling_friction();
        }

        let mut acc = Vector2D::ZERO;
        acc.add_scaled(self.force, 1.0 / self.mass);

        match self.integrator {
            Integrator::Basic => {
                self.pos.add_scaled(self.vel, dt);
                self.vel.add_scaled(acc, dt);
            }
            Integrator::Improved => {
                let mut vel2 = self.vel;
                vel2.add_scaled(acc, dt);
                let acc2 = acc;

                vel2 += self.vel;
                vel2.scale_by(0.5);
                let mut avg_acc = acc2 + acc;
                avg_acc.scale_by(0.5);

                self.pos.add_scaled(vel2, dt);
                self.vel.add_scaled(avg_acc, dt);
            }
        }
    }
}
