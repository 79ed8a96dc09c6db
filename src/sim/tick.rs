//! Fixed timestep simulation tick
//!
//! One sub-step always runs the same phases in the same order:
//! 1. reset force accumulators (then re-add persistent external forces)
//! 2. connector tension into both endpoints
//! 3. integrate every particle (weight, rolling friction, chosen scheme)
//! 4. barrier responses, particle-major then barrier order
//! 5. particle-particle impulses for each colliding pair
//!
//! Barrier tests run on the positions produced by phase 3, so a wall reacts
//! one sub-step after the particle first overlaps it. The response only
//! redirects velocity; positions are never pushed back out of a wall.

use super::barrier::Collider;
use super::collision::{particles_colliding, resolve_elastic_collision};
use super::state::{BarrierId, ParticleId, Simulation, StepEvent, pair_mut};

impl Simulation {
    /// Advance the simulation by exactly one fixed sub-step
    pub fn step(&mut self) -> Vec<StepEvent> {
        let mut events = Vec::new();

        self.reset_forces();
        self.apply_connectors();
        self.integrate();
        self.resolve_barrier_collisions(&mut events);
        self.resolve_particle_collisions(&mut events);

        self.time_ticks += 1;
        events
    }

    /// Run the configured number of sub-steps for one rendered frame
    pub fn run_frame(&mut self) -> Vec<StepEvent> {
        let mut events = Vec::new();
        for _ in 0..self.config.sub_steps {
            events.extend(self.step());
        }
        events
    }

    fn reset_forces(&mut self) {
        for (particle, external) in self.particles.iter_mut().zip(&self.external_forces) {
            particle.reset_force();
            particle.apply_force(*external);
        }
    }

    fn apply_connectors(&mut self) {
        for (index, connector) in self.connectors.iter().enumerate() {
            match connector.apply_tension(&mut self.particles) {
                Ok(Some(_)) => {}
                Ok(None) => log::warn!(
                    "connector {} endpoints coincide at tick {}; no tension applied",
                    index,
                    self.time_ticks
                ),
                // Endpoints are checked on insertion and on snapshot load
                Err(err) => log::error!("connector {} skipped: {}", index, err),
            }
        }
    }

    fn integrate(&mut self) {
        let dt = self.config.dt;
        let gravity = self.config.gravity;
        for particle in &mut self.particles {
            particle.integrate(dt, gravity);
        }
    }

    fn resolve_barrier_collisions(&mut self, events: &mut Vec<StepEvent>) {
        for (pi, particle) in self.particles.iter_mut().enumerate() {
            for (bi, barrier) in self.barriers.iter().enumerate() {
                if barrier.is_circle_colliding(particle.pos(), particle.radius()) {
                    let bounced = barrier.velocity_after_collision(particle.pos(), particle.vel());
                    particle.set_vel(bounced);
                    log::trace!("tick {}: particle {} hit barrier {}", self.time_ticks, pi, bi);
                    events.push(StepEvent::BarrierContact {
                        particle: ParticleId(pi),
                        barrier: BarrierId(bi),
                    });
                }
            }
        }
    }

    fn resolve_particle_collisions(&mut self, events: &mut Vec<StepEvent>) {
        let restitution = self.config.restitution;
        let count = self.particles.len();
        for j in 0..count {
            for i in 0..j {
                let Some((first, second)) = pair_mut(&mut self.particles, i, j) else {
                    continue;
                };
                if !particles_colliding(first, second) {
                    continue;
                }
                match resolve_elastic_collision(first, second, restitution) {
                    Ok(impulse) => {
                        log::trace!(
                            "tick {}: particles {} and {} collided (impulse {:.4})",
                            self.time_ticks,
                            i,
                            j,
                            impulse
                        );
                        events.push(StepEvent::ParticleCollision {
                            first: ParticleId(i),
                            second: ParticleId(j),
                        });
                    }
                    Err(err) => {
                        log::error!(
                            "tick {}: pair ({}, {}) not resolved: {}",
                            self.time_ticks,
                            i,
                            j,
                            err
                        );
                        debug_assert!(false, "colliding pair failed to resolve: {}", err);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::sim::{Barrier, Connector, Integrator, Particle, Vector2D};

    fn config(dt: f64) -> SimConfig {
        SimConfig::default().with_dt(dt).with_gravity(9.8)
    }

    fn ball(x: f64, y: f64, integrator: Integrator) -> Particle {
        Particle::new(Vector2D::new(x, y), Vector2D::ZERO, 0.1, 1.0)
            .unwrap()
            .with_integrator(integrator)
    }

    #[test]
    fn test_improved_euler_free_fall_two_steps() {
        let mut sim = Simulation::new(config(0.01)).unwrap();
        let p = sim.add_particle(ball(0.0, 10.0, Integrator::Improved));
        sim.step();
        sim.step();
        assert!((sim.velocity(p).unwrap().y + 0.196).abs() < 1e-9);
        assert_eq!(sim.time_ticks(), 2);
        assert!((sim.elapsed() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_falling_particle_bounces_on_first_crossing() {
        let mut sim = Simulation::new(config(0.01)).unwrap();
        let p = sim.add_particle(ball(5.0, 0.5, Integrator::Basic));
        let floor = sim.add_barrier(
            Barrier::segment(Vector2D::new(0.0, 0.0), Vector2D::new(10.0, 0.0), None).unwrap(),
        );

        let mut bounced = false;
        for _ in 0..200 {
            let above = sim.position(p).unwrap().y > 0.1;
            let events = sim.step();
            let pos = sim.position(p).unwrap();
            let vel = sim.velocity(p).unwrap();
            if above && pos.y <= 0.1 {
                // First step at or inside the threshold: bounce now
                assert!(vel.y > 0.0);
                assert!(events.contains(&StepEvent::BarrierContact {
                    particle: p,
                    barrier: floor
                }));
                bounced = true;
                break;
            }
            assert!(vel.y <= 0.0);
            assert!(events.is_empty());
        }
        assert!(bounced);
    }

    #[test]
    fn test_finite_depth_floor_is_never_overshot() {
        let depth = 0.05;
        let mut sim = Simulation::new(config(0.001)).unwrap();
        let p = sim.add_particle(ball(5.0, 1.0, Integrator::Basic));
        sim.add_barrier(
            Barrier::segment(Vector2D::new(0.0, 0.0), Vector2D::new(10.0, 0.0), Some(depth))
                .unwrap(),
        );
        let mut lowest = f64::MAX;
        for _ in 0..3000 {
            sim.step();
            lowest = lowest.min(sim.position(p).unwrap().y);
        }
        assert!(lowest > -depth);
    }

    #[test]
    fn test_last_barrier_response_wins() {
        let mut sim = Simulation::new(config(0.001).with_gravity(0.0)).unwrap();
        let p = sim.add_particle(
            Particle::new(Vector2D::new(0.05, 0.05), Vector2D::new(-1.0, -1.0), 0.1, 1.0)
                .unwrap()
                .with_integrator(Integrator::Basic),
        );
        // Floor then left wall, both touching the particle in the corner
        sim.add_barrier(Barrier::segment(Vector2D::new(-1.0, 0.0), Vector2D::new(1.0, 0.0), None).unwrap());
        sim.add_barrier(Barrier::segment(Vector2D::new(0.0, 1.0), Vector2D::new(0.0, -1.0), None).unwrap());
        let events = sim.step();
        assert_eq!(events.len(), 2);
        let vel = sim.velocity(p).unwrap();
        assert!((vel - Vector2D::new(1.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn test_head_on_particles_exchange_velocity() {
        let mut sim = Simulation::new(
            SimConfig::default()
                .with_dt(0.001)
                .with_gravity(0.0)
                .with_restitution(1.0),
        )
        .unwrap();
        let a = sim.add_particle(
            Particle::new(Vector2D::new(0.0, 0.0), Vector2D::new(1.0, 0.0), 0.1, 1.0).unwrap(),
        );
        let b = sim.add_particle(
            Particle::new(Vector2D::new(0.19, 0.0), Vector2D::new(-1.0, 0.0), 0.1, 1.0).unwrap(),
        );
        let events = sim.step();
        assert_eq!(
            events,
            vec![StepEvent::ParticleCollision { first: a, second: b }]
        );
        assert!((sim.velocity(a).unwrap().x + 1.0).abs() < 1e-12);
        assert!((sim.velocity(b).unwrap().x - 1.0).abs() < 1e-12);

        // Separating now: no repeat resolution
        assert!(sim.step().is_empty());
    }

    #[test]
    fn test_connector_inserted_between_steps_takes_effect() {
        let mut sim = Simulation::new(config(0.001).with_gravity(0.0)).unwrap();
        let a = sim.add_particle(ball(0.0, 0.0, Integrator::Basic));
        let b = sim.add_particle(ball(2.0, 0.0, Integrator::Basic));
        sim.step();
        assert_eq!(sim.velocity(a).unwrap(), Vector2D::ZERO);

        sim.add_connector(Connector::new(a, b, 1.0, 100.0, 0.0).unwrap())
            .unwrap();
        sim.step();
        assert!(sim.velocity(a).unwrap().x > 0.0);
        assert!(sim.velocity(b).unwrap().x < 0.0);
    }

    #[test]
    fn test_external_force_cancels_gravity() {
        let mut sim = Simulation::new(config(0.01)).unwrap();
        let p = sim.add_particle(ball(0.0, 5.0, Integrator::Improved));
        sim.set_external_force(p, Vector2D::new(0.0, 9.8)).unwrap();
        for _ in 0..10 {
            sim.step();
        }
        assert!(sim.velocity(p).unwrap().length() < 1e-12);
    }

    #[test]
    fn test_run_frame_uses_configured_sub_steps() {
        let mut sim = Simulation::new(config(0.001).with_sub_steps(7)).unwrap();
        sim.add_particle(ball(0.0, 0.0, Integrator::Basic));
        sim.run_frame();
        assert_eq!(sim.time_ticks(), 7);
    }

    #[test]
    fn test_determinism() {
        let build = || {
            let mut sim = Simulation::new(config(0.0005)).unwrap();
            let a = sim.add_particle(ball(1.0, 3.0, Integrator::Improved));
            let b = sim.add_particle(
                Particle::new(Vector2D::new(1.5, 2.0), Vector2D::new(-0.5, 1.0), 0.15, 2.0)
                    .unwrap()
                    .with_rolling_friction(0.3)
                    .unwrap(),
            );
            sim.add_connector(Connector::new(a, b, 0.8, 50.0, 2.0).unwrap())
                .unwrap();
            for wall in Barrier::polyline(
                &[
                    Vector2D::new(0.0, 0.0),
                    Vector2D::new(4.0, 0.0),
                    Vector2D::new(4.0, 4.0),
                    Vector2D::new(0.0, 4.0),
                    Vector2D::new(0.0, 0.0),
                ],
                None,
            )
            .unwrap()
            {
                sim.add_barrier(wall);
            }
            sim
        };

        let mut sim1 = build();
        let mut sim2 = build();
        for _ in 0..2000 {
            let e1 = sim1.step();
            let e2 = sim2.step();
            assert_eq!(e1, e2);
        }
        for (p1, p2) in sim1.particles().iter().zip(sim2.particles()) {
            assert_eq!(p1.pos(), p2.pos());
            assert_eq!(p1.vel(), p2.vel());
        }
    }
}
