//! Collision detection and response between particles and against rigid surfaces
//!
//! Particle pairs exchange an impulse along the line of centres; static
//! barriers flip the inward normal component of a velocity. Neither model
//! couples tangential motion (no friction, no spin).

use super::particle::Particle;
use super::vector::{Vector2D, Vector2DExt};
use crate::error::{Result, SimError};

/// True when two circles overlap and are approaching each other.
///
/// The closing-velocity gate stops a pair that is already separating from
/// being resolved again on the next sub-step.
pub fn particles_colliding(first: &Particle, second: &Particle) -> bool {
    let from_first = second.pos() - first.pos();
    let closing = (second.vel() - first.vel()).dot(from_first) < 0.0;
    from_first.length() < first.radius() + second.radius() && closing
}

/// Exchange an impulse between two colliding particles.
///
/// `restitution` is the ratio of post- to pre-collision relative normal speed.
/// Returns the impulse magnitude applied along the line of centres. Calling
/// this on a pair that is not colliding is an error, never a silent no-op.
pub fn resolve_elastic_collision(
    first: &mut Particle,
    second: &mut Particle,
    restitution: f64,
) -> Result<f64> {
    if !particles_colliding(first, second) {
        return Err(SimError::NotColliding { pair: None });
    }

    // Overlapping and closing implies distinct centres
    let normal = (second.pos() - first.pos()).checked_normalize()?;
    let v1n = first.vel().dot(normal);
    let v2n = second.vel().dot(normal);
    let approach_speed = v2n - v1n;

    let (m1, m2) = (first.mass(), second.mass());
    let j = m1 * m2 * (1.0 + restitution) * -approach_speed / (m1 + m2);

    let mut v1 = first.vel();
    v1.add_scaled(normal, -j / m1);
    first.set_vel(v1);

    let mut v2 = second.vel();
    v2.add_scaled(normal, j / m2);
    second.set_vel(v2);

    Ok(j)
}

/// Velocity after bouncing off an immovable, frictionless surface.
///
/// `tangent` and `normal` must be an orthonormal pair with `normal` pointing
/// to the permitted side. The tangential component is kept; the normal
/// component keeps its magnitude but is forced to point away from the wall.
pub fn bounce_off_surface(vel: Vector2D, tangent: Vector2D, normal: Vector2D) -> Vector2D {
    let v_parallel = vel.dot(tangent);
    let v_normal = vel.dot(normal).abs();
    let mut result = tangent;
    result.scale_by(v_parallel);
    result.add_scaled(normal, v_normal);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ball(x: f64, y: f64, vx: f64, vy: f64, mass: f64) -> Particle {
        Particle::new(Vector2D::new(x, y), Vector2D::new(vx, vy), 0.5, mass).unwrap()
    }

    fn relative_normal_speed(a: &Particle, b: &Particle) -> f64 {
        let n = (b.pos() - a.pos()).normalize();
        (b.vel() - a.vel()).dot(n)
    }

    #[test]
    fn test_colliding_requires_overlap_and_closing() {
        let a = ball(0.0, 0.0, 1.0, 0.0, 1.0);
        let b = ball(0.8, 0.0, -1.0, 0.0, 1.0);
        assert!(particles_colliding(&a, &b));

        // Overlapping but separating
        let c = ball(0.8, 0.0, 2.0, 0.0, 1.0);
        assert!(!particles_colliding(&a, &c));

        // Closing but apart
        let d = ball(3.0, 0.0, -1.0, 0.0, 1.0);
        assert!(!particles_colliding(&a, &d));
    }

    #[test]
    fn test_perfectly_elastic_equal_masses_swap() {
        let mut a = ball(0.0, 0.0, 1.0, 0.0, 1.0);
        let mut b = ball(0.9, 0.0, -1.0, 0.0, 1.0);
        resolve_elastic_collision(&mut a, &mut b, 1.0).unwrap();
        assert!((a.vel().x + 1.0).abs() < 1e-12);
        assert!((b.vel().x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inelastic_kills_relative_normal_speed() {
        let mut a = ball(0.0, 0.0, 2.0, 0.5, 1.0);
        let mut b = ball(0.6, 0.6, -1.0, -0.3, 3.0);
        resolve_elastic_collision(&mut a, &mut b, 0.0).unwrap();
        assert!(relative_normal_speed(&a, &b).abs() < 1e-12);
    }

    #[test]
    fn test_tangential_components_unchanged() {
        let mut a = ball(0.0, 0.0, 1.0, 3.0, 1.0);
        let mut b = ball(0.9, 0.0, -1.0, -2.0, 2.0);
        resolve_elastic_collision(&mut a, &mut b, 0.9).unwrap();
        assert!((a.vel().y - 3.0).abs() < 1e-12);
        assert!((b.vel().y + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_colliding_pair() {
        let mut a = ball(0.0, 0.0, 0.0, 0.0, 1.0);
        let mut b = ball(5.0, 0.0, 0.0, 0.0, 1.0);
        let before = (a.vel(), b.vel());
        assert_eq!(
            resolve_elastic_collision(&mut a, &mut b, 1.0),
            Err(SimError::NotColliding { pair: None })
        );
        assert_eq!((a.vel(), b.vel()), before);
    }

    #[test]
    fn test_bounce_flips_inward_normal_only() {
        let t = Vector2D::X;
        let n = Vector2D::Y;
        let out = bounce_off_surface(Vector2D::new(2.0, -3.0), t, n);
        assert_eq!(out, Vector2D::new(2.0, 3.0));
        // Already leaving: unchanged
        let out = bounce_off_surface(Vector2D::new(2.0, 3.0), t, n);
        assert_eq!(out, Vector2D::new(2.0, 3.0));
    }

    proptest! {
        #[test]
        fn prop_restitution_scales_relative_normal_speed(
            vx1 in -10.0f64..10.0, vy1 in -10.0f64..10.0,
            vx2 in -10.0f64..10.0, vy2 in -10.0f64..10.0,
            angle in 0.0f64..std::f64::consts::TAU,
            m1 in 0.1f64..10.0, m2 in 0.1f64..10.0,
            e in 0.0f64..=1.0,
        ) {
            let offset = Vector2D::new(angle.cos(), angle.sin()) * 0.8;
            let mut a = ball(0.0, 0.0, vx1, vy1, m1);
            let mut b = ball(offset.x, offset.y, vx2, vy2, m2);
            prop_assume!(particles_colliding(&a, &b));

            let before = relative_normal_speed(&a, &b);
            let momentum_before = a.momentum() + b.momentum();
            resolve_elastic_collision(&mut a, &mut b, e).unwrap();
            let after = relative_normal_speed(&a, &b);
            let momentum_after = a.momentum() + b.momentum();

            prop_assert!((after + e * before).abs() < 1e-9);
            prop_assert!((momentum_after - momentum_before).length() < 1e-9);
        }

        #[test]
        fn prop_bounce_preserves_speed(
            vx in -50.0f64..50.0, vy in -50.0f64..50.0,
            angle in 0.0f64..std::f64::consts::TAU,
        ) {
            let t = Vector2D::new(angle.cos(), angle.sin());
            let n = t.rotate90_anticlockwise();
            let v = Vector2D::new(vx, vy);
            let out = bounce_off_surface(v, t, n);
            prop_assert!((out.length() - v.length()).abs() < 1e-9);
            prop_assert!(out.dot(n) >= -1e-12);
            prop_assert!((out.dot(t) - v.dot(t)).abs() < 1e-9);
        }
    }
}
