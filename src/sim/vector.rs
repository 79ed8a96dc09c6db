//! 2D vector type used by every geometric and dynamic calculation
//!
//! `Vector2D` is glam's double-precision vector. The extension trait adds the
//! in-place operations the integrators and collision responses are written
//! against, so call sites read as accumulate/scale/rotate on a mutable value.

use glam::DVec2;

use crate::error::{Result, SimError};

/// Mutable (x, y) pair of doubles
pub type Vector2D = DVec2;

/// In-place vector operations on [`Vector2D`]
pub trait Vector2DExt: Sized {
    /// `self += v * fac`
    fn add_scaled(&mut self, v: Vector2D, fac: f64);

    /// `self *= fac`
    fn scale_by(&mut self, fac: f64);

    /// Rotate anticlockwise by `angle` radians
    fn rotate_by(&mut self, angle: f64);

    /// Copy rotated a quarter turn anticlockwise: (x, y) -> (-y, x)
    fn rotate90_anticlockwise(self) -> Self;

    /// Normalize in place. A zero vector becomes NaN; use
    /// [`checked_normalize`](Vector2DExt::checked_normalize) when the
    /// magnitude is not known to be nonzero.
    fn normalize_in_place(&mut self);

    /// Unit vector with the same direction, or an error for a zero vector
    fn checked_normalize(self) -> Result<Self>;

    /// Euclidean distance to `other`
    fn dist(self, other: Self) -> f64;
}

impl Vector2DExt for Vector2D {
    #[inline]
    fn add_scaled(&mut self, v: Vector2D, fac: f64) {
        self.x += v.x * fac;
        self.y += v.y * fac;
    }

    #[inline]
    fn scale_by(&mut self, fac: f64) {
        self.x *= fac;
        self.y *= fac;
    }

    fn rotate_by(&mut self, angle: f64) {
        let (s, c) = angle.sin_cos();
        let (x, y) = (self.x, self.y);
        self.x = x * c - y * s;
        self.y = x * s + y * c;
    }

    #[inline]
    fn rotate90_anticlockwise(self) -> Self {
        self.perp()
    }

    #[inline]
    fn normalize_in_place(&mut self) {
        let len = self.length();
        self.x /= len;
        self.y /= len;
    }

    fn checked_normalize(self) -> Result<Self> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return Err(SimError::DegenerateVector);
        }
        Ok(self / len)
    }

    #[inline]
    fn dist(self, other: Self) -> f64 {
        (self - other).length()
    }
}
