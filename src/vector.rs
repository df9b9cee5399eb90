//! Two-dimensional `f64` vector used throughout the simulation.
//!
//! `Vector2` is `ultraviolet::DVec2`: a `Copy` value type whose arithmetic
//! operators return new values, with `+=`/`-=`/`*=` available for hot loops.
//! The extension trait adds the few helpers the physics code needs on top.

pub use ultraviolet::DVec2 as Vector2;

pub trait VectorExt {
    /// Both components are finite (no NaN or infinity).
    fn is_finite(&self) -> bool;

    /// Unit vector in the same direction, or zero for a zero-length vector.
    fn normalized_or_zero(&self) -> Self;
}

impl VectorExt for Vector2 {
    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn normalized_or_zero(&self) -> Self {
        let mag = self.mag();
        if mag > 0.0 {
            *self / mag
        } else {
            Vector2::zero()
        }
    }
}
