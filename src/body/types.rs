// body/types.rs
// Body struct: point-mass state plus the symplectic Euler update

use crate::error::SimError;
use crate::vector::{Vector2, VectorExt};

/// A point mass. Identity is its index in the owning simulation's body list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub pos: Vector2,
    pub vel: Vector2,
    pub acc: Vector2,
    pub mass: f64,
    pub radius: f64,
}

impl Body {
    /// Create a body, rejecting non-positive mass, negative radius and
    /// non-finite vectors. Everything past this point assumes `mass > 0`.
    pub fn new(pos: Vector2, vel: Vector2, mass: f64, radius: f64) -> Result<Self, SimError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimError::InvalidMass(mass));
        }
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(SimError::InvalidRadius(radius));
        }
        if !pos.is_finite() {
            return Err(SimError::NonFinite("position"));
        }
        if !vel.is_finite() {
            return Err(SimError::NonFinite("velocity"));
        }
        Ok(Self {
            pos,
            vel,
            acc: Vector2::zero(),
            mass,
            radius,
        })
    }

    /// Create a body whose radius follows from its mass (`mass^(1/3)`), the
    /// rule used for user-spawned bodies.
    pub fn with_mass(pos: Vector2, vel: Vector2, mass: f64) -> Result<Self, SimError> {
        Self::new(pos, vel, mass, mass.cbrt())
    }

    /// Semi-implicit Euler: velocity first from the current acceleration,
    /// then position from the new velocity.
    pub fn update(&mut self, dt: f64) {
        self.vel += self.acc * dt;
        self.pos += self.vel * dt;
    }

    pub fn reset_acceleration(&mut self) {
        self.acc = Vector2::zero();
    }

    /// Accumulate `force / mass` into the pending acceleration.
    pub fn apply_force(&mut self, force: Vector2) {
        self.acc += force / self.mass;
    }

    pub fn momentum(&self) -> Vector2 {
        self.vel * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.vel.mag_sq()
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.acc.is_finite()
    }
}
