use crate::body::Body;
use crate::config::DiscConfig;
use crate::vector::Vector2;
use rand::Rng;

/// Seed a rotating disc galaxy of `n` bodies.
///
/// Body 0 of the generated set is a heavy central mass at rest at the origin.
/// The rest are scattered over an annulus with a density biased toward the
/// inner edge, then given circular-orbit speeds from the mass enclosed
/// within their radius so the disc starts close to centrifugal balance.
/// The output only depends on the state of `rng`.
pub fn uniform_disc<R: Rng + ?Sized>(disc: &DiscConfig, n: usize, g: f64, rng: &mut R) -> Vec<Body> {
    let mut bodies: Vec<Body> = Vec::with_capacity(n);
    if n == 0 {
        return bodies;
    }

    let inner_radius = disc.inner_radius;
    let outer_radius = disc.outer_radius_for(n);

    bodies.push(Body {
        pos: Vector2::zero(),
        vel: Vector2::zero(),
        acc: Vector2::zero(),
        mass: disc.central_mass,
        radius: disc.central_radius(),
    });

    let t = if outer_radius > 0.0 { inner_radius / outer_radius } else { 0.0 };
    while bodies.len() < n {
        let a = rng.random::<f64>() * std::f64::consts::TAU;
        let (sin, cos) = a.sin_cos();
        let r = rng.random::<f64>() * (1.0 - t * t) + t * t;
        let pos = Vector2::new(cos, sin) * outer_radius * r.sqrt();
        let vel = Vector2::new(sin, -cos);
        let mass = disc.body_mass;
        let radius = mass.cbrt();

        bodies.push(Body { pos, vel, acc: Vector2::zero(), mass, radius });
    }

    bodies.sort_by(|a, b| a.pos.mag_sq().total_cmp(&b.pos.mag_sq()));
    let mut mass = 0.0;
    for body in bodies.iter_mut() {
        mass += body.mass;
        if body.pos == Vector2::zero() {
            continue;
        }

        let v = (g * mass / body.pos.mag()).sqrt();
        body.vel *= v;
    }

    bodies
}
