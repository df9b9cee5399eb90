//! Gravitational acceleration for every body.
//!
//! [`attract`] is the per-step entry point: it rebuilds the quadtree from the
//! current positions and then queries it once per body. Queries only read the
//! frozen tree, so they run on rayon's pool without any locking.
//! [`direct_acceleration_at`] is the exact O(n²) reference used when
//! Barnes-Hut is disabled and by the accuracy tests.

use crate::body::Body;
use crate::profile_scope;
use crate::simulation::Simulation;
use crate::vector::Vector2;
use rayon::prelude::*;

/// Replace every body's acceleration with the gravitational pull of all the
/// others, scaled by the configured gravitational constant.
pub fn attract(sim: &mut Simulation) {
    profile_scope!("forces_attract");
    let g = sim.config.gravitational_constant;

    if sim.config.barnes_hut {
        sim.quadtree.build(&sim.bodies);
        let quadtree = &sim.quadtree;
        sim.bodies.par_iter_mut().for_each(|body| {
            body.reset_acceleration();
            body.acc += quadtree.acceleration(body) * g;
        });
    } else {
        let e_sq = sim.config.epsilon * sim.config.epsilon;
        let accs: Vec<Vector2> = sim
            .bodies
            .par_iter()
            .map(|body| direct_acceleration_at(&sim.bodies, body.pos, e_sq) * g)
            .collect();
        for (body, acc) in sim.bodies.iter_mut().zip(accs) {
            body.acc = acc;
        }
        // keep the tree current for anyone reading the snapshot
        sim.quadtree.build(&sim.bodies);
    }
}

/// Exact Plummer-softened acceleration at `pos` from every body (G = 1).
/// Bodies sitting on `pos` contribute nothing.
pub fn direct_acceleration_at(bodies: &[Body], pos: Vector2, e_sq: f64) -> Vector2 {
    let mut acc = Vector2::zero();
    for other in bodies {
        let d = other.pos - pos;
        let d_sq = d.mag_sq();
        if d_sq <= f64::EPSILON {
            continue;
        }
        let soft = d_sq + e_sq;
        acc += d * (other.mass / (soft * soft.sqrt()));
    }
    acc
}
