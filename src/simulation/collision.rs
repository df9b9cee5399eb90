// simulation/collision.rs
// Contact detection (brute force or spatial hash) and impulse resolution

use crate::body::Body;
use crate::config::CollisionConfig;
use crate::profile_scope;
use crate::simulation::Simulation;
use crate::spatial_hash::{overlapping, SpatialHash};
use crate::vector::Vector2;

/// Broad-phase strategy used to find candidate pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadPhase {
    BruteForce,
    SpatialHash,
}

impl BroadPhase {
    /// All-pairs for small sets, hashing once `n` exceeds the threshold.
    pub fn for_count(n: usize, threshold: usize) -> Self {
        if n > threshold {
            BroadPhase::SpatialHash
        } else {
            BroadPhase::BruteForce
        }
    }
}

pub fn collide(sim: &mut Simulation) {
    profile_scope!("collision");
    if !sim.config.collisions.enabled {
        sim.last_collisions = 0;
        return;
    }
    let phase = BroadPhase::for_count(sim.bodies.len(), sim.config.collisions.spatial_hash_threshold);
    let resolved = resolve_all(&mut sim.bodies, &mut sim.spatial_hash, phase, &sim.config.collisions);
    sim.last_collisions = resolved.len();
}

/// Overlapping pairs `(i, j)` with `i < j`, sorted, found with `phase`.
pub fn find_colliding_pairs(
    bodies: &[Body],
    hash: &mut SpatialHash,
    phase: BroadPhase,
    grid_size: f64,
) -> Vec<(usize, usize)> {
    match phase {
        BroadPhase::BruteForce => {
            let mut pairs = Vec::new();
            for i in 0..bodies.len() {
                for j in i + 1..bodies.len() {
                    if overlapping(&bodies[i], &bodies[j]) {
                        pairs.push((i, j));
                    }
                }
            }
            pairs
        }
        BroadPhase::SpatialHash => {
            // cells must be at least one diameter wide for the 3x3 search to see every contact
            let max_radius = bodies.iter().map(|b| b.radius).fold(0.0, f64::max);
            hash.set_cell_size(grid_size.max(2.0 * max_radius));
            hash.rebuild(bodies);
            hash.overlapping_pairs(bodies)
        }
    }
}

/// Rounds in which conflicting corrections are halved before the bodies
/// involved are frozen instead.
const HALVING_ROUNDS: usize = 4;

/// Find and resolve every contact once, in pair order. Returns the pairs that
/// actually received an impulse.
///
/// Impulses are applied as each pair is visited. Positional corrections are
/// all computed from the positions at the start of the pass and applied
/// together afterwards, so no contact ends the pass deeper than it began.
pub fn resolve_all(
    bodies: &mut [Body],
    hash: &mut SpatialHash,
    phase: BroadPhase,
    config: &CollisionConfig,
) -> Vec<(usize, usize)> {
    let pairs = find_colliding_pairs(bodies, hash, phase, config.grid_size);
    let mut shift = vec![Vector2::zero(); bodies.len()];
    let mut resolved = Vec::new();
    for &(i, j) in &pairs {
        if let Some((shift_i, shift_j)) =
            resolve(bodies, i, j, config.restitution, config.correction_percent)
        {
            shift[i] += shift_i;
            shift[j] += shift_j;
            resolved.push((i, j));
        }
    }
    apply_corrections(bodies, &pairs, &shift);
    resolved
}

/// Move every body by its accumulated shift, scaled per body so that no
/// pair in `pairs` overlaps more than it does now.
///
/// Both bodies of a conflicting pair get their scale halved for the first few
/// rounds, then set to zero. Each freezing round stops at least one more body
/// and a pair of frozen bodies cannot conflict, so the loop terminates.
fn apply_corrections(bodies: &mut [Body], pairs: &[(usize, usize)], shift: &[Vector2]) {
    fn moved(bodies: &[Body], shift: &[Vector2], scale: &[f64], k: usize) -> Vector2 {
        bodies[k].pos + shift[k] * scale[k]
    }

    let mut scale = vec![1.0; bodies.len()];
    let mut round = 0;
    loop {
        let factor = if round < HALVING_ROUNDS { 0.5 } else { 0.0 };
        let mut conflict = false;
        for &(i, j) in pairs {
            let before = (bodies[j].pos - bodies[i].pos).mag();
            let after = (moved(bodies, shift, &scale, j) - moved(bodies, shift, &scale, i)).mag();
            if after < before {
                scale[i] *= factor;
                scale[j] *= factor;
                conflict = true;
            }
        }
        if !conflict {
            break;
        }
        round += 1;
    }

    let positions: Vec<Vector2> = (0..bodies.len())
        .map(|k| moved(bodies, shift, &scale, k))
        .collect();
    for (body, pos) in bodies.iter_mut().zip(positions) {
        body.pos = pos;
    }
}

/// Apply the impulse for one contact between `bodies[i]` and `bodies[j]` and
/// return the positional shifts it asks for, or `None` when the pair does
/// not overlap, is already separating, or has coincident centres.
pub fn resolve(
    bodies: &mut [Body],
    i: usize,
    j: usize,
    restitution: f64,
    percent: f64,
) -> Option<(Vector2, Vector2)> {
    let a = bodies[i];
    let b = bodies[j];
    let delta = b.pos - a.pos;
    let dist = delta.mag();
    let r = a.radius + b.radius;
    if dist >= r || dist <= f64::EPSILON {
        return None;
    }

    let n = delta / dist;
    let van = (b.vel - a.vel).dot(n);
    if van >= 0.0 {
        return None;
    }

    let inv_a = 1.0 / a.mass;
    let inv_b = 1.0 / b.mass;
    let inv_sum = inv_a + inv_b;

    let impulse = -(1.0 + restitution) * van / inv_sum;
    bodies[i].vel -= n * (impulse * inv_a);
    bodies[j].vel += n * (impulse * inv_b);

    let correction = percent * (r - dist) / inv_sum;
    Some((-n * (correction * inv_a), n * (correction * inv_b)))
}
