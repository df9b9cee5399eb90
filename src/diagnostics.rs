// diagnostics.rs
// Conserved-quantity tracking: energy, momentum and centre of mass over time.

use crate::body::Body;
use crate::simulation::Simulation;
use crate::vector::Vector2;
use rayon::prelude::*;

pub fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies.iter().map(Body::kinetic_energy).sum()
}

/// Pairwise potential `-G mA mB / sqrt(d² + ε²)`, consistent with the
/// Plummer-softened force. O(n²); meant for diagnostics, not the step loop.
pub fn potential_energy(bodies: &[Body], g: f64, epsilon: f64) -> f64 {
    let e_sq = epsilon * epsilon;
    let sum: f64 = (0..bodies.len())
        .into_par_iter()
        .map(|i| {
            let a = &bodies[i];
            bodies[i + 1..]
                .iter()
                .map(|b| {
                    let d_sq = (b.pos - a.pos).mag_sq();
                    if d_sq + e_sq <= f64::EPSILON {
                        0.0
                    } else {
                        a.mass * b.mass / (d_sq + e_sq).sqrt()
                    }
                })
                .sum::<f64>()
        })
        .sum();
    -g * sum
}

pub fn total_momentum(bodies: &[Body]) -> Vector2 {
    bodies.iter().fold(Vector2::zero(), |acc, b| acc + b.momentum())
}

/// Mass-weighted mean position; the origin for an empty set.
pub fn center_of_mass(bodies: &[Body]) -> Vector2 {
    let mass: f64 = bodies.iter().map(|b| b.mass).sum();
    if mass <= 0.0 {
        return Vector2::zero();
    }
    bodies.iter().fold(Vector2::zero(), |acc, b| acc + b.pos * b.mass) / mass
}

/// Conserved quantities at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct DiagnosticRecord {
    pub frame: usize,
    pub time: f64,
    pub kinetic: f64,
    pub potential: f64,
    pub momentum: Vector2,
    pub center_of_mass: Vector2,
}

impl DiagnosticRecord {
    pub fn measure(sim: &Simulation) -> Self {
        let bodies = sim.bodies();
        let config = sim.config();
        Self {
            frame: sim.frame(),
            time: sim.time(),
            kinetic: kinetic_energy(bodies),
            potential: potential_energy(bodies, config.gravitational_constant, config.epsilon),
            momentum: total_momentum(bodies),
            center_of_mass: center_of_mass(bodies),
        }
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic + self.potential
    }
}

/// Keeps every measurement and reports drift against the first one.
#[derive(Default)]
pub struct EnergyDiagnostics {
    pub records: Vec<DiagnosticRecord>,
}

impl EnergyDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sim: &Simulation) -> &DiagnosticRecord {
        self.records.push(DiagnosticRecord::measure(sim));
        &self.records[self.records.len() - 1]
    }

    /// `|E - E0| / |E0|` for the latest record; 0 until two records exist.
    pub fn relative_drift(&self) -> f64 {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => {
                let e0 = first.total_energy();
                if e0 == 0.0 {
                    (last.total_energy() - e0).abs()
                } else {
                    ((last.total_energy() - e0) / e0).abs()
                }
            }
            _ => 0.0,
        }
    }

    /// Largest relative drift seen over the whole history.
    pub fn max_relative_drift(&self) -> f64 {
        let Some(first) = self.records.first() else {
            return 0.0;
        };
        let e0 = first.total_energy();
        let scale = if e0 == 0.0 { 1.0 } else { e0.abs() };
        self.records
            .iter()
            .map(|r| (r.total_energy() - e0).abs() / scale)
            .fold(0.0, f64::max)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
