// Centralized configuration for simulation parameters

use crate::error::SimError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ====================
// Quadtree Parameters
// ====================
pub const QUADTREE_THETA: f64 = 0.5; // Barnes-Hut opening angle
pub const QUADTREE_EPSILON: f64 = 1.0; // Plummer softening length

// ====================
// Simulation Parameters
// ====================
pub const DEFAULT_DT: f64 = 0.05;
pub const DEFAULT_BODY_COUNT: usize = 2000;
pub const GRAVITATIONAL_CONSTANT: f64 = 1.0;
pub const DEFAULT_SEED: u64 = 0;
/// Upper bound on physics sub-steps run for one rendered frame
pub const MAX_SUBSTEPS: usize = 5;

// ====================
// Collision Parameters
// ====================
pub const COLLISION_RESTITUTION: f64 = 0.5;
/// Fraction of the overlap removed per step
pub const COLLISION_CORRECTION_PERCENT: f64 = 0.2;
/// Body count above which the spatial hash replaces the all-pairs check
pub const SPATIAL_HASH_THRESHOLD: usize = 500;
pub const SPATIAL_HASH_CELL_SIZE: f64 = 4.0;

// ====================
// Initial Disc
// ====================
pub const DISC_INNER_RADIUS: f64 = 25.0;
pub const DISC_CENTRAL_MASS: f64 = 1e6;
pub const DISC_BODY_MASS: f64 = 1.0;
/// Outer radius defaults to this factor times sqrt(body count)
pub const DISC_OUTER_RADIUS_SCALE: f64 = 5.0;
/// Default central radius is capped at this fraction of the inner radius
pub const DISC_CENTRAL_RADIUS_FRACTION: f64 = 0.2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub enabled: bool,
    pub restitution: f64,
    pub correction_percent: f64,
    pub spatial_hash_threshold: usize,
    /// Requested spatial-hash cell size; raised to the largest body diameter
    /// when smaller.
    pub grid_size: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            restitution: COLLISION_RESTITUTION,
            correction_percent: COLLISION_CORRECTION_PERCENT,
            spatial_hash_threshold: SPATIAL_HASH_THRESHOLD,
            grid_size: SPATIAL_HASH_CELL_SIZE,
        }
    }
}

/// Shape of the generated galaxy disc.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscConfig {
    pub inner_radius: f64,
    /// Falls back to `DISC_OUTER_RADIUS_SCALE * sqrt(n)` when omitted.
    pub outer_radius: Option<f64>,
    pub central_mass: f64,
    /// Falls back to `central_mass^(1/3)`, capped at
    /// `DISC_CENTRAL_RADIUS_FRACTION * inner_radius`.
    pub central_radius: Option<f64>,
    pub body_mass: f64,
}

impl Default for DiscConfig {
    fn default() -> Self {
        Self {
            inner_radius: DISC_INNER_RADIUS,
            outer_radius: None,
            central_mass: DISC_CENTRAL_MASS,
            central_radius: None,
            body_mass: DISC_BODY_MASS,
        }
    }
}

impl DiscConfig {
    /// Outer radius for `n` bodies, never smaller than the inner radius.
    pub fn outer_radius_for(&self, n: usize) -> f64 {
        self.outer_radius
            .unwrap_or_else(|| (n as f64).sqrt() * DISC_OUTER_RADIUS_SCALE)
            .max(self.inner_radius)
    }

    /// Collision radius of the central body. The default stays well inside
    /// the inner edge so no disc body starts in contact with it.
    pub fn central_radius(&self) -> f64 {
        self.central_radius.unwrap_or_else(|| {
            self.central_mass
                .cbrt()
                .min(DISC_CENTRAL_RADIUS_FRACTION * self.inner_radius)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub body_count: usize,
    pub theta: f64,
    pub epsilon: f64,
    pub dt: f64,
    pub gravitational_constant: f64,
    /// Use the quadtree; `false` falls back to direct O(n²) summation
    pub barnes_hut: bool,
    pub seed: u64,
    pub max_substeps: usize,
    pub collisions: CollisionConfig,
    pub disc: DiscConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            body_count: DEFAULT_BODY_COUNT,
            theta: QUADTREE_THETA,
            epsilon: QUADTREE_EPSILON,
            dt: DEFAULT_DT,
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            barnes_hut: true,
            seed: DEFAULT_SEED,
            max_substeps: MAX_SUBSTEPS,
            collisions: CollisionConfig::default(),
            disc: DiscConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to load config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        fn check(ok: bool, msg: &str) -> Result<(), SimError> {
            if ok {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(msg.to_string()))
            }
        }

        check(self.theta.is_finite() && self.theta >= 0.0, "theta must be >= 0")?;
        check(self.epsilon.is_finite() && self.epsilon >= 0.0, "epsilon must be >= 0")?;
        check(self.dt.is_finite() && self.dt > 0.0, "dt must be > 0")?;
        check(
            self.gravitational_constant.is_finite() && self.gravitational_constant > 0.0,
            "gravitational_constant must be > 0",
        )?;
        check(self.max_substeps > 0, "max_substeps must be at least 1")?;

        let c = &self.collisions;
        check(
            (0.0..=1.0).contains(&c.restitution),
            "collisions.restitution must be within [0, 1]",
        )?;
        check(
            (0.0..=1.0).contains(&c.correction_percent),
            "collisions.correction_percent must be within [0, 1]",
        )?;
        check(c.grid_size.is_finite() && c.grid_size > 0.0, "collisions.grid_size must be > 0")?;

        let d = &self.disc;
        check(
            d.inner_radius.is_finite() && d.inner_radius >= 0.0,
            "disc.inner_radius must be >= 0",
        )?;
        check(
            d.outer_radius.map_or(true, |r| r.is_finite() && r >= 0.0),
            "disc.outer_radius must be >= 0",
        )?;
        check(
            d.central_mass.is_finite() && d.central_mass > 0.0,
            "disc.central_mass must be > 0",
        )?;
        check(
            d.central_radius.map_or(true, |r| r.is_finite() && r >= 0.0),
            "disc.central_radius must be >= 0",
        )?;
        check(d.body_mass.is_finite() && d.body_mass > 0.0, "disc.body_mass must be > 0")?;
        Ok(())
    }

    pub fn apply(&mut self, update: &ParameterUpdate) {
        if let Some(n) = update.body_count {
            self.body_count = n;
        }
        if let Some(theta) = update.theta {
            self.theta = theta;
        }
        if let Some(epsilon) = update.epsilon {
            self.epsilon = epsilon;
        }
        if let Some(dt) = update.dt {
            self.dt = dt;
        }
    }
}

/// Partial parameter change coming from a UI. Only the body count forces the
/// disc to be regenerated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub body_count: Option<usize>,
    pub theta: Option<f64>,
    pub epsilon: Option<f64>,
    pub dt: Option<f64>,
}
