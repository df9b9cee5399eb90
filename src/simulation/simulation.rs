// simulation/simulation.rs
// Contains the Simulation struct and its main methods (new, step, parameter updates, snapshots)

use super::collision;
use super::forces;
use crate::body::Body;
use crate::config::{ParameterUpdate, SimConfig};
use crate::error::SimError;
use crate::generator;
use crate::profile_scope;
use crate::quadtree::{Node, Quadtree};
use crate::spatial_hash::SpatialHash;
use crate::vector::Vector2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// The galaxy state and the per-step pipeline that advances it.
pub struct Simulation {
    pub bodies: Vec<Body>,
    pub quadtree: Quadtree,
    pub config: SimConfig,
    pub(crate) spatial_hash: SpatialHash,
    /// Contacts resolved during the most recent step.
    pub(crate) last_collisions: usize,
    frame: usize,
    time: f64,
}

/// Renderer-facing copy of one body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyView {
    pub pos: Vector2,
    pub vel: Vector2,
    pub mass: f64,
    pub radius: f64,
}

impl From<&Body> for BodyView {
    fn from(body: &Body) -> Self {
        Self {
            pos: body.pos,
            vel: body.vel,
            mass: body.mass,
            radius: body.radius,
        }
    }
}

/// Owned copy of everything a renderer needs for one frame.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub bodies: Vec<BodyView>,
    pub nodes: Vec<Node>,
    pub frame: usize,
    pub time: f64,
}

impl Simulation {
    /// Validate `config` and seed a disc galaxy from it.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let bodies = Self::generate(&config);
        Ok(Self::assemble(config, bodies))
    }

    /// Start from an explicit body set instead of a generated disc.
    pub fn with_bodies(config: SimConfig, bodies: Vec<Body>) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self::assemble(config, bodies))
    }

    fn assemble(config: SimConfig, bodies: Vec<Body>) -> Self {
        let mut quadtree = Quadtree::new(config.theta, config.epsilon);
        quadtree.build(&bodies);
        Self {
            bodies,
            quadtree,
            spatial_hash: SpatialHash::new(config.collisions.grid_size),
            config,
            last_collisions: 0,
            frame: 0,
            time: 0.0,
        }
    }

    fn generate(config: &SimConfig) -> Vec<Body> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        generator::uniform_disc(&config.disc, config.body_count, config.gravitational_constant, &mut rng)
    }

    /// Advance one fixed timestep: gravity, integration, then contacts.
    pub fn step(&mut self) {
        profile_scope!("simulation_step");
        self.attract();
        self.integrate();
        self.handle_collisions();
        self.frame += 1;
        self.time += self.config.dt;
    }

    pub fn attract(&mut self) {
        forces::attract(self);
    }

    pub fn integrate(&mut self) {
        profile_scope!("integrate");
        let dt = self.config.dt;
        self.bodies.par_iter_mut().for_each(|body| body.update(dt));
    }

    pub fn handle_collisions(&mut self) {
        collision::collide(self);
    }

    /// Append a body; returns its index.
    pub fn add_body(&mut self, body: Body) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Append a body whose radius follows from its mass.
    pub fn spawn(&mut self, pos: Vector2, vel: Vector2, mass: f64) -> Result<usize, SimError> {
        let body = Body::with_mass(pos, vel, mass)?;
        Ok(self.add_body(body))
    }

    /// Apply a partial parameter change. A new body count regenerates the
    /// disc from the configured seed; theta, epsilon and dt take effect on
    /// the running system. Invalid updates leave everything untouched.
    pub fn update_parameters(&mut self, update: &ParameterUpdate) -> Result<(), SimError> {
        let mut config = self.config.clone();
        config.apply(update);
        config.validate()?;

        let regenerate = update.body_count.is_some_and(|n| n != self.config.body_count);
        self.quadtree.set_theta(config.theta);
        self.quadtree.set_epsilon(config.epsilon);
        self.config = config;

        if regenerate {
            self.regenerate();
        }
        Ok(())
    }

    /// Replace the whole configuration and start over.
    pub fn reset(&mut self, config: SimConfig) -> Result<(), SimError> {
        config.validate()?;
        self.quadtree = Quadtree::new(config.theta, config.epsilon);
        self.spatial_hash.set_cell_size(config.collisions.grid_size);
        self.config = config;
        self.regenerate();
        Ok(())
    }

    fn regenerate(&mut self) {
        self.bodies = Self::generate(&self.config);
        self.quadtree.build(&self.bodies);
        self.frame = 0;
        self.time = 0.0;
        self.last_collisions = 0;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bodies: self.bodies.iter().map(BodyView::from).collect(),
            nodes: self.quadtree.nodes().to_vec(),
            frame: self.frame,
            time: self.time,
        }
    }

    /// Indices of bodies holding a NaN or infinite component.
    pub fn non_finite_bodies(&self) -> Vec<usize> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_finite())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Simulated time elapsed since the last (re)generation.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn quadtree(&self) -> &Quadtree {
        &self.quadtree
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn last_collisions(&self) -> usize {
        self.last_collisions
    }
}
