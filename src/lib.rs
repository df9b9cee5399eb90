pub mod app;
pub mod body;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod generator;
pub mod profiler;
pub mod quadtree;
pub mod simulation;
pub mod spatial_hash;
pub mod vector;

pub use body::Body;
pub use config::{ParameterUpdate, SimConfig};
pub use error::SimError;
pub use simulation::{Simulation, Snapshot};
pub use vector::Vector2;

#[cfg(feature = "profiling")]
use once_cell::sync::Lazy;
#[cfg(feature = "profiling")]
use parking_lot::Mutex;

#[cfg(feature = "profiling")]
pub static PROFILER: Lazy<Mutex<profiler::Profiler>> =
    Lazy::new(|| Mutex::new(profiler::Profiler::new()));
