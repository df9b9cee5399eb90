// simulation/mod.rs
// Re-exports and module declarations for simulation submodules

pub mod collision;
pub mod forces;
mod simulation;
pub use simulation::*;

#[cfg(test)]
mod tests;
