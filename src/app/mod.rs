//! Driver layer between the simulation and whatever renders it.
//!
//! The simulation runs on its own thread ([`spawn_simulation`]) and is the
//! only writer of the body list. Callers talk to it by sending
//! [`SimCommand`]s over a crossbeam channel and read the latest
//! [`Snapshot`] from a shared mutex.

use crate::config::SimConfig;
use crate::simulation::{Simulation, Snapshot};
use crossbeam::channel::{unbounded, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub mod command_loop;
pub mod simulation_loop;

pub use command_loop::{handle_command, Flow, SimCommand};
pub use simulation_loop::run_simulation_loop;

/// Latest published frame, shared with the render side.
pub type SharedSnapshot = Arc<Mutex<Snapshot>>;

/// Converts elapsed wall-clock time into a whole number of physics steps.
///
/// Leftover time carries into the next call. At most `max_substeps` steps
/// are handed out per call; any backlog past that is dropped, so a slow
/// frame cannot snowball into ever longer catch-up work.
#[derive(Clone, Debug)]
pub struct SubstepClock {
    step: Duration,
    max_substeps: usize,
    accumulator: Duration,
}

impl SubstepClock {
    pub fn new(step: Duration, max_substeps: usize) -> Self {
        Self {
            step: step.max(Duration::from_nanos(1)),
            max_substeps: max_substeps.max(1),
            accumulator: Duration::ZERO,
        }
    }

    /// One simulated second per wall-clock second.
    pub fn for_config(config: &SimConfig) -> Self {
        Self::new(step_duration(config.dt), config.max_substeps)
    }

    pub fn set_step(&mut self, step: Duration) {
        self.step = step.max(Duration::from_nanos(1));
    }

    pub fn set_max_substeps(&mut self, max_substeps: usize) {
        self.max_substeps = max_substeps.max(1);
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn advance(&mut self, elapsed: Duration) -> usize {
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_substeps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if self.accumulator >= self.step {
            self.accumulator = Duration::ZERO;
        }
        steps
    }

    /// Wall-clock time until the next step becomes due.
    pub fn until_next(&self) -> Duration {
        self.step.saturating_sub(self.accumulator)
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

pub(crate) fn step_duration(dt: f64) -> Duration {
    Duration::try_from_secs_f64(dt).unwrap_or(Duration::MAX)
}

/// Driver-side state that lives next to the simulation on its thread.
#[derive(Clone, Debug)]
pub struct LoopState {
    pub paused: bool,
    pub clock: SubstepClock,
}

impl LoopState {
    pub fn new(config: &SimConfig, paused: bool) -> Self {
        Self {
            paused,
            clock: SubstepClock::for_config(config),
        }
    }
}

/// Handles to a simulation running on its own thread.
pub struct SimulationHandle {
    pub commands: Sender<SimCommand>,
    pub snapshot: SharedSnapshot,
    thread: JoinHandle<Simulation>,
}

impl SimulationHandle {
    /// Ask the loop to stop and hand back the final simulation state.
    pub fn shutdown(self) -> std::thread::Result<Simulation> {
        // a closed channel also stops the loop, so a failed send is fine
        let _ = self.commands.send(SimCommand::Shutdown);
        self.thread.join()
    }
}

/// Move `simulation` onto a new thread running [`run_simulation_loop`].
pub fn spawn_simulation(simulation: Simulation, paused: bool) -> SimulationHandle {
    let (tx, rx) = unbounded();
    let snapshot: SharedSnapshot = Arc::new(Mutex::new(simulation.snapshot()));
    let state = LoopState::new(simulation.config(), paused);
    let shared = Arc::clone(&snapshot);
    let thread = std::thread::spawn(move || run_simulation_loop(rx, simulation, shared, state));
    SimulationHandle {
        commands: tx,
        snapshot,
        thread,
    }
}
