use super::command_loop::{handle_command, Flow, SimCommand};
use super::{LoopState, SharedSnapshot};
use crate::profile_scope;
use crate::simulation::Simulation;
use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Instant;

/// Copy the current state into the shared snapshot.
pub fn publish(simulation: &Simulation, shared: &SharedSnapshot) {
    let snapshot = simulation.snapshot();
    *shared.lock() = snapshot;
}

/// Print a warning for bodies that picked up NaN or infinite values.
/// Returns how many there were.
pub fn report_non_finite(simulation: &Simulation) -> usize {
    let invalid = simulation.non_finite_bodies();
    if !invalid.is_empty() {
        eprintln!(
            "[ERROR] frame {}: {} bodies with non-finite state (first: {})",
            simulation.frame(),
            invalid.len(),
            invalid[0]
        );
    }
    invalid.len()
}

/// Run until `Shutdown` arrives or every sender is dropped, then return the
/// simulation.
///
/// While running, pending commands are applied before each frame, then the
/// substep clock decides how many steps the elapsed wall time is worth. While
/// paused the loop blocks on the channel. A snapshot is published after every
/// command and every frame that stepped.
pub fn run_simulation_loop(
    rx: Receiver<SimCommand>,
    mut simulation: Simulation,
    shared: SharedSnapshot,
    mut state: LoopState,
) -> Simulation {
    let dispatch = |cmd: SimCommand, simulation: &mut Simulation, state: &mut LoopState| {
        let flow = handle_command(cmd, simulation, state);
        publish(simulation, &shared);
        flow
    };

    let mut last = Instant::now();
    loop {
        loop {
            match rx.try_recv() {
                Ok(cmd) => {
                    if dispatch(cmd, &mut simulation, &mut state) == Flow::Stop {
                        return simulation;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return simulation,
            }
        }

        if state.paused {
            match rx.recv() {
                Ok(cmd) => {
                    if dispatch(cmd, &mut simulation, &mut state) == Flow::Stop {
                        return simulation;
                    }
                }
                Err(_) => return simulation,
            }
            last = Instant::now();
            continue;
        }

        let now = Instant::now();
        let substeps = state.clock.advance(now - last);
        last = now;
        if substeps > 0 {
            {
                profile_scope!("simulation_loop");
                for _ in 0..substeps {
                    simulation.step();
                }
            }
            report_non_finite(&simulation);
            publish(&simulation, &shared);

            #[cfg(feature = "profiling")]
            crate::PROFILER.lock().print_and_clear_every(simulation.frame());
        }

        match rx.recv_timeout(state.clock.until_next()) {
            Ok(cmd) => {
                if dispatch(cmd, &mut simulation, &mut state) == Flow::Stop {
                    return simulation;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return simulation,
        }
    }
}
