use super::{step_duration, LoopState};
use crate::body::Body;
use crate::config::{ParameterUpdate, SimConfig};
use crate::profile_scope;
use crate::simulation::Simulation;
use crate::vector::Vector2;

/// Requests sent to the simulation thread.
#[derive(Clone, Debug)]
pub enum SimCommand {
    AddBody { body: Body },
    /// Body with radius derived from its mass.
    Spawn { pos: Vector2, vel: Vector2, mass: f64 },
    UpdateParameters(ParameterUpdate),
    Reset(Box<SimConfig>),
    /// Advance exactly one step, paused or not.
    StepOnce,
    Pause,
    Resume,
    Shutdown,
}

/// Whether the loop keeps running after a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Apply one command. Rejected commands are reported on stderr and leave the
/// simulation unchanged.
pub fn handle_command(cmd: SimCommand, simulation: &mut Simulation, state: &mut LoopState) -> Flow {
    profile_scope!("command_handling");
    match cmd {
        SimCommand::AddBody { body } => {
            match Body::new(body.pos, body.vel, body.mass, body.radius) {
                Ok(body) => {
                    simulation.add_body(body);
                }
                Err(e) => eprintln!("[WARN] AddBody ignored: {e}"),
            }
        }
        SimCommand::Spawn { pos, vel, mass } => {
            if let Err(e) = simulation.spawn(pos, vel, mass) {
                eprintln!("[WARN] Spawn ignored: {e}");
            }
        }
        SimCommand::UpdateParameters(update) => match simulation.update_parameters(&update) {
            Ok(()) => {
                state.clock.set_step(step_duration(simulation.config().dt));
                if update.body_count.is_some() {
                    state.clock.reset();
                }
            }
            Err(e) => eprintln!("[WARN] UpdateParameters ignored: {e}"),
        },
        SimCommand::Reset(config) => match simulation.reset(*config) {
            Ok(()) => {
                state.clock.set_step(step_duration(simulation.config().dt));
                state.clock.set_max_substeps(simulation.config().max_substeps);
                state.clock.reset();
            }
            Err(e) => eprintln!("[WARN] Reset ignored: {e}"),
        },
        SimCommand::StepOnce => {
            simulation.step();
            super::simulation_loop::report_non_finite(simulation);
        }
        SimCommand::Pause => state.paused = true,
        SimCommand::Resume => {
            state.paused = false;
            state.clock.reset();
        }
        SimCommand::Shutdown => return Flow::Stop,
    }
    Flow::Continue
}
