use bevy::prelude::*;

use super::executor::execute_queued_commands;
use super::result_log::CommandResultLog;
use super::MonitorCommandQueue;
use crate::SimulationSet;

/// Registers the command queue, result log, and executor system.
pub struct MonitorCommandsPlugin;

impl Plugin for MonitorCommandsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MonitorCommandQueue>();
        app.init_resource::<CommandResultLog>();

        app.add_systems(
            FixedUpdate,
            execute_queued_commands
                .before(crate::sim_clock::advance_sim_clock)
                .in_set(SimulationSet::PreSim),
        );
    }
}
