//! Command executor: drains the [`MonitorCommandQueue`] at the start of each
//! tick and applies every command to the world, recording outcomes in the
//! [`CommandResultLog`].
//!
//! Commands touch many resources at once (a reset clears nearly all of
//! them), so the executor is an exclusive system. The engine facade calls
//! [`execute_single`] directly for synchronous commands.

use bevy::prelude::*;

use crate::buildings::{BuildingId, BuildingRoster};
use crate::earthquake::{begin_earthquake, MonitorPhase};
use crate::fatigue::FatigueTracker;
use crate::params::MonitorParams;
use crate::readings::SilencedSensors;
use crate::synthesizer::NoisePulses;
use crate::world_init::reset_world;

use super::result_log::CommandResultLog;
use super::{CommandError, CommandOutcome, MonitorCommand, MonitorCommandQueue};

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

pub fn execute_queued_commands(world: &mut World) {
    let queued = world.resource_mut::<MonitorCommandQueue>().drain();
    for entry in queued {
        let outcome = execute_single(world, &entry.command);
        debug!(
            "Command {} from {:?} (tick {}): {:?}",
            entry.command.name(),
            entry.source,
            entry.tick,
            outcome
        );
        world
            .resource_mut::<CommandResultLog>()
            .push(entry.command, outcome);
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub fn execute_single(world: &mut World, command: &MonitorCommand) -> CommandOutcome {
    match command {
        MonitorCommand::TriggerEarthquake(config) => begin_earthquake(world, config.clone()),
        MonitorCommand::InjectNoisePulse { building } => execute_noise_pulse(world, *building),
        MonitorCommand::ResetFatigue { building } => execute_reset_fatigue(world, *building),
        MonitorCommand::Reset => {
            reset_world(world);
            CommandOutcome::Applied
        }
    }
}

// ---------------------------------------------------------------------------
// Execution functions
// ---------------------------------------------------------------------------

fn require_building(world: &World, id: BuildingId) -> Result<(), CommandOutcome> {
    if world.resource::<BuildingRoster>().contains(id) {
        Ok(())
    } else {
        Err(CommandOutcome::Rejected(CommandError::UnknownBuilding(id)))
    }
}

fn execute_noise_pulse(world: &mut World, id: BuildingId) -> CommandOutcome {
    if let Err(outcome) = require_building(world, id) {
        return outcome;
    }
    if world.resource::<MonitorPhase>().is_event_active() {
        return CommandOutcome::Ignored("noise pulses only run while idle".to_string());
    }
    if world.resource::<SilencedSensors>().contains(id) {
        return CommandOutcome::Ignored(format!("sensor of {id} is silenced"));
    }
    let ticks = world.resource::<MonitorParams>().synth.noise_pulse_ticks;
    world.resource_mut::<NoisePulses>().start(id, ticks);
    info!("Noise pulse injected into {id} for {ticks} ticks");
    CommandOutcome::Applied
}

fn execute_reset_fatigue(world: &mut World, id: Option<BuildingId>) -> CommandOutcome {
    if let Some(id) = id {
        if let Err(outcome) = require_building(world, id) {
            return outcome;
        }
    }
    world.resource_mut::<FatigueTracker>().reset(id);
    CommandOutcome::Applied
}
