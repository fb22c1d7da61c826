use std::time::Duration;

use bevy::prelude::*;

pub mod buildings;
pub mod consensus;
pub mod damage_ledger;
pub mod earthquake;
pub mod engine;
pub mod fatigue;
pub mod listeners;
pub mod monitor_commands;
pub mod observation;
pub mod params;
pub mod readings;
pub mod sim_clock;
pub mod sim_rng;
pub mod simulation_sets;
pub mod state_hash;
pub mod synthesizer;
pub mod world_init;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use engine::MonitorEngine;
pub use simulation_sets::SimulationSet;

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Global tick counter incremented each FixedUpdate.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

/// Wires the whole monitor into an `App`.
///
/// Insert `MonitorParams`, `SimRng` or a `BuildingRoster` before adding the
/// plugin to override the defaults (entropy-seeded RNG, generated roster).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let tick_interval_ms = app
            .world()
            .get_resource::<params::MonitorParams>()
            .map(|p| p.tick_interval_ms)
            .unwrap_or(params::MonitorParams::default().tick_interval_ms);

        app.init_resource::<TickCounter>()
            .init_resource::<params::MonitorParams>()
            .init_resource::<sim_rng::SimRng>()
            .init_resource::<buildings::BuildingRoster>()
            .insert_resource(Time::<Fixed>::from_duration(Duration::from_millis(
                tick_interval_ms.max(1),
            )))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::PreSim,
                    SimulationSet::Simulation,
                    SimulationSet::PostSim,
                )
                    .chain(),
            )
            .add_systems(Startup, world_init::init_world);

        app.add_plugins((
            sim_clock::SimClockPlugin,
            monitor_commands::MonitorCommandsPlugin,
            synthesizer::SynthesizerPlugin,
            earthquake::EarthquakePlugin,
            damage_ledger::DamageLedgerPlugin,
            consensus::ConsensusPlugin,
            fatigue::FatiguePlugin,
            listeners::ListenersPlugin,
            state_hash::StateHashPlugin,
        ));
    }
}
