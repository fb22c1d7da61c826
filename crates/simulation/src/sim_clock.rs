use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::params::MonitorParams;
use crate::readings::ReadingTable;
use crate::TickCounter;

/// Explicit simulation clock in milliseconds.
///
/// Heartbeats and reading timestamps are taken from this clock, never from
/// wall time, so a seeded world replays identically.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    pub now_ms: u64,
}

impl SimClock {
    pub fn advance_by(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn elapsed_since(&self, earlier: u64) -> u64 {
        self.now_ms.saturating_sub(earlier)
    }
}

/// Opens a new tick: advances the clock by one interval, bumps the tick
/// counter and clears the per-tick "updated" list of the reading table.
pub fn advance_sim_clock(
    params: Res<MonitorParams>,
    mut clock: ResMut<SimClock>,
    mut tick: ResMut<TickCounter>,
    mut table: ResMut<ReadingTable>,
) {
    clock.advance_by(params.tick_interval_ms);
    tick.0 = tick.0.wrapping_add(1);
    table.begin_tick();
}

pub struct SimClockPlugin;

impl Plugin for SimClockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimClock>().add_systems(
            FixedUpdate,
            advance_sim_clock.in_set(crate::SimulationSet::PreSim),
        );
    }
}
