//! `MonitorEngine`: one explicitly owned simulated world.
//!
//! Wraps a headless `App` running [`SimulationPlugin`]. Ticks are driven by
//! the caller through [`MonitorEngine::tick`]; commands issued through the
//! facade are executed immediately and recorded in the same result log as
//! queued commands. Several engines can coexist, each with its own RNG and
//! clock.

use bevy::prelude::*;

use crate::buildings::{Building, BuildingId, BuildingRoster};
use crate::consensus::{ConsensusEvent, ConsensusEvidence};
use crate::damage_ledger::{BuildingStatus, DamageLedger, DamageRecord, DamageSummary};
use crate::earthquake::{EarthquakeConfig, EarthquakeUpdate, MonitorPhase};
use crate::fatigue::{FatigueIndicator, FatigueTracker};
use crate::listeners::{
    DamageListeners, DamageSnapshot, EarthquakeListeners, ListenerHandle, ReadingListeners,
    ReadingSnapshot,
};
use crate::monitor_commands::{
    execute_single, CommandOutcome, CommandResultLog, CommandSource, MonitorCommand,
    MonitorCommandQueue,
};
use crate::observation::MonitorObservation;
use crate::params::MonitorParams;
use crate::readings::{ReadingTable, SensorReading, SilencedSensors};
use crate::sim_clock::SimClock;
use crate::sim_rng::SimRng;
use crate::state_hash::StateHash;
use crate::{SimulationPlugin, TickCounter};

pub struct MonitorEngine {
    app: App,
}

impl Default for MonitorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorEngine {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Default parameters, generated population, entropy-seeded RNG.
    pub fn new() -> Self {
        Self::build(MonitorParams::default(), SimRng::default(), None)
    }

    /// Deterministic world for the given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::build(MonitorParams::default(), SimRng::from_seed_u64(seed), None)
    }

    /// Full control: parameters, RNG and optionally a hand-placed population.
    pub fn build(params: MonitorParams, rng: SimRng, buildings: Option<Vec<Building>>) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(params);
        app.insert_resource(rng);
        if let Some(buildings) = buildings {
            app.insert_resource(BuildingRoster::new(buildings));
        }
        app.add_plugins(SimulationPlugin);

        // Runs Startup: roster generation and initial base scores.
        app.update();

        Self { app }
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// Run `n` ticks by executing the `FixedUpdate` schedule directly.
    ///
    /// `First` never runs here, so the event buffers are swapped by hand after
    /// each tick. Readers consume their events within the tick they are sent.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            let world = self.app.world_mut();
            world.run_schedule(FixedUpdate);
            world.resource_mut::<Events<EarthquakeUpdate>>().update();
            world.resource_mut::<Events<ConsensusEvent>>().update();
        }
    }

    /// Tick until the running earthquake finishes. Returns the ticks run.
    pub fn run_until_idle(&mut self, max_ticks: u32) -> u32 {
        let mut ran = 0;
        while ran < max_ticks && self.is_event_active() {
            self.tick(1);
            ran += 1;
        }
        ran
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub fn subscribe_readings(
        &mut self,
        callback: impl FnMut(&ReadingSnapshot) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.world_mut().resource_mut::<ReadingListeners>().add(callback)
    }

    pub fn unsubscribe_readings(&mut self, handle: ListenerHandle) -> bool {
        self.world_mut().resource_mut::<ReadingListeners>().remove(handle)
    }

    pub fn subscribe_damage(
        &mut self,
        callback: impl FnMut(&DamageSnapshot) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.world_mut().resource_mut::<DamageListeners>().add(callback)
    }

    pub fn unsubscribe_damage(&mut self, handle: ListenerHandle) -> bool {
        self.world_mut().resource_mut::<DamageListeners>().remove(handle)
    }

    pub fn subscribe_earthquake(
        &mut self,
        callback: impl FnMut(&EarthquakeUpdate) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.world_mut()
            .resource_mut::<EarthquakeListeners>()
            .add(callback)
    }

    pub fn unsubscribe_earthquake(&mut self, handle: ListenerHandle) -> bool {
        self.world_mut()
            .resource_mut::<EarthquakeListeners>()
            .remove(handle)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Execute a command now and log its outcome.
    pub fn execute(&mut self, command: MonitorCommand) -> CommandOutcome {
        let world = self.app.world_mut();
        let outcome = execute_single(world, &command);
        world
            .resource_mut::<CommandResultLog>()
            .push(command, outcome.clone());
        outcome
    }

    /// Queue a command for the start of the next tick.
    pub fn enqueue(&mut self, command: MonitorCommand) {
        let tick = self.tick_count();
        self.world_mut()
            .resource_mut::<MonitorCommandQueue>()
            .push(tick, CommandSource::Operator, command);
    }

    /// Start an earthquake. Progress streams through earthquake listeners as
    /// the engine ticks.
    pub fn trigger_earthquake(&mut self, config: EarthquakeConfig) -> CommandOutcome {
        self.execute(MonitorCommand::TriggerEarthquake(config))
    }

    pub fn inject_noise_pulse(&mut self, building: BuildingId) -> CommandOutcome {
        self.execute(MonitorCommand::InjectNoisePulse { building })
    }

    pub fn reset_fatigue(&mut self, building: Option<BuildingId>) -> CommandOutcome {
        self.execute(MonitorCommand::ResetFatigue { building })
    }

    pub fn reset_all(&mut self) {
        self.execute(MonitorCommand::Reset);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Last reading; `None` for unknown ids and silenced sensors.
    pub fn reading(&self, id: BuildingId) -> Option<SensorReading> {
        if self.world().resource::<SilencedSensors>().contains(id) {
            return None;
        }
        self.world().resource::<ReadingTable>().get(id).cloned()
    }

    /// `None` for unknown ids; an empty indicator for a building that has
    /// not reported a resting frequency yet.
    pub fn fatigue_indicator(&self, id: BuildingId) -> Option<FatigueIndicator> {
        if !self.world().resource::<BuildingRoster>().contains(id) {
            return None;
        }
        Some(
            self.world()
                .resource::<FatigueTracker>()
                .indicator(id)
                .cloned()
                .unwrap_or_else(FatigueIndicator::empty),
        )
    }

    pub fn damage_record(&self, id: BuildingId) -> Option<DamageRecord> {
        self.ledger().record(id).copied()
    }

    pub fn status(&self, id: BuildingId) -> Option<BuildingStatus> {
        self.ledger().status(id)
    }

    pub fn summary(&self) -> DamageSummary {
        self.ledger().summary()
    }

    pub fn consensus_evidence(&self, id: BuildingId) -> Option<Vec<BuildingId>> {
        self.world()
            .resource::<ConsensusEvidence>()
            .get(id)
            .map(<[BuildingId]>::to_vec)
    }

    pub fn observation(&self) -> MonitorObservation {
        MonitorObservation::capture(self.world())
    }

    pub fn is_event_active(&self) -> bool {
        self.world().resource::<MonitorPhase>().is_event_active()
    }

    pub fn buildings(&self) -> &BuildingRoster {
        self.world().resource::<BuildingRoster>()
    }

    pub fn ledger(&self) -> &DamageLedger {
        self.world().resource::<DamageLedger>()
    }

    pub fn params(&self) -> &MonitorParams {
        self.world().resource::<MonitorParams>()
    }

    pub fn now_ms(&self) -> u64 {
        self.world().resource::<SimClock>().now_ms
    }

    pub fn tick_count(&self) -> u64 {
        self.world().resource::<TickCounter>().0
    }

    pub fn state_hash(&self) -> u64 {
        self.world().resource::<StateHash>().hash
    }

    pub fn command_log(&self) -> &CommandResultLog {
        self.world().resource::<CommandResultLog>()
    }

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}
