//! Pre-startup configuration and post-startup builder methods for
//! `TestMonitor`.

use crate::buildings::{Building, BuildingId};
use crate::earthquake::EarthquakeConfig;
use crate::params::MonitorParams;
use crate::readings::{ReadingTable, SilencedSensors};
use crate::sim_rng::SimRng;
use crate::MonitorEngine;

use super::{TestMonitor, TEST_SEED};

/// Everything that has to be decided before Startup runs.
#[derive(Debug, Clone)]
pub struct MonitorSetup {
    seed: u64,
    params: MonitorParams,
    buildings: Option<Vec<Building>>,
}

impl Default for MonitorSetup {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorSetup {
    pub fn new() -> Self {
        Self {
            seed: TEST_SEED,
            params: MonitorParams::default(),
            buildings: None,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Size of the generated population. Ignored with hand-placed buildings.
    pub fn building_count(mut self, count: usize) -> Self {
        self.params.population.building_count = count;
        self
    }

    /// Every building starts from the same base score.
    pub fn base_score(mut self, score: u8) -> Self {
        self.params.population.elevated_base_range = (score, score);
        self.params.population.normal_base_range = (score, score);
        self
    }

    /// Removes the per-building damage jitter.
    pub fn without_damage_jitter(mut self) -> Self {
        self.params.damage.jitter = (1.0, 1.0);
        self
    }

    /// Events never cost a sensor.
    pub fn without_sensor_loss(mut self) -> Self {
        self.params.damage.sensor_loss_probability = 0.0;
        self
    }

    pub fn buildings(mut self, buildings: Vec<Building>) -> Self {
        self.buildings = Some(buildings);
        self
    }

    pub fn params(mut self, edit: impl FnOnce(&mut MonitorParams)) -> Self {
        edit(&mut self.params);
        self
    }

    pub fn build(self) -> TestMonitor {
        TestMonitor::from_engine(MonitorEngine::build(
            self.params,
            SimRng::from_seed_u64(self.seed),
            self.buildings,
        ))
    }
}

impl TestMonitor {
    // -----------------------------------------------------------------------
    // Builder methods (after Startup)
    // -----------------------------------------------------------------------

    /// Trigger an earthquake, panicking if it is not accepted.
    pub fn with_earthquake(mut self, config: EarthquakeConfig) -> Self {
        let outcome = self.trigger_earthquake(config);
        assert!(outcome.is_applied(), "earthquake not started: {outcome:?}");
        self
    }

    pub fn with_noise_pulse(mut self, id: BuildingId) -> Self {
        let outcome = self.inject_noise_pulse(id);
        assert!(outcome.is_applied(), "noise pulse not started: {outcome:?}");
        self
    }

    // -----------------------------------------------------------------------
    // Direct sensor manipulation
    // -----------------------------------------------------------------------

    /// Take a sensor offline the way sensor loss does.
    pub fn silence_sensor(&mut self, id: BuildingId) {
        let world = self.world_mut();
        world.resource_mut::<SilencedSensors>().insert(id);
        world.resource_mut::<ReadingTable>().remove(id);
    }

    /// Bring a silenced sensor back; it reports again from the next tick.
    pub fn restore_sensor(&mut self, id: BuildingId) {
        self.world_mut()
            .resource_mut::<SilencedSensors>()
            .0
            .remove(&id);
    }
}
