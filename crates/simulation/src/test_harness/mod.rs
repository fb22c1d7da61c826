//! # TestMonitor: headless integration test harness
//!
//! Wraps a [`MonitorEngine`] built from a fixed seed so integration tests can
//! place buildings, drive ticks by hand and assert on the resulting
//! resources without a runner or a logger.
//!
//! ```ignore
//! let mut monitor = TestMonitor::with_buildings(cluster(GeoPoint::new(41.0, 29.0), 5, 0.5));
//! monitor.tick(20);
//! monitor.assert_reporting(BuildingId(0));
//! ```

mod assertions;
mod fixtures;
mod queries;
mod setup;

use std::ops::{Deref, DerefMut};

pub use fixtures::{building, cluster, line_east, uniform_building, TEST_CENTER};
pub use queries::{recorded, Recorded};
pub use setup::MonitorSetup;

use crate::buildings::Building;
use crate::MonitorEngine;

/// Seed used by every harness constructor unless overridden.
pub const TEST_SEED: u64 = 42;

/// A seeded `MonitorEngine` with builder, query and assertion helpers.
///
/// Derefs to the engine, so the full facade (`tick`, `trigger_earthquake`,
/// `subscribe_*`, ...) is available directly.
pub struct TestMonitor {
    engine: MonitorEngine,
}

impl Default for TestMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl TestMonitor {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Default parameters and a generated 80-building population.
    pub fn new() -> Self {
        MonitorSetup::new().build()
    }

    /// Hand-placed population; default parameters.
    pub fn with_buildings(buildings: Vec<Building>) -> Self {
        MonitorSetup::new().buildings(buildings).build()
    }

    pub(crate) fn from_engine(engine: MonitorEngine) -> Self {
        Self { engine }
    }

    pub fn into_engine(self) -> MonitorEngine {
        self.engine
    }
}

impl Deref for TestMonitor {
    type Target = MonitorEngine;

    fn deref(&self) -> &MonitorEngine {
        &self.engine
    }
}

impl DerefMut for TestMonitor {
    fn deref_mut(&mut self) -> &mut MonitorEngine {
        &mut self.engine
    }
}
