//! Assertion helpers for `TestMonitor` integration tests.

use crate::buildings::BuildingId;
use crate::damage_ledger::BuildingStatus;

use super::TestMonitor;

impl TestMonitor {
    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_status(&self, id: BuildingId, expected: BuildingStatus) {
        let status = self.status(id);
        assert_eq!(
            status,
            Some(expected),
            "Expected {id} to be {}, got {status:?}",
            expected.name()
        );
    }

    /// The summary buckets always cover the whole population.
    pub fn assert_summary_covers_population(&self) {
        let summary = self.summary();
        let population = self.buildings().len();
        assert_eq!(
            summary.total(),
            population,
            "Expected summary to cover {population} buildings, got {summary:?}"
        );
    }

    pub fn assert_reporting(&self, id: BuildingId) {
        assert!(
            self.reading(id).is_some(),
            "Expected a reading for {id}, found none"
        );
        let age = self.heartbeat_age(id);
        assert_eq!(age, Some(0), "Expected {id} to report this tick, age {age:?}");
    }

    pub fn assert_silent(&self, id: BuildingId) {
        assert!(
            self.reading(id).is_none(),
            "Expected {id} to be silent, found a reading"
        );
    }

    pub fn assert_event_active(&self, expected: bool) {
        assert_eq!(
            self.is_event_active(),
            expected,
            "Expected event active = {expected} at tick {}",
            self.tick_count()
        );
    }
}
