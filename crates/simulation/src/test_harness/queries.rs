//! Query and recording helpers for `TestMonitor`.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::buildings::BuildingId;
use crate::earthquake::{EarthquakeRun, EarthquakeUpdate, MonitorPhase};
use crate::listeners::{DamageSnapshot, ListenerHandle, ReadingSnapshot};
use crate::readings::{Heartbeats, SilencedSensors};

use super::TestMonitor;

/// Shared sink a recording listener appends to.
pub type Recorded<T> = Arc<Mutex<Vec<T>>>;

/// Copy of everything a recorder has seen so far.
pub fn recorded<T: Clone>(sink: &Recorded<T>) -> Vec<T> {
    sink.lock().map(|v| v.clone()).unwrap_or_default()
}

impl TestMonitor {
    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    pub fn resource<T: Resource>(&self) -> &T {
        self.world().resource::<T>()
    }

    pub fn active_run(&self) -> Option<&EarthquakeRun> {
        self.resource::<MonitorPhase>().active_run()
    }

    pub fn silenced(&self) -> Vec<BuildingId> {
        self.resource::<SilencedSensors>().0.iter().copied().collect()
    }

    pub fn heartbeat_age(&self, id: BuildingId) -> Option<u64> {
        self.resource::<Heartbeats>().age_ms(id, self.now_ms())
    }

    /// Sum of every record's total score.
    pub fn total_damage(&self) -> u32 {
        self.ledger()
            .records()
            .map(|(_, r)| u32::from(r.total_score))
            .sum()
    }

    // -----------------------------------------------------------------------
    // Recorders
    // -----------------------------------------------------------------------

    pub fn record_readings(&mut self) -> (ListenerHandle, Recorded<ReadingSnapshot>) {
        let sink: Recorded<ReadingSnapshot> = Arc::default();
        let writer = Arc::clone(&sink);
        let handle = self.subscribe_readings(move |snapshot| {
            if let Ok(mut v) = writer.lock() {
                v.push(snapshot.clone());
            }
        });
        (handle, sink)
    }

    pub fn record_damage(&mut self) -> (ListenerHandle, Recorded<DamageSnapshot>) {
        let sink: Recorded<DamageSnapshot> = Arc::default();
        let writer = Arc::clone(&sink);
        let handle = self.subscribe_damage(move |snapshot| {
            if let Ok(mut v) = writer.lock() {
                v.push(snapshot.clone());
            }
        });
        (handle, sink)
    }

    pub fn record_earthquake(&mut self) -> (ListenerHandle, Recorded<EarthquakeUpdate>) {
        let sink: Recorded<EarthquakeUpdate> = Arc::default();
        let writer = Arc::clone(&sink);
        let handle = self.subscribe_earthquake(move |update| {
            if let Ok(mut v) = writer.lock() {
                v.push(update.clone());
            }
        });
        (handle, sink)
    }
}
