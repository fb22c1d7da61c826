//! Subscriber fan-out.
//!
//! Collaborators register callbacks in a [`Listeners`] registry and get a
//! [`ListenerHandle`] back for removal. The publish systems run in
//! `SimulationSet::PostSim`, after every mutation of the tick is committed,
//! and hand the same snapshot to every listener. A registry remembers the
//! revision it last published so an unchanged table is not re-announced.

use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buildings::BuildingId;
use crate::damage_ledger::{BuildingStatus, DamageLedger, DamageRecord, DamageSummary};
use crate::earthquake::EarthquakeUpdate;
use crate::readings::{ReadingTable, SensorReading};
use crate::sim_clock::SimClock;
use crate::TickCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerHandle(u64);

type Callback<T> = Box<dyn FnMut(&T) + Send + Sync>;

/// Registry of callbacks for one kind of notification.
pub struct Listeners<T> {
    next_handle: u64,
    entries: Vec<(ListenerHandle, Callback<T>)>,
    published: Option<u64>,
}

impl<T: Send + Sync + 'static> Resource for Listeners<T> {}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            entries: Vec::new(),
            published: None,
        }
    }
}

impl<T> Listeners<T> {
    pub fn add(&mut self, callback: impl FnMut(&T) + Send + Sync + 'static) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push((handle, Box::new(callback)));
        handle
    }

    /// Returns `false` if the handle was not registered here.
    pub fn remove(&mut self, handle: ListenerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(h, _)| *h != handle);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn notify(&mut self, value: &T) {
        for (_, callback) in &mut self.entries {
            callback(value);
        }
    }

    /// `true` once per distinct revision.
    fn take_revision(&mut self, revision: u64) -> bool {
        if self.published == Some(revision) {
            return false;
        }
        self.published = Some(revision);
        true
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Full last-known reading table after one committed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSnapshot {
    pub tick: u64,
    pub timestamp_ms: u64,
    pub readings: BTreeMap<BuildingId, SensorReading>,
}

/// Ledger state after a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageSnapshot {
    pub tick: u64,
    pub records: BTreeMap<BuildingId, DamageRecord>,
    pub statuses: BTreeMap<BuildingId, BuildingStatus>,
    pub summary: DamageSummary,
}

impl DamageSnapshot {
    pub fn capture(tick: u64, ledger: &DamageLedger) -> Self {
        let records: BTreeMap<_, _> = ledger.records().map(|(id, r)| (id, *r)).collect();
        let statuses = records
            .keys()
            .filter_map(|id| ledger.status(*id).map(|s| (*id, s)))
            .collect();
        Self {
            tick,
            records,
            statuses,
            summary: ledger.summary(),
        }
    }
}

pub type ReadingListeners = Listeners<ReadingSnapshot>;
pub type DamageListeners = Listeners<DamageSnapshot>;
pub type EarthquakeListeners = Listeners<EarthquakeUpdate>;

// ---------------------------------------------------------------------------
// Publish systems
// ---------------------------------------------------------------------------

pub fn publish_readings(
    tick: Res<TickCounter>,
    clock: Res<SimClock>,
    table: Res<ReadingTable>,
    mut listeners: ResMut<ReadingListeners>,
) {
    if !listeners.take_revision(table.revision()) || listeners.is_empty() {
        return;
    }
    let snapshot = ReadingSnapshot {
        tick: tick.0,
        timestamp_ms: clock.now_ms,
        readings: table.readings().clone(),
    };
    listeners.notify(&snapshot);
}

pub fn publish_damage(
    tick: Res<TickCounter>,
    ledger: Res<DamageLedger>,
    mut listeners: ResMut<DamageListeners>,
) {
    if !listeners.take_revision(ledger.revision()) || listeners.is_empty() {
        return;
    }
    let snapshot = DamageSnapshot::capture(tick.0, &ledger);
    listeners.notify(&snapshot);
}

pub fn publish_earthquake_updates(
    mut updates: EventReader<EarthquakeUpdate>,
    mut listeners: ResMut<EarthquakeListeners>,
) {
    for update in updates.read() {
        listeners.notify(update);
    }
}

pub struct ListenersPlugin;

impl Plugin for ListenersPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ReadingListeners>()
            .init_resource::<DamageListeners>()
            .init_resource::<EarthquakeListeners>()
            .add_systems(
                FixedUpdate,
                (publish_readings, publish_damage, publish_earthquake_updates)
                    .in_set(crate::SimulationSet::PostSim),
            );
    }
}
