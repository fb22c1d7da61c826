//! Sensor reading types and the shared per-tick tables.
//!
//! `ReadingTable` holds the last known reading of every reporting building,
//! `Heartbeats` the last time each one reported, and `SilencedSensors` the
//! sensors destroyed during an earthquake. All three are written only in
//! `SimulationSet::Simulation` and read by the publish step afterwards.

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buildings::BuildingId;

/// Number of spectrum bins covering 0–10 Hz.
pub const SPECTRUM_BINS: usize = 20;
/// Upper edge of the spectrum (Hz).
pub const SPECTRUM_MAX_HZ: f64 = 10.0;
/// Width of one spectrum bin (Hz).
pub const SPECTRUM_BIN_WIDTH_HZ: f64 = SPECTRUM_MAX_HZ / SPECTRUM_BINS as f64;

/// Centre frequency of spectrum bin `idx`.
pub fn bin_center_hz(idx: usize) -> f64 {
    (idx as f64 + 0.5) * SPECTRUM_BIN_WIDTH_HZ
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingClass {
    Idle,
    Seismic,
    Noise,
    Anomaly,
}

/// Three-axis acceleration in g.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Acceleration {
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One synthetic sample from a building's sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp_ms: u64,
    pub acceleration: Acceleration,
    /// Euclidean norm of `acceleration`.
    pub magnitude: f64,
    pub dominant_frequency_hz: f64,
    pub spectrum: [f64; SPECTRUM_BINS],
    pub classification: ReadingClass,
}

impl SensorReading {
    pub fn new(
        timestamp_ms: u64,
        acceleration: Acceleration,
        dominant_frequency_hz: f64,
        spectrum: [f64; SPECTRUM_BINS],
        classification: ReadingClass,
    ) -> Self {
        Self {
            timestamp_ms,
            magnitude: acceleration.magnitude(),
            acceleration,
            dominant_frequency_hz,
            spectrum,
            classification,
        }
    }

    /// Index of the strongest spectrum bin.
    pub fn peak_bin(&self) -> usize {
        self.spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Shared tables
// ---------------------------------------------------------------------------

/// Last known reading per building.
#[derive(Resource, Debug, Clone, Default)]
pub struct ReadingTable {
    readings: BTreeMap<BuildingId, SensorReading>,
    /// Buildings that received a reading during the current tick.
    updated: Vec<BuildingId>,
    /// Bumped on every mutation; the publish step compares against it.
    revision: u64,
}

impl ReadingTable {
    pub fn get(&self, id: BuildingId) -> Option<&SensorReading> {
        self.readings.get(&id)
    }

    pub fn readings(&self) -> &BTreeMap<BuildingId, SensorReading> {
        &self.readings
    }

    /// Buildings written since the last `begin_tick`, in write order.
    pub fn updated(&self) -> &[BuildingId] {
        &self.updated
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn begin_tick(&mut self) {
        self.updated.clear();
    }

    pub fn commit(&mut self, id: BuildingId, reading: SensorReading) {
        self.readings.insert(id, reading);
        self.updated.push(id);
        self.revision += 1;
    }

    pub fn remove(&mut self, id: BuildingId) {
        if self.readings.remove(&id).is_some() {
            self.revision += 1;
        }
    }

    pub fn clear(&mut self) {
        self.readings.clear();
        self.updated.clear();
        self.revision += 1;
    }
}

/// Last-seen timestamp (simulation ms) per building.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct Heartbeats {
    last_seen: BTreeMap<BuildingId, u64>,
}

impl Heartbeats {
    pub fn beat(&mut self, id: BuildingId, now_ms: u64) {
        self.last_seen.insert(id, now_ms);
    }

    pub fn last_seen(&self, id: BuildingId) -> Option<u64> {
        self.last_seen.get(&id).copied()
    }

    /// Age of the heartbeat, `None` if the building never reported.
    pub fn age_ms(&self, id: BuildingId, now_ms: u64) -> Option<u64> {
        self.last_seen(id).map(|t| now_ms.saturating_sub(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = (BuildingId, u64)> + '_ {
        self.last_seen.iter().map(|(id, t)| (*id, *t))
    }

    pub fn clear(&mut self) {
        self.last_seen.clear();
    }
}

/// Sensors destroyed during an earthquake. They produce no readings until
/// the world is reset.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct SilencedSensors(pub BTreeSet<BuildingId>);

impl SilencedSensors {
    pub fn contains(&self, id: BuildingId) -> bool {
        self.0.contains(&id)
    }

    pub fn insert(&mut self, id: BuildingId) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
