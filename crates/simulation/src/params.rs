//! Data-driven monitor parameters.
//!
//! Collects the tunable constants of the monitor into a single
//! [`MonitorParams`] resource. Insert a customised value before adding
//! `SimulationPlugin` to override the defaults; systems read
//! `Res<MonitorParams>` instead of module-level constants.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buildings::GeoPoint;

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationParams {
    /// Number of buildings generated at startup.
    pub building_count: usize,
    /// Centre of the monitored district.
    pub center: GeoPoint,
    /// Buildings are scattered uniformly within this radius (km).
    pub spread_km: f64,
    /// Base score range for the first two buildings (inclusive).
    pub elevated_base_range: (u8, u8),
    /// Base score range for every other building (inclusive).
    pub normal_base_range: (u8, u8),
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            building_count: 80,
            center: GeoPoint::new(41.0082, 28.9784),
            spread_km: 3.0,
            elevated_base_range: (35, 75),
            normal_base_range: (0, 25),
        }
    }
}

// ---------------------------------------------------------------------------
// Reading synthesis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthParams {
    /// Half-width of the idle acceleration noise band (g).
    pub idle_axis_noise: f64,
    /// Half-width of the idle frequency jitter (Hz).
    pub idle_frequency_jitter: f64,
    /// Event-mode amplitude decay per km from the epicenter.
    pub event_distance_decay_per_km: f64,
    /// Floor of the event-mode distance factor.
    pub event_min_distance_factor: f64,
    /// Resonant shaking band during an event (Hz).
    pub event_band_hz: (f64, f64),
    /// High-frequency band of an injected noise pulse (Hz).
    pub noise_band_hz: (f64, f64),
    /// Number of ticks a noise pulse lasts.
    pub noise_pulse_ticks: u32,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            idle_axis_noise: 0.02,
            idle_frequency_jitter: 0.02,
            event_distance_decay_per_km: 0.1,
            event_min_distance_factor: 0.1,
            event_band_hz: (2.0, 3.0),
            noise_band_hz: (8.0, 10.0),
            noise_pulse_ticks: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Earthquake damage model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageParams {
    pub distance_decay_per_km: f64,
    pub min_distance_factor: f64,
    /// Damage points per unit of intensity at the epicenter.
    pub scale: f64,
    pub masonry_factor: f64,
    pub timber_factor: f64,
    /// Multiplier for construction before `old_construction_year`.
    pub old_construction_factor: f64,
    pub old_construction_year: u16,
    /// Multiplier for buildings with more than `tall_floor_threshold` floors.
    pub tall_building_factor: f64,
    pub tall_floor_threshold: u8,
    /// Uniform jitter applied to every damage roll (inclusive).
    pub jitter: (f64, f64),
    /// Envelope level above which sensors can be destroyed.
    pub violent_envelope: f64,
    /// Projected cumulative score at which a sensor may be destroyed.
    pub destruction_threshold: u8,
    /// Probability that a building past the threshold loses its sensor.
    pub sensor_loss_probability: f64,
}

impl Default for DamageParams {
    fn default() -> Self {
        Self {
            distance_decay_per_km: 0.08,
            min_distance_factor: 0.2,
            scale: 15.0,
            masonry_factor: 1.5,
            timber_factor: 1.3,
            old_construction_factor: 1.3,
            old_construction_year: 1980,
            tall_building_factor: 1.2,
            tall_floor_threshold: 4,
            jitter: (0.85, 1.15),
            violent_envelope: 0.8,
            destruction_threshold: 85,
            sensor_loss_probability: 0.4,
        }
    }
}

// ---------------------------------------------------------------------------
// Silence consensus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// A heartbeat older than this is considered silent (ms).
    pub silence_threshold_ms: u64,
    /// Witnesses must lie within this distance of the silent building (km).
    pub witness_radius_km: f64,
    /// Minimum number of active witnesses to infer a collapse.
    pub min_witnesses: usize,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            silence_threshold_ms: 1000,
            witness_radius_km: 1.5,
            min_witnesses: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Fatigue tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueParams {
    /// Rolling window capacity; the oldest sample is evicted on overflow.
    pub window_capacity: usize,
    /// Number of earliest samples whose median becomes the baseline.
    pub baseline_span: usize,
    /// Minimum window size before a trend is computed.
    pub min_samples: usize,
    /// Slope (Hz per sample) below which a downward trend is suspicious.
    pub slope_threshold: f64,
    /// Minimum R² for a warning.
    pub min_confidence: f64,
}

impl Default for FatigueParams {
    fn default() -> Self {
        Self {
            window_capacity: 120,
            baseline_span: 10,
            min_samples: 20,
            slope_threshold: -0.005,
            min_confidence: 0.6,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level resource
// ---------------------------------------------------------------------------

/// All tunable monitor parameters.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorParams {
    /// Fixed tick interval in milliseconds.
    pub tick_interval_ms: u64,
    pub population: PopulationParams,
    pub synth: SynthParams,
    pub damage: DamageParams,
    pub consensus: ConsensusParams,
    pub fatigue: FatigueParams,
}

impl Default for MonitorParams {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            population: PopulationParams::default(),
            synth: SynthParams::default(),
            damage: DamageParams::default(),
            consensus: ConsensusParams::default(),
            fatigue: FatigueParams::default(),
        }
    }
}
