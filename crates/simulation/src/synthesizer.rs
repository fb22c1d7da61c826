//! Reading Synthesizer.
//!
//! Produces one [`SensorReading`] per building per tick in one of three
//! modes:
//!
//! * **idle** – low-amplitude noise; the natural frequency follows the
//!   building's accumulated damage (frequency hysteresis),
//! * **seismic** – amplitude shaped by the active earthquake envelope and the
//!   distance to the epicenter,
//! * **noise** – a short high-frequency pulse injected into one building.
//!
//! The generators are pure functions over an injected RNG. The idle system
//! below and the earthquake loop both commit through [`emit_reading`], which
//! updates the heartbeat and the shared reading table together.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use bevy::prelude::*;
use rand::Rng;

use crate::buildings::{BuildingId, BuildingRoster};
use crate::damage_ledger::DamageLedger;
use crate::params::{MonitorParams, SynthParams};
use crate::readings::{
    bin_center_hz, Acceleration, Heartbeats, ReadingClass, ReadingTable, SensorReading,
    SilencedSensors, SPECTRUM_BINS,
};
use crate::sim_clock::SimClock;
use crate::sim_rng::SimRng;

/// Natural frequency of an undamaged building is `MIN + SPAN` (4.5 Hz).
const NATURAL_FREQUENCY_MIN_HZ: f64 = 1.0;
const NATURAL_FREQUENCY_SPAN_HZ: f64 = 3.5;

const IDLE_SPECTRUM_AMPLITUDE: f64 = 0.3;
const IDLE_SPECTRUM_SPREAD: f64 = 0.8;
const IDLE_SPECTRUM_NOISE: f64 = 0.02;

const SEISMIC_SPECTRUM_BASE: f64 = 0.3;
const SEISMIC_SPECTRUM_GAIN: f64 = 1.2;
const SEISMIC_SPECTRUM_SPREAD: f64 = 1.5;
const SEISMIC_SPECTRUM_NOISE: f64 = 0.05;
/// Vertical shaking relative to horizontal.
const SEISMIC_VERTICAL_RATIO: f64 = 0.5;

const NOISE_SPECTRUM_AMPLITUDE: f64 = 0.6;
const NOISE_SPECTRUM_SPREAD: f64 = 0.4;
const NOISE_AXIS_AMPLITUDE: f64 = 0.15;

// =============================================================================
// Signal model
// =============================================================================

/// Frequency hysteresis: `1.0 + 3.5 * max(0, 1 - damage/100)`.
pub fn natural_frequency(total_score: f64) -> f64 {
    NATURAL_FREQUENCY_MIN_HZ + NATURAL_FREQUENCY_SPAN_HZ * (1.0 - total_score / 100.0).max(0.0)
}

/// Half-sine pulse over the event: `sin(π · progress)`, progress clamped to [0, 1].
pub fn envelope(progress: f64) -> f64 {
    (PI * progress.clamp(0.0, 1.0)).sin()
}

/// Event-mode amplitude attenuation: `max(floor, 1 - distance * k)`.
pub fn event_distance_factor(distance_km: f64, params: &SynthParams) -> f64 {
    (1.0 - distance_km * params.event_distance_decay_per_km).max(params.event_min_distance_factor)
}

/// Uniform sample in `[-half_width, half_width]`, zero for an empty band.
fn symmetric<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    if half_width > 0.0 {
        rng.gen_range(-half_width..=half_width)
    } else {
        0.0
    }
}

fn in_band<R: Rng + ?Sized>(rng: &mut R, band: (f64, f64)) -> f64 {
    if band.1 > band.0 {
        rng.gen_range(band.0..=band.1)
    } else {
        band.0
    }
}

/// Gaussian bump centred on `center_hz` plus symmetric noise, clamped ≥ 0.
pub fn synthesize_spectrum<R: Rng + ?Sized>(
    rng: &mut R,
    center_hz: f64,
    amplitude: f64,
    spread: f64,
    noise: f64,
) -> [f64; SPECTRUM_BINS] {
    let mut spectrum = [0.0; SPECTRUM_BINS];
    for (idx, bin) in spectrum.iter_mut().enumerate() {
        let d = bin_center_hz(idx) - center_hz;
        let bump = amplitude * (-(d * d) / (2.0 * spread * spread)).exp();
        *bin = (bump + symmetric(rng, noise)).max(0.0);
    }
    spectrum
}

/// Live shaking seen by one building during an event tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shaking {
    pub intensity: f64,
    pub envelope: f64,
    pub distance_factor: f64,
}

impl Shaking {
    pub fn amplitude(&self) -> f64 {
        self.intensity * self.envelope * self.distance_factor
    }
}

/// Idle-mode reading for a building with the given cumulative score.
pub fn idle_reading<R: Rng + ?Sized>(
    rng: &mut R,
    now_ms: u64,
    total_score: u8,
    params: &SynthParams,
) -> SensorReading {
    let frequency = (natural_frequency(f64::from(total_score))
        + symmetric(rng, params.idle_frequency_jitter))
    .max(0.0);
    let acceleration = Acceleration {
        x: symmetric(rng, params.idle_axis_noise),
        y: symmetric(rng, params.idle_axis_noise),
        z: symmetric(rng, params.idle_axis_noise),
    };
    let spectrum = synthesize_spectrum(
        rng,
        frequency,
        IDLE_SPECTRUM_AMPLITUDE,
        IDLE_SPECTRUM_SPREAD,
        IDLE_SPECTRUM_NOISE,
    );
    SensorReading::new(now_ms, acceleration, frequency, spectrum, ReadingClass::Idle)
}

/// Event-mode reading. The dominant frequency sits in the resonant band
/// regardless of accumulated damage.
pub fn seismic_reading<R: Rng + ?Sized>(
    rng: &mut R,
    now_ms: u64,
    shaking: Shaking,
    params: &SynthParams,
) -> SensorReading {
    let amplitude = shaking.amplitude();
    let frequency = in_band(rng, params.event_band_hz);
    let acceleration = Acceleration {
        x: symmetric(rng, amplitude) + symmetric(rng, params.idle_axis_noise),
        y: symmetric(rng, amplitude) + symmetric(rng, params.idle_axis_noise),
        z: symmetric(rng, amplitude * SEISMIC_VERTICAL_RATIO)
            + symmetric(rng, params.idle_axis_noise),
    };
    let spectrum = synthesize_spectrum(
        rng,
        frequency,
        SEISMIC_SPECTRUM_BASE + SEISMIC_SPECTRUM_GAIN * shaking.envelope,
        SEISMIC_SPECTRUM_SPREAD,
        SEISMIC_SPECTRUM_NOISE * shaking.envelope,
    );
    SensorReading::new(now_ms, acceleration, frequency, spectrum, ReadingClass::Seismic)
}

/// Short localized high-frequency pulse.
pub fn noise_pulse_reading<R: Rng + ?Sized>(
    rng: &mut R,
    now_ms: u64,
    params: &SynthParams,
) -> SensorReading {
    let frequency = in_band(rng, params.noise_band_hz);
    let acceleration = Acceleration {
        x: symmetric(rng, NOISE_AXIS_AMPLITUDE),
        y: symmetric(rng, NOISE_AXIS_AMPLITUDE),
        z: symmetric(rng, NOISE_AXIS_AMPLITUDE),
    };
    let spectrum = synthesize_spectrum(
        rng,
        frequency,
        NOISE_SPECTRUM_AMPLITUDE,
        NOISE_SPECTRUM_SPREAD,
        IDLE_SPECTRUM_NOISE,
    );
    SensorReading::new(now_ms, acceleration, frequency, spectrum, ReadingClass::Noise)
}

/// Commit a reading: refresh the heartbeat and the last-known table entry.
pub fn emit_reading(
    table: &mut ReadingTable,
    heartbeats: &mut Heartbeats,
    id: BuildingId,
    reading: SensorReading,
) {
    heartbeats.beat(id, reading.timestamp_ms);
    table.commit(id, reading);
}

// =============================================================================
// Noise pulses
// =============================================================================

/// Pending noise pulses: building → remaining ticks.
#[derive(Resource, Debug, Clone, Default)]
pub struct NoisePulses {
    remaining: BTreeMap<BuildingId, u32>,
}

impl NoisePulses {
    pub fn start(&mut self, id: BuildingId, ticks: u32) {
        if ticks > 0 {
            self.remaining.insert(id, ticks);
        }
    }

    /// Consume one tick of the building's pulse; `true` if a pulse was active.
    pub fn consume(&mut self, id: BuildingId) -> bool {
        let Some(left) = self.remaining.get_mut(&id) else {
            return false;
        };
        *left -= 1;
        if *left == 0 {
            self.remaining.remove(&id);
        }
        true
    }

    pub fn is_active(&self, id: BuildingId) -> bool {
        self.remaining.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.remaining.clear();
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Idle ticking: one reading per reporting building. Suppressed while an
/// earthquake runs.
#[allow(clippy::too_many_arguments)]
pub fn synthesize_idle_readings(
    params: Res<MonitorParams>,
    clock: Res<SimClock>,
    roster: Res<BuildingRoster>,
    ledger: Res<DamageLedger>,
    silenced: Res<SilencedSensors>,
    mut pulses: ResMut<NoisePulses>,
    mut rng: ResMut<SimRng>,
    mut table: ResMut<ReadingTable>,
    mut heartbeats: ResMut<Heartbeats>,
) {
    let now = clock.now_ms;
    for id in roster.ids() {
        if silenced.contains(id) {
            continue;
        }
        let reading = if pulses.consume(id) {
            noise_pulse_reading(&mut rng.0, now, &params.synth)
        } else {
            let score = ledger.total_score(id).unwrap_or(0);
            idle_reading(&mut rng.0, now, score, &params.synth)
        };
        emit_reading(&mut table, &mut heartbeats, id, reading);
    }
}

pub struct SynthesizerPlugin;

impl Plugin for SynthesizerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ReadingTable>()
            .init_resource::<Heartbeats>()
            .init_resource::<SilencedSensors>()
            .init_resource::<NoisePulses>()
            .add_systems(
                FixedUpdate,
                synthesize_idle_readings
                    .run_if(crate::earthquake::in_idle_phase)
                    .in_set(crate::SimulationSet::Simulation),
            );
    }
}

// =============================================================================
// Tests
// =============================================================================
