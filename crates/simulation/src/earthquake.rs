use std::collections::BTreeMap;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingId, BuildingRoster, GeoPoint, StructuralType};
use crate::damage_ledger::DamageLedger;
use crate::monitor_commands::{CommandError, CommandOutcome};
use crate::params::{DamageParams, MonitorParams};
use crate::readings::{Heartbeats, ReadingTable, SilencedSensors};
use crate::sim_clock::SimClock;
use crate::sim_rng::SimRng;
use crate::synthesizer::{
    emit_reading, envelope, event_distance_factor, idle_reading, seismic_reading, Shaking,
};

/// Per-building damage contributed by one event.
pub type DamageMap = BTreeMap<BuildingId, u32>;

const MAX_EVENT_DAMAGE: f64 = 100.0;

// =============================================================================
// Types
// =============================================================================

/// Caller-supplied description of one earthquake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeConfig {
    /// Relative strength, must be positive.
    pub intensity: f64,
    pub duration_ms: u64,
    pub epicenter: GeoPoint,
}

impl EarthquakeConfig {
    pub fn validate(&self) -> Result<(), CommandError> {
        if !self.intensity.is_finite() || self.intensity <= 0.0 {
            return Err(CommandError::InvalidParameter(format!(
                "intensity must be positive, got {}",
                self.intensity
            )));
        }
        if self.duration_ms == 0 {
            return Err(CommandError::InvalidParameter(
                "duration must be non-zero".to_string(),
            ));
        }
        if !self.epicenter.lat.is_finite() || !self.epicenter.lng.is_finite() {
            return Err(CommandError::InvalidParameter(
                "epicenter must be a finite position".to_string(),
            ));
        }
        Ok(())
    }

    /// `max(1, duration / tick_interval)`.
    pub fn total_ticks(&self, tick_interval_ms: u64) -> u32 {
        let ticks = self.duration_ms / tick_interval_ms.max(1);
        ticks.clamp(1, u64::from(u32::MAX)) as u32
    }
}

/// State of the event currently being played out.
#[derive(Debug, Clone, PartialEq)]
pub struct EarthquakeRun {
    pub config: EarthquakeConfig,
    /// Ticks completed so far.
    pub tick: u32,
    pub total_ticks: u32,
    /// Damage computed at trigger time; merged into the ledger on completion.
    pub damage: DamageMap,
    /// Event-mode amplitude attenuation per building.
    pub shaking_factors: BTreeMap<BuildingId, f64>,
    /// Sensors lost during this event, in order of loss.
    pub silenced: Vec<BuildingId>,
}

impl EarthquakeRun {
    /// Compute the damage map and per-building shaking for a new event.
    pub fn plan<R: Rng + ?Sized>(
        config: EarthquakeConfig,
        roster: &BuildingRoster,
        ledger: &DamageLedger,
        params: &MonitorParams,
        rng: &mut R,
    ) -> Self {
        let damage = compute_event_damage(rng, roster, ledger, &config, &params.damage);
        let shaking_factors = roster
            .iter()
            .map(|b| {
                let km = b.position.distance_km(&config.epicenter);
                (b.id, event_distance_factor(km, &params.synth))
            })
            .collect();
        Self {
            total_ticks: config.total_ticks(params.tick_interval_ms),
            config,
            tick: 0,
            damage,
            shaking_factors,
            silenced: Vec::new(),
        }
    }

    pub fn progress(&self) -> f64 {
        f64::from(self.tick) / f64::from(self.total_ticks.max(1))
    }

    pub fn is_final_tick(&self) -> bool {
        self.tick >= self.total_ticks
    }
}

/// Single state machine gating idle ticking against event ticking.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub enum MonitorPhase {
    #[default]
    Idle,
    RunningEvent(EarthquakeRun),
}

impl MonitorPhase {
    pub fn is_event_active(&self) -> bool {
        matches!(self, MonitorPhase::RunningEvent(_))
    }

    pub fn active_run(&self) -> Option<&EarthquakeRun> {
        match self {
            MonitorPhase::RunningEvent(run) => Some(run),
            MonitorPhase::Idle => None,
        }
    }
}

pub fn in_idle_phase(phase: Res<MonitorPhase>) -> bool {
    !phase.is_event_active()
}

pub fn in_event_phase(phase: Res<MonitorPhase>) -> bool {
    phase.is_event_active()
}

/// Progress stream of one earthquake: one `Progress` per tick, then exactly
/// one `Finished`.
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EarthquakeUpdate {
    Progress { tick: u32, progress_pct: f64 },
    Finished {
        damage: DamageMap,
        silenced: Vec<BuildingId>,
    },
}

// =============================================================================
// Damage model
// =============================================================================

/// Damage attenuation with distance: `max(floor, 1 - km * k)`.
pub fn damage_distance_factor(distance_km: f64, params: &DamageParams) -> f64 {
    (1.0 - distance_km * params.distance_decay_per_km).max(params.min_distance_factor)
}

pub fn vulnerability(building: &Building, params: &DamageParams) -> f64 {
    let material = match building.structural_type {
        StructuralType::Masonry => params.masonry_factor,
        StructuralType::Timber => params.timber_factor,
        StructuralType::ReinforcedConcrete | StructuralType::Steel => 1.0,
    };
    let age = if building.year_built < params.old_construction_year {
        params.old_construction_factor
    } else {
        1.0
    };
    let height = if building.floors > params.tall_floor_threshold {
        params.tall_building_factor
    } else {
        1.0
    };
    material * age * height
}

/// Damage delta of one event for every building that has a ledger record.
/// The result is reported, not merged.
pub fn compute_event_damage<R: Rng + ?Sized>(
    rng: &mut R,
    roster: &BuildingRoster,
    ledger: &DamageLedger,
    config: &EarthquakeConfig,
    params: &DamageParams,
) -> DamageMap {
    let (lo, hi) = params.jitter;
    roster
        .iter()
        .filter(|b| ledger.record(b.id).is_some())
        .map(|b| {
            let distance = damage_distance_factor(b.position.distance_km(&config.epicenter), params);
            let jitter = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
            let raw = config.intensity * params.scale * distance * vulnerability(b, params) * jitter;
            (b.id, raw.round().clamp(0.0, MAX_EVENT_DAMAGE) as u32)
        })
        .collect()
}

// =============================================================================
// Trigger
// =============================================================================

/// Start an earthquake. Shared by the command executor and the engine facade.
pub fn begin_earthquake(world: &mut World, config: EarthquakeConfig) -> CommandOutcome {
    if let Err(err) = config.validate() {
        warn!("Earthquake rejected: {err}");
        return CommandOutcome::Rejected(err);
    }
    if world.resource::<MonitorPhase>().is_event_active() {
        info!("Earthquake trigger ignored: an event is already running");
        return CommandOutcome::Ignored("earthquake already in progress".to_string());
    }

    let run = world.resource_scope(|world, mut rng: Mut<SimRng>| {
        EarthquakeRun::plan(
            config,
            world.resource::<BuildingRoster>(),
            world.resource::<DamageLedger>(),
            world.resource::<MonitorParams>(),
            &mut rng.0,
        )
    });

    info!(
        "EARTHQUAKE: intensity {:.1} at ({:.4}, {:.4}) for {} ticks, {} buildings affected",
        run.config.intensity,
        run.config.epicenter.lat,
        run.config.epicenter.lng,
        run.total_ticks,
        run.damage.len(),
    );
    *world.resource_mut::<MonitorPhase>() = MonitorPhase::RunningEvent(run);
    CommandOutcome::Applied
}

// =============================================================================
// Systems
// =============================================================================

/// Event tick: shaking readings for every reporting building, sensor loss
/// during the violent phase, and on the final tick a return to idle readings
/// and the damage report.
#[allow(clippy::too_many_arguments)]
pub fn advance_earthquake(
    params: Res<MonitorParams>,
    clock: Res<SimClock>,
    roster: Res<BuildingRoster>,
    ledger: Res<DamageLedger>,
    mut phase: ResMut<MonitorPhase>,
    mut silenced: ResMut<SilencedSensors>,
    mut rng: ResMut<SimRng>,
    mut table: ResMut<ReadingTable>,
    mut heartbeats: ResMut<Heartbeats>,
    mut updates: EventWriter<EarthquakeUpdate>,
) {
    let MonitorPhase::RunningEvent(run) = &mut *phase else {
        return;
    };
    run.tick += 1;
    let now = clock.now_ms;
    let progress = run.progress();

    if run.is_final_tick() {
        for id in roster.ids() {
            if silenced.contains(id) {
                continue;
            }
            let score = ledger.total_score(id).unwrap_or(0);
            let reading = idle_reading(&mut rng.0, now, score, &params.synth);
            emit_reading(&mut table, &mut heartbeats, id, reading);
        }
        updates.send(EarthquakeUpdate::Progress {
            tick: run.tick,
            progress_pct: 100.0,
        });
        info!(
            "Earthquake finished after {} ticks: {} buildings damaged, {} sensors lost",
            run.tick,
            run.damage.values().filter(|d| **d > 0).count(),
            run.silenced.len(),
        );
        updates.send(EarthquakeUpdate::Finished {
            damage: std::mem::take(&mut run.damage),
            silenced: std::mem::take(&mut run.silenced),
        });
        *phase = MonitorPhase::Idle;
        return;
    }

    let level = envelope(progress);
    for id in roster.ids() {
        if silenced.contains(id) {
            continue;
        }
        let shaking = Shaking {
            intensity: run.config.intensity,
            envelope: level,
            distance_factor: run.shaking_factors.get(&id).copied().unwrap_or(0.0),
        };
        let reading = seismic_reading(&mut rng.0, now, shaking, &params.synth);
        emit_reading(&mut table, &mut heartbeats, id, reading);
    }

    if level > params.damage.violent_envelope {
        let threshold = u32::from(params.damage.destruction_threshold);
        let p_loss = params.damage.sensor_loss_probability.clamp(0.0, 1.0);
        for (&id, &delta) in &run.damage {
            if silenced.contains(id) {
                continue;
            }
            let projected = u32::from(ledger.total_score(id).unwrap_or(0)) + delta;
            if projected >= threshold && rng.0.gen_bool(p_loss) {
                silenced.insert(id);
                table.remove(id);
                run.silenced.push(id);
                warn!("Sensor lost: {id} (projected score {projected})");
            }
        }
    }

    updates.send(EarthquakeUpdate::Progress {
        tick: run.tick,
        progress_pct: progress * 100.0,
    });
}

pub struct EarthquakePlugin;

impl Plugin for EarthquakePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MonitorPhase>()
            .add_event::<EarthquakeUpdate>()
            .add_systems(
                FixedUpdate,
                advance_earthquake
                    .run_if(in_event_phase)
                    .after(crate::synthesizer::synthesize_idle_readings)
                    .in_set(crate::SimulationSet::Simulation),
            );
    }
}

// =============================================================================
// Tests
// =============================================================================
