//! Serializable point-in-time snapshot of the monitor for display
//! collaborators (map, charts, panels). Captured on demand from the world.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingId, BuildingRoster, GeoPoint, StructuralType};
use crate::consensus::ConsensusEvidence;
use crate::damage_ledger::{BuildingStatus, DamageLedger, DamageSummary};
use crate::earthquake::MonitorPhase;
use crate::fatigue::FatigueTracker;
use crate::monitor_commands::{CommandOutcome, CommandResultLog, MonitorCommand};
use crate::readings::{Heartbeats, ReadingClass, ReadingTable, SilencedSensors};
use crate::sim_clock::SimClock;
use crate::state_hash::StateHash;
use crate::TickCounter;

/// Number of recent command outcomes carried in an observation.
const RECENT_COMMANDS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorObservation {
    // -- Time ---------------------------------------------------------------
    pub tick: u64,
    pub now_ms: u64,
    pub state_hash: u64,

    // -- Event --------------------------------------------------------------
    pub phase: PhaseSnapshot,

    // -- Ledger -------------------------------------------------------------
    pub summary: DamageSummary,
    pub buildings: Vec<BuildingObservation>,

    // -- Inference ----------------------------------------------------------
    pub silenced: Vec<BuildingId>,
    pub inferred_collapses: Vec<InferredCollapse>,
    pub fatigue_warnings: Vec<BuildingId>,

    pub recent_command_results: Vec<CommandResultEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PhaseSnapshot {
    #[default]
    Idle,
    RunningEvent {
        intensity: f64,
        epicenter: GeoPoint,
        tick: u32,
        total_ticks: u32,
        progress_pct: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingObservation {
    pub id: BuildingId,
    pub name: String,
    pub position: GeoPoint,
    pub structural_type: StructuralType,
    pub total_score: u8,
    pub status: BuildingStatus,
    /// `None` until the sensor first reports.
    pub heartbeat_age_ms: Option<u64>,
    /// Last reading, absent while silenced.
    pub dominant_frequency_hz: Option<f64>,
    pub magnitude: Option<f64>,
    pub classification: Option<ReadingClass>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredCollapse {
    pub building: BuildingId,
    pub witnesses: Vec<BuildingId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResultEntry {
    pub command: MonitorCommand,
    pub outcome: CommandOutcome,
}

impl MonitorObservation {
    pub fn capture(world: &World) -> Self {
        let now_ms = world.resource::<SimClock>().now_ms;
        let roster = world.resource::<BuildingRoster>();
        let ledger = world.resource::<DamageLedger>();
        let table = world.resource::<ReadingTable>();
        let heartbeats = world.resource::<Heartbeats>();

        let phase = match world.resource::<MonitorPhase>().active_run() {
            Some(run) => PhaseSnapshot::RunningEvent {
                intensity: run.config.intensity,
                epicenter: run.config.epicenter,
                tick: run.tick,
                total_ticks: run.total_ticks,
                progress_pct: run.progress() * 100.0,
            },
            None => PhaseSnapshot::Idle,
        };

        let buildings = roster
            .iter()
            .filter_map(|b| {
                let record = ledger.record(b.id)?;
                let status = ledger.status(b.id)?;
                let reading = table.get(b.id);
                Some(BuildingObservation {
                    id: b.id,
                    name: b.name.clone(),
                    position: b.position,
                    structural_type: b.structural_type,
                    total_score: record.total_score,
                    status,
                    heartbeat_age_ms: heartbeats.age_ms(b.id, now_ms),
                    dominant_frequency_hz: reading.map(|r| r.dominant_frequency_hz),
                    magnitude: reading.map(|r| r.magnitude),
                    classification: reading.map(|r| r.classification),
                })
            })
            .collect();

        let inferred_collapses = world
            .resource::<ConsensusEvidence>()
            .iter()
            .map(|(building, witnesses)| InferredCollapse {
                building,
                witnesses: witnesses.to_vec(),
            })
            .collect();

        let recent_command_results = world
            .resource::<CommandResultLog>()
            .last_n(RECENT_COMMANDS)
            .iter()
            .map(|(command, outcome)| CommandResultEntry {
                command: command.clone(),
                outcome: outcome.clone(),
            })
            .collect();

        Self {
            tick: world.resource::<TickCounter>().0,
            now_ms,
            state_hash: world.resource::<StateHash>().hash,
            phase,
            summary: ledger.summary(),
            buildings,
            silenced: world.resource::<SilencedSensors>().0.iter().copied().collect(),
            inferred_collapses,
            fatigue_warnings: world.resource::<FatigueTracker>().warnings().collect(),
            recent_command_results,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
