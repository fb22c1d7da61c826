//! Implicit Node Silence Detection.
//!
//! A destroyed sensor looks exactly like a network fault. While an earthquake
//! is active, a silent building is inferred collapsed only when enough of its
//! still-reporting neighbours vouch for it. The inference is retracted as soon
//! as the building reports again.
//!
//! Each scan classifies every heartbeat once, up front, and evaluates all
//! decisions against that snapshot before any of them is applied.

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingId, BuildingRoster};
use crate::damage_ledger::DamageLedger;
use crate::earthquake::MonitorPhase;
use crate::params::{ConsensusParams, MonitorParams};
use crate::readings::Heartbeats;
use crate::sim_clock::SimClock;

/// Witnesses that justified each active collapse inference.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsensusEvidence {
    witnesses: BTreeMap<BuildingId, Vec<BuildingId>>,
}

impl ConsensusEvidence {
    pub fn get(&self, id: BuildingId) -> Option<&[BuildingId]> {
        self.witnesses.get(&id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BuildingId, &[BuildingId])> + '_ {
        self.witnesses.iter().map(|(id, w)| (*id, w.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.witnesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.witnesses.is_empty()
    }

    pub fn clear(&mut self) {
        self.witnesses.clear();
    }
}

#[derive(Event, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusEvent {
    Inferred {
        building: BuildingId,
        witnesses: Vec<BuildingId>,
    },
    Retracted {
        building: BuildingId,
    },
}

/// Heartbeat classification at the start of a scan. Buildings that never
/// reported are in neither set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessSnapshot {
    pub active: BTreeSet<BuildingId>,
    pub silent: BTreeSet<BuildingId>,
}

impl LivenessSnapshot {
    pub fn capture(heartbeats: &Heartbeats, now_ms: u64, silence_threshold_ms: u64) -> Self {
        let mut snapshot = Self::default();
        for (id, last_seen) in heartbeats.iter() {
            if now_ms.saturating_sub(last_seen) < silence_threshold_ms {
                snapshot.active.insert(id);
            } else {
                snapshot.silent.insert(id);
            }
        }
        snapshot
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusDecision {
    Infer {
        building: BuildingId,
        witnesses: Vec<BuildingId>,
    },
    Retract {
        building: BuildingId,
    },
}

/// Active buildings other than `target` within the witness radius, in
/// ascending id order.
pub fn find_witnesses(
    roster: &BuildingRoster,
    snapshot: &LivenessSnapshot,
    target: BuildingId,
    radius_km: f64,
) -> Vec<BuildingId> {
    let Some(origin) = roster.get(target) else {
        return Vec::new();
    };
    snapshot
        .active
        .iter()
        .copied()
        .filter(|id| *id != target)
        .filter(|id| {
            roster
                .get(*id)
                .is_some_and(|b| origin.position.distance_km(&b.position) <= radius_km)
        })
        .collect()
}

/// Decide every inference and retraction for one scan without mutating
/// anything.
pub fn evaluate(
    roster: &BuildingRoster,
    ledger: &DamageLedger,
    snapshot: &LivenessSnapshot,
    event_active: bool,
    params: &ConsensusParams,
) -> Vec<ConsensusDecision> {
    let mut decisions = Vec::new();

    if event_active {
        for &id in &snapshot.silent {
            let eligible = ledger.status(id).is_some_and(|s| !s.is_collapsed());
            if !eligible {
                continue;
            }
            let witnesses = find_witnesses(roster, snapshot, id, params.witness_radius_km);
            if witnesses.len() >= params.min_witnesses {
                decisions.push(ConsensusDecision::Infer {
                    building: id,
                    witnesses,
                });
            }
        }
    }

    for id in ledger.inferred() {
        if snapshot.active.contains(&id) {
            decisions.push(ConsensusDecision::Retract { building: id });
        }
    }

    decisions
}

/// Apply decisions to the ledger and evidence table.
pub fn apply_decisions(
    decisions: Vec<ConsensusDecision>,
    ledger: &mut DamageLedger,
    evidence: &mut ConsensusEvidence,
) -> Vec<ConsensusEvent> {
    let mut events = Vec::with_capacity(decisions.len());
    for decision in decisions {
        match decision {
            ConsensusDecision::Infer {
                building,
                witnesses,
            } => {
                if ledger.mark_inferred(building) {
                    evidence.witnesses.insert(building, witnesses.clone());
                    events.push(ConsensusEvent::Inferred {
                        building,
                        witnesses,
                    });
                }
            }
            ConsensusDecision::Retract { building } => {
                ledger.clear_inferred(building);
                evidence.witnesses.remove(&building);
                events.push(ConsensusEvent::Retracted { building });
            }
        }
    }
    events
}

#[allow(clippy::too_many_arguments)]
pub fn detect_silent_buildings(
    params: Res<MonitorParams>,
    clock: Res<SimClock>,
    roster: Res<BuildingRoster>,
    heartbeats: Res<Heartbeats>,
    phase: Res<MonitorPhase>,
    mut ledger: ResMut<DamageLedger>,
    mut evidence: ResMut<ConsensusEvidence>,
    mut events: EventWriter<ConsensusEvent>,
) {
    let snapshot = LivenessSnapshot::capture(
        &heartbeats,
        clock.now_ms,
        params.consensus.silence_threshold_ms,
    );
    let decisions = evaluate(
        &roster,
        &ledger,
        &snapshot,
        phase.is_event_active(),
        &params.consensus,
    );
    if decisions.is_empty() {
        return;
    }

    for event in apply_decisions(decisions, &mut ledger, &mut evidence) {
        match &event {
            ConsensusEvent::Inferred {
                building,
                witnesses,
            } => warn!(
                "Collapse inferred for {building}: silent with {} active witnesses",
                witnesses.len()
            ),
            ConsensusEvent::Retracted { building } => {
                info!("Collapse inference retracted for {building}: heartbeat resumed")
            }
        }
        events.send(event);
    }
}

pub struct ConsensusPlugin;

impl Plugin for ConsensusPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ConsensusEvidence>()
            .add_event::<ConsensusEvent>()
            .add_systems(
                FixedUpdate,
                detect_silent_buildings
                    .after(crate::damage_ledger::merge_earthquake_damage)
                    .in_set(crate::SimulationSet::Simulation),
            );
    }
}
