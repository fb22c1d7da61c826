//! Authoritative per-building damage.
//!
//! The ledger is the only owner of [`DamageRecord`]s. Records change in two
//! ways: an earthquake's damage map is merged when the event finishes, or the
//! whole ledger is reset with fresh base scores. Status is never stored; it is
//! derived from the total score plus the consensus override.

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buildings::{BuildingId, BuildingRoster};
use crate::earthquake::{DamageMap, EarthquakeUpdate};
use crate::params::PopulationParams;

const MAX_SCORE: u8 = 100;

/// Number of leading buildings that receive the elevated base score range.
const ELEVATED_BUILDINGS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRecord {
    /// Initial deficiency assigned at reset.
    pub base_score: u8,
    /// Accumulated event damage. Never decreases except on reset.
    pub earthquake_damage: u32,
    /// `min(100, base_score + earthquake_damage)`.
    pub total_score: u8,
}

impl DamageRecord {
    pub fn new(base_score: u8) -> Self {
        let mut record = Self {
            base_score: base_score.min(MAX_SCORE),
            earthquake_damage: 0,
            total_score: 0,
        };
        record.recompute();
        record
    }

    pub fn apply(&mut self, delta: u32) {
        self.earthquake_damage = self.earthquake_damage.saturating_add(delta);
        self.recompute();
    }

    fn recompute(&mut self) {
        let total = u32::from(self.base_score).saturating_add(self.earthquake_damage);
        self.total_score = total.min(u32::from(MAX_SCORE)) as u8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingStatus {
    Stable,
    Anomaly,
    Warning,
    Critical,
    Collapse,
    /// Set only by silence consensus; distinct from a score-derived collapse.
    CollapseInferred,
}

impl BuildingStatus {
    pub fn from_score(total_score: u8) -> Self {
        match total_score {
            90.. => BuildingStatus::Collapse,
            70.. => BuildingStatus::Critical,
            30.. => BuildingStatus::Warning,
            15.. => BuildingStatus::Anomaly,
            _ => BuildingStatus::Stable,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuildingStatus::Stable => "stable",
            BuildingStatus::Anomaly => "anomaly",
            BuildingStatus::Warning => "warning",
            BuildingStatus::Critical => "critical",
            BuildingStatus::Collapse => "collapse",
            BuildingStatus::CollapseInferred => "collapse_inferred",
        }
    }

    pub fn is_collapsed(self) -> bool {
        matches!(
            self,
            BuildingStatus::Collapse | BuildingStatus::CollapseInferred
        )
    }
}

/// Building counts per display bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageSummary {
    /// stable + anomaly
    pub safe: usize,
    /// warning
    pub damaged: usize,
    pub critical: usize,
    /// collapse + collapse_inferred
    pub collapsed: usize,
}

impl DamageSummary {
    pub fn total(&self) -> usize {
        self.safe + self.damaged + self.critical + self.collapsed
    }

    fn count(&mut self, status: BuildingStatus) {
        match status {
            BuildingStatus::Stable | BuildingStatus::Anomaly => self.safe += 1,
            BuildingStatus::Warning => self.damaged += 1,
            BuildingStatus::Critical => self.critical += 1,
            BuildingStatus::Collapse | BuildingStatus::CollapseInferred => self.collapsed += 1,
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct DamageLedger {
    records: BTreeMap<BuildingId, DamageRecord>,
    /// Buildings currently under the consensus collapse override.
    inferred: BTreeSet<BuildingId>,
    revision: u64,
}

impl DamageLedger {
    pub fn record(&self, id: BuildingId) -> Option<&DamageRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = (BuildingId, &DamageRecord)> + '_ {
        self.records.iter().map(|(id, r)| (*id, r))
    }

    pub fn total_score(&self, id: BuildingId) -> Option<u8> {
        self.records.get(&id).map(|r| r.total_score)
    }

    /// Displayed status: the consensus override wins while it is active.
    pub fn status(&self, id: BuildingId) -> Option<BuildingStatus> {
        let record = self.records.get(&id)?;
        if self.inferred.contains(&id) {
            Some(BuildingStatus::CollapseInferred)
        } else {
            Some(BuildingStatus::from_score(record.total_score))
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bumped on every change; the publish step compares against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merge one event's damage. Unknown ids are ignored. Returns the number
    /// of records touched.
    pub fn apply_damage(&mut self, deltas: &DamageMap) -> usize {
        let mut applied = 0;
        for (id, delta) in deltas {
            if let Some(record) = self.records.get_mut(id) {
                record.apply(*delta);
                applied += 1;
            }
        }
        if applied > 0 {
            self.revision += 1;
        }
        applied
    }

    /// Fresh base scores for every building in the roster; clears event
    /// damage and consensus overrides.
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        roster: &BuildingRoster,
        params: &PopulationParams,
        rng: &mut R,
    ) {
        self.records.clear();
        self.inferred.clear();
        for (idx, id) in roster.ids().enumerate() {
            let (lo, hi) = if idx < ELEVATED_BUILDINGS {
                params.elevated_base_range
            } else {
                params.normal_base_range
            };
            let base = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
            self.records.insert(id, DamageRecord::new(base));
        }
        self.revision += 1;
    }

    pub fn is_inferred(&self, id: BuildingId) -> bool {
        self.inferred.contains(&id)
    }

    pub fn inferred(&self) -> impl Iterator<Item = BuildingId> + '_ {
        self.inferred.iter().copied()
    }

    /// Set the consensus override. Returns `false` for unknown ids or if the
    /// override was already set.
    pub fn mark_inferred(&mut self, id: BuildingId) -> bool {
        if !self.records.contains_key(&id) || !self.inferred.insert(id) {
            return false;
        }
        self.revision += 1;
        true
    }

    pub fn clear_inferred(&mut self, id: BuildingId) -> bool {
        if !self.inferred.remove(&id) {
            return false;
        }
        self.revision += 1;
        true
    }

    pub fn summary(&self) -> DamageSummary {
        let mut summary = DamageSummary::default();
        for id in self.records.keys() {
            if let Some(status) = self.status(*id) {
                summary.count(status);
            }
        }
        summary
    }
}

/// Merge a finished earthquake's damage map into the ledger.
pub fn merge_earthquake_damage(
    mut updates: EventReader<EarthquakeUpdate>,
    mut ledger: ResMut<DamageLedger>,
) {
    for update in updates.read() {
        if let EarthquakeUpdate::Finished { damage, .. } = update {
            let applied = ledger.apply_damage(damage);
            let summary = ledger.summary();
            info!(
                "Damage merged into {applied} records: safe={} damaged={} critical={} collapsed={}",
                summary.safe, summary.damaged, summary.critical, summary.collapsed,
            );
        }
    }
}

pub struct DamageLedgerPlugin;

impl Plugin for DamageLedgerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DamageLedger>().add_systems(
            FixedUpdate,
            merge_earthquake_damage
                .after(crate::earthquake::advance_earthquake)
                .in_set(crate::SimulationSet::Simulation),
        );
    }
}
