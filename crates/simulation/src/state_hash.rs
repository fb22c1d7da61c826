//! Deterministic state hashing.
//!
//! Computes a 64-bit hash of the monitor state at the end of every tick and
//! stores it in the `StateHash` resource. Two worlds built from the same seed
//! and fed the same commands produce the same hash sequence. Hashed in order:
//!
//! 1. Tick counter and simulation clock
//! 2. Ledger records and consensus overrides (ascending building id)
//! 3. Heartbeats (ascending building id)
//! 4. SimRng stream position

use std::hash::{Hash, Hasher};

use bevy::prelude::*;

use crate::damage_ledger::DamageLedger;
use crate::readings::Heartbeats;
use crate::sim_clock::SimClock;
use crate::sim_rng::SimRng;
use crate::SimulationSet;
use crate::TickCounter;

#[derive(Resource, Default, Clone, Debug, PartialEq, Eq)]
pub struct StateHash {
    pub tick: u64,
    pub hash: u64,
}

/// FNV-1a; unlike `DefaultHasher` it is not randomly keyed.
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001B3;

    fn new() -> Self {
        Self {
            state: Self::FNV_OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(Self::FNV_PRIME);
        }
    }
}

pub fn compute_state_hash(
    tick: u64,
    now_ms: u64,
    ledger: &DamageLedger,
    heartbeats: &Heartbeats,
    rng_word_pos: u128,
) -> u64 {
    let mut hasher = Fnv1aHasher::new();

    tick.hash(&mut hasher);
    now_ms.hash(&mut hasher);

    for (id, record) in ledger.records() {
        id.hash(&mut hasher);
        record.base_score.hash(&mut hasher);
        record.earthquake_damage.hash(&mut hasher);
        ledger.is_inferred(id).hash(&mut hasher);
    }

    for (id, last_seen) in heartbeats.iter() {
        id.hash(&mut hasher);
        last_seen.hash(&mut hasher);
    }

    rng_word_pos.hash(&mut hasher);

    hasher.finish()
}

fn update_state_hash(
    tick: Res<TickCounter>,
    clock: Res<SimClock>,
    ledger: Res<DamageLedger>,
    heartbeats: Res<Heartbeats>,
    rng: Res<SimRng>,
    mut state_hash: ResMut<StateHash>,
) {
    state_hash.tick = tick.0;
    state_hash.hash = compute_state_hash(
        tick.0,
        clock.now_ms,
        &ledger,
        &heartbeats,
        rng.word_pos(),
    );
}

pub struct StateHashPlugin;

impl Plugin for StateHashPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StateHash>().add_systems(
            FixedUpdate,
            update_state_hash.in_set(SimulationSet::PostSim),
        );
    }
}
