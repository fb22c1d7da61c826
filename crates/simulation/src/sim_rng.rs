//! Injected simulation RNG resource.
//!
//! Wraps `ChaCha8Rng` so every random choice in the monitor (base scores,
//! reading noise, damage jitter, sensor-loss coin flips) flows through one
//! seedable source. Tests insert `SimRng::from_seed_u64` before adding the
//! `SimulationPlugin`; the default is seeded from OS entropy.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Randomness source for all monitor systems.
///
/// Systems take `ResMut<SimRng>` and use `rng.0` (a `ChaCha8Rng`
/// implementing `rand::Rng`).
#[derive(Resource)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl SimRng {
    /// Create a deterministic `SimRng` seeded from the given `u64` value.
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Create a non-deterministic `SimRng` seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }

    /// Position of the underlying stream, used by the state hash.
    pub fn word_pos(&self) -> u128 {
        self.0.get_word_pos()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
