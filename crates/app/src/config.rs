//! Runner configuration from `SENTINEL_*` environment variables.
//!
//! | Variable                   | Default        |
//! |----------------------------|----------------|
//! | `SENTINEL_SEED`            | OS entropy     |
//! | `SENTINEL_BUILDINGS`       | 80             |
//! | `SENTINEL_QUAKE_AT_TICK`   | 100            |
//! | `SENTINEL_QUAKE_INTENSITY` | 2.0            |
//! | `SENTINEL_QUAKE_MS`        | 3000           |
//! | `SENTINEL_LINGER_TICKS`    | 40             |
//!
//! Unparseable or out-of-range values fall back to the default. The reasons
//! are kept in [`RunnerConfig::ignored`] and logged once logging is up.

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub seed: Option<u64>,
    pub building_count: usize,
    pub quake_at_tick: u64,
    pub quake_intensity: f64,
    pub quake_duration_ms: u64,
    /// Idle ticks to keep running after the event finishes.
    pub linger_ticks: u64,
    /// Variables that were set but not usable.
    pub ignored: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            building_count: 80,
            quake_at_tick: 100,
            quake_intensity: 2.0,
            quake_duration_ms: 3000,
            linger_ticks: 40,
            ignored: Vec::new(),
        }
    }
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let mut env = EnvReader {
            lookup: &lookup,
            ignored: Vec::new(),
        };
        if let Some(seed) = env.read("SENTINEL_SEED", |_: &u64| true) {
            config.seed = Some(seed);
        }
        if let Some(count) = env.read("SENTINEL_BUILDINGS", |_: &usize| true) {
            config.building_count = count;
        }
        if let Some(tick) = env.read("SENTINEL_QUAKE_AT_TICK", |_: &u64| true) {
            config.quake_at_tick = tick;
        }
        if let Some(intensity) =
            env.read("SENTINEL_QUAKE_INTENSITY", |v: &f64| v.is_finite() && *v > 0.0)
        {
            config.quake_intensity = intensity;
        }
        if let Some(ms) = env.read("SENTINEL_QUAKE_MS", |v: &u64| *v > 0) {
            config.quake_duration_ms = ms;
        }
        if let Some(ticks) = env.read("SENTINEL_LINGER_TICKS", |_: &u64| true) {
            config.linger_ticks = ticks;
        }
        config.ignored = env.ignored;
        config
    }
}

struct EnvReader<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
    ignored: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<'_, F> {
    fn read<T: FromStr>(&mut self, key: &str, valid: impl Fn(&T) -> bool) -> Option<T> {
        let raw = (self.lookup)(key)?;
        match raw.trim().parse() {
            Ok(value) if valid(&value) => Some(value),
            _ => {
                self.ignored
                    .push(format!("ignoring {key}={raw:?}: not a valid value"));
                None
            }
        }
    }
}
