//! Baseline / fatigue tracker.
//!
//! Keeps a rolling window of resting (idle) dominant frequencies per building.
//! The baseline is fixed once from the median of the earliest samples. A
//! fatigue warning needs a steady downward trend: negative slope past the
//! threshold *and* a regression fit good enough to rule out noise.

use std::collections::{BTreeMap, VecDeque};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buildings::BuildingId;
use crate::params::{FatigueParams, MonitorParams};
use crate::readings::{ReadingClass, ReadingTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueIndicator {
    /// Hz per sample over the current window.
    pub trend_slope: f64,
    /// `None` until enough samples were collected.
    pub baseline_frequency_hz: Option<f64>,
    pub current_frequency_hz: f64,
    /// Signed deviation of the current frequency from the baseline.
    pub deviation_pct: f64,
    pub sample_count: usize,
    /// R² of the trend fit, in [0, 1].
    pub trend_confidence: f64,
    pub has_warning: bool,
}

impl FatigueIndicator {
    /// Indicator of a building that has not reported yet.
    pub fn empty() -> Self {
        Self {
            trend_slope: 0.0,
            baseline_frequency_hz: None,
            current_frequency_hz: 0.0,
            deviation_pct: 0.0,
            sample_count: 0,
            trend_confidence: 0.0,
            has_warning: false,
        }
    }
}

/// Ordinary least squares fit of value against sample index.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Trend {
    pub slope: f64,
    pub r_squared: f64,
}

/// Degenerate input (fewer than two points, flat series) yields a zero trend.
pub fn linear_trend(samples: &[f64]) -> Trend {
    let n = samples.len();
    if n < 2 {
        return Trend::default();
    }
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = samples.iter().sum::<f64>() / nf;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (i, y) in samples.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= f64::EPSILON {
        return Trend::default();
    }
    Trend {
        slope: sxy / sxx,
        r_squared: ((sxy * sxy) / (sxx * syy)).clamp(0.0, 1.0),
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Rolling window of one building's resting frequency.
#[derive(Debug, Clone, Default)]
pub struct FrequencyHistory {
    samples: VecDeque<f64>,
    baseline: Option<f64>,
    latest: Option<FatigueIndicator>,
}

impl FrequencyHistory {
    pub fn push(&mut self, frequency_hz: f64, params: &FatigueParams) -> &FatigueIndicator {
        self.samples.push_back(frequency_hz);
        while self.samples.len() > params.window_capacity.max(1) {
            self.samples.pop_front();
        }

        if self.baseline.is_none() && self.samples.len() >= params.baseline_span.max(1) {
            let span: Vec<f64> = self.samples.iter().take(params.baseline_span.max(1)).copied().collect();
            self.baseline = median(&span);
        }

        let trend = if self.samples.len() >= params.min_samples {
            linear_trend(self.samples.make_contiguous())
        } else {
            Trend::default()
        };
        let deviation_pct = match self.baseline {
            Some(base) if base > 0.0 => (frequency_hz - base) / base * 100.0,
            _ => 0.0,
        };

        self.latest.insert(FatigueIndicator {
            trend_slope: trend.slope,
            baseline_frequency_hz: self.baseline,
            current_frequency_hz: frequency_hz,
            deviation_pct,
            sample_count: self.samples.len(),
            trend_confidence: trend.r_squared,
            has_warning: self.samples.len() >= params.min_samples
                && trend.slope < params.slope_threshold
                && trend.r_squared > params.min_confidence,
        })
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn indicator(&self) -> Option<&FatigueIndicator> {
        self.latest.as_ref()
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct FatigueTracker {
    histories: BTreeMap<BuildingId, FrequencyHistory>,
}

impl FatigueTracker {
    pub fn record(
        &mut self,
        id: BuildingId,
        frequency_hz: f64,
        params: &FatigueParams,
    ) -> &FatigueIndicator {
        self.histories.entry(id).or_default().push(frequency_hz, params)
    }

    pub fn indicator(&self, id: BuildingId) -> Option<&FatigueIndicator> {
        self.histories.get(&id).and_then(FrequencyHistory::indicator)
    }

    pub fn history(&self, id: BuildingId) -> Option<&FrequencyHistory> {
        self.histories.get(&id)
    }

    /// Buildings currently flagged.
    pub fn warnings(&self) -> impl Iterator<Item = BuildingId> + '_ {
        self.histories
            .iter()
            .filter(|(_, h)| h.indicator().is_some_and(|i| i.has_warning))
            .map(|(id, _)| *id)
    }

    /// Clear one building's history, or all of them.
    pub fn reset(&mut self, id: Option<BuildingId>) {
        match id {
            Some(id) => {
                self.histories.remove(&id);
            }
            None => self.histories.clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

/// Feed this tick's resting readings into the tracker.
pub fn track_fatigue(
    params: Res<MonitorParams>,
    table: Res<ReadingTable>,
    mut tracker: ResMut<FatigueTracker>,
) {
    for &id in table.updated() {
        let Some(reading) = table.get(id) else {
            continue;
        };
        if reading.classification != ReadingClass::Idle {
            continue;
        }
        let was_warning = tracker.indicator(id).is_some_and(|i| i.has_warning);
        let indicator = tracker.record(id, reading.dominant_frequency_hz, &params.fatigue);
        if indicator.has_warning && !was_warning {
            warn!(
                "Fatigue warning for {id}: slope {:.4} Hz/sample, R² {:.2}, deviation {:.1}%",
                indicator.trend_slope, indicator.trend_confidence, indicator.deviation_pct,
            );
        }
    }
}

pub struct FatiguePlugin;

impl Plugin for FatiguePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FatigueTracker>().add_systems(
            FixedUpdate,
            track_fatigue
                .after(crate::earthquake::advance_earthquake)
                .in_set(crate::SimulationSet::Simulation),
        );
    }
}
