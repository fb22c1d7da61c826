use serde::{Deserialize, Serialize};

use crate::buildings::BuildingId;
use crate::earthquake::EarthquakeConfig;

/// Requests issued to the monitor by display collaborators or automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MonitorCommand {
    TriggerEarthquake(EarthquakeConfig),
    /// Short high-frequency pulse on one building while idle.
    InjectNoisePulse { building: BuildingId },
    /// Clear one building's fatigue history, or every history.
    ResetFatigue { building: Option<BuildingId> },
    /// Fresh base scores; clears every derived state and cancels a running event.
    Reset,
}

impl MonitorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            MonitorCommand::TriggerEarthquake(_) => "trigger_earthquake",
            MonitorCommand::InjectNoisePulse { .. } => "inject_noise_pulse",
            MonitorCommand::ResetFatigue { .. } => "reset_fatigue",
            MonitorCommand::Reset => "reset",
        }
    }
}
