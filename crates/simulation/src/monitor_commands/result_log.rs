//! Ring-buffer log of recently executed monitor commands and their outcomes.

use bevy::prelude::*;

use super::{CommandOutcome, MonitorCommand};

const MAX_ENTRIES: usize = 64;

#[derive(Resource, Debug, Clone, Default)]
pub struct CommandResultLog {
    entries: Vec<(MonitorCommand, CommandOutcome)>,
}

impl CommandResultLog {
    /// Record a command/outcome pair, evicting the oldest entry when full.
    pub fn push(&mut self, command: MonitorCommand, outcome: CommandOutcome) {
        if self.entries.len() >= MAX_ENTRIES {
            self.entries.remove(0);
        }
        self.entries.push((command, outcome));
    }

    pub fn last_n(&self, n: usize) -> &[(MonitorCommand, CommandOutcome)] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn latest(&self) -> Option<&(MonitorCommand, CommandOutcome)> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
