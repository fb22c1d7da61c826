use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::MonitorCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandSource {
    Operator,
    Automation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub tick: u64,
    pub source: CommandSource,
    pub command: MonitorCommand,
}

/// Commands waiting for the next tick. Drained in FIFO order.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct MonitorCommandQueue {
    pending: Vec<QueuedCommand>,
}

impl MonitorCommandQueue {
    pub fn push(&mut self, tick: u64, source: CommandSource, command: MonitorCommand) {
        self.pending.push(QueuedCommand {
            tick,
            source,
            command,
        });
    }

    pub fn drain(&mut self) -> Vec<QueuedCommand> {
        self.pending.drain(..).collect()
    }

    /// Remove every pending earthquake trigger, keeping the other commands
    /// in order.
    pub fn take_triggers(&mut self) -> Vec<QueuedCommand> {
        let (triggers, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|entry| matches!(entry.command, MonitorCommand::TriggerEarthquake(_)));
        self.pending = rest;
        triggers
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
