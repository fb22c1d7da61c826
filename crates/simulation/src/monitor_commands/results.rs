use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buildings::BuildingId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Valid request with no effect in the current state (e.g. a second
    /// trigger while an event runs).
    Ignored(String),
    Rejected(CommandError),
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            CommandOutcome::Ignored(reason) => Some(reason.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandError {
    UnknownBuilding(BuildingId),
    InvalidParameter(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownBuilding(id) => write!(f, "unknown building {id}"),
            CommandError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for CommandError {}
