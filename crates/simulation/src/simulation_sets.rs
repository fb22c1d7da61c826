//! Deterministic tick ordering via `SystemSet` phases.
//!
//! Every monitor system in `FixedUpdate` belongs to one of these sets, which
//! are configured as a chain by [`SimulationPlugin`](crate::SimulationPlugin):
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – Clock advance and command execution (trigger, pulse,
//!   reset). Establishes the phase and the timestamp every later system reads.
//! * **Simulation** – Reading synthesis (idle or event), the event loop,
//!   ledger merge, silence consensus and fatigue tracking. All writes to the
//!   reading table, heartbeats and ledger happen here.
//! * **PostSim** – Publish step and state hash. These only *read* the
//!   committed tick, so every listener observes the same complete snapshot.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Clock advance and queued command execution.
    PreSim,
    /// Synthesis, event loop, ledger merge, consensus, fatigue.
    Simulation,
    /// Listener fan-out and determinism hash.
    PostSim,
}
