pub mod commands;
pub mod executor;
pub mod plugin;
pub mod queue;
pub mod result_log;
pub mod results;

pub use commands::*;
pub use executor::{execute_queued_commands, execute_single};
pub use plugin::MonitorCommandsPlugin;
pub use queue::*;
pub use result_log::CommandResultLog;
pub use results::*;
