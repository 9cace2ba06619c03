// ABOUTME: Command module aggregator for the hatch CLI.
// ABOUTME: Re-exports the exec command handler.

mod exec;

pub use exec::{RuntimeOverrides, exec_command};
