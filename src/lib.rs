// ABOUTME: Library root for hatch - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod runtime;
pub mod session;
pub mod terminal;
pub mod types;
