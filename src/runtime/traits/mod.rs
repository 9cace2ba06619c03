// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ExecOps, HijackOps and RuntimeInfo.

mod exec;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;

pub use exec::{DuplexStream, ExecError, ExecOps, HijackOps, HijackedStream};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
pub use shared_types::*;

/// Everything an interactive exec session needs from a runtime.
pub trait ExecRuntime: ExecOps + HijackOps {}

impl<T> ExecRuntime for T where T: ExecOps + HijackOps {}
