// ABOUTME: Interactive exec sessions: create, start, attach, resize and exit resolution.
// ABOUTME: The coordinator ties the pieces together for one command run.

mod attach;
mod client;
mod connection;
mod coordinator;
mod error;
mod exit;
pub mod frame;
mod hijack;
mod request;
mod resize;
mod state;

#[cfg(test)]
mod testing;

pub use attach::{Endpoints, attach};
pub use client::SessionClient;
pub use connection::{ConnectionCloser, ConnectionGuard, HijackedConnection};
pub use coordinator::{EMPTY_ID_MESSAGE, SessionCoordinator, SessionOptions, SessionOutcome};
pub use error::SessionError;
pub use exit::{ExitResolver, ExitStatus};
pub use hijack::hijack;
pub use request::{ExecRequest, RequestError};
pub use resize::{ResizeMonitor, ResizeTrigger};
pub use state::{Attached, Created, ExecSession, Finished, Started};
