// ABOUTME: Daemon reachability check.
// ABOUTME: Used once at connect time, before any exec call is made.

use super::sealed::Sealed;
use async_trait::async_trait;

/// Queries about the connected daemon itself.
#[async_trait]
pub trait RuntimeInfo: Sealed + Send + Sync {
    /// Check that the daemon answers on its socket.
    async fn ping(&self) -> Result<(), RuntimeInfoError>;
}

/// Errors from daemon queries.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    #[error("cannot reach daemon at {socket}: {reason}")]
    ConnectionFailed { socket: String, reason: String },
}
