// ABOUTME: Exec operations traits for container runtimes.
// ABOUTME: Control calls for exec instances plus the attached stream takeover.

use super::sealed::Sealed;
use super::shared_types::{ExecConfig, ExecCreated, ExecInfo, TtySize};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Exec control calls: create, start detached, resize, inspect.
#[async_trait]
pub trait ExecOps: Sealed + Send + Sync {
    /// Create an exec instance without starting it.
    async fn create_exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecCreated, ExecError>;

    /// Start a created exec instance without attaching to it.
    async fn start_exec_detached(&self, exec_id: &ExecId, tty: bool) -> Result<(), ExecError>;

    /// Resize the TTY of a running exec instance.
    async fn resize_exec(&self, exec_id: &ExecId, size: TtySize) -> Result<(), ExecError>;

    /// Inspect an exec instance for its running state and exit code.
    async fn inspect_exec(&self, exec_id: &ExecId) -> Result<ExecInfo, ExecError>;
}

/// Byte stream usable in both directions after a connection upgrade.
pub trait DuplexStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> DuplexStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// The raw stream left behind once the start call has been upgraded.
pub type HijackedStream = Box<dyn DuplexStream>;

/// Attached start: upgrades the start call into a raw duplex stream.
#[async_trait]
pub trait HijackOps: Sealed + Send + Sync {
    /// Start a created exec instance and take over its connection.
    async fn start_exec_attached(
        &self,
        exec_id: &ExecId,
        tty: bool,
    ) -> Result<HijackedStream, ExecError>;
}

/// Errors from exec operations.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("container not running: {0}")]
    ContainerNotRunning(String),

    #[error("exec instance not found: {0}")]
    ExecNotFound(String),

    #[error("undecodable daemon response: {0}")]
    Decode(String),

    #[error("connection upgrade refused: {0}")]
    UpgradeRefused(String),

    #[error("exec failed: {0}")]
    Failed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
