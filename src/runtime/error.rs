// ABOUTME: Runtime error types with SNAFU pattern.
// ABOUTME: Unifies socket detection and daemon connection errors for programmatic handling.

use snafu::Snafu;

use super::detection::DetectionError;
use super::traits::RuntimeInfoError;
use crate::config::SOCKET_ENV;

/// Unified runtime error for detection and connection failures.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("runtime connection failed: {source}"))]
    Connection { source: RuntimeInfoError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No container runtime socket found on the system.
    NoRuntimeFound,
    /// A socket was configured but is missing.
    SocketNotFound,
    /// The daemon did not answer on its socket.
    ConnectionFailed,
}

impl RuntimeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection { source } => match source {
                DetectionError::NoRuntimeFound => RuntimeErrorKind::NoRuntimeFound,
                DetectionError::SocketNotFound(_) => RuntimeErrorKind::SocketNotFound,
            },
            RuntimeError::Connection { source } => match source {
                RuntimeInfoError::ConnectionFailed { .. } => RuntimeErrorKind::ConnectionFailed,
            },
        }
    }

    /// Socket path of a failed connection attempt.
    pub fn unreachable_socket(&self) -> Option<&str> {
        match self {
            RuntimeError::Connection {
                source: RuntimeInfoError::ConnectionFailed { socket, .. },
            } => Some(socket),
            _ => None,
        }
    }

    /// What the user can do about it.
    pub fn hint(&self) -> String {
        match self.kind() {
            RuntimeErrorKind::NoRuntimeFound => format!(
                "start Docker or Podman, or point {SOCKET_ENV} or --socket at its socket"
            ),
            RuntimeErrorKind::SocketNotFound => {
                format!("check the socket given via --socket, {SOCKET_ENV} or the config file")
            }
            RuntimeErrorKind::ConnectionFailed => match self.unreachable_socket() {
                Some(socket) => format!("is the daemon running and listening on {socket}?"),
                None => "is the daemon running?".to_string(),
            },
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

impl From<RuntimeInfoError> for RuntimeError {
    fn from(source: RuntimeInfoError) -> Self {
        RuntimeError::Connection { source }
    }
}
