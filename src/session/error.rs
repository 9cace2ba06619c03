// ABOUTME: Error types for exec sessions.
// ABOUTME: Remote request failures, TTY input misuse and transport failures.

use super::request::RequestError;
use crate::runtime::ExecError;

/// Terminal failures of an exec session.
///
/// A remote process exiting non-zero is not an error; it is reported through
/// [`SessionOutcome`](super::SessionOutcome).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    #[error("{operation} failed: {source}")]
    RemoteRequest {
        operation: &'static str,
        #[source]
        source: ExecError,
    },

    #[error("the input device is not a TTY")]
    TtyInput,

    #[error("stream error: {0}")]
    TransportStream(#[source] std::io::Error),
}

impl SessionError {
    pub(crate) fn remote(operation: &'static str) -> impl FnOnce(ExecError) -> Self {
        move |source| Self::RemoteRequest { operation, source }
    }

    pub(crate) fn task(message: impl Into<String>) -> Self {
        Self::TransportStream(std::io::Error::other(message.into()))
    }
}
