// ABOUTME: Control calls that create and start exec instances.
// ABOUTME: Passes daemon warnings through to the user's error stream.

use super::error::SessionError;
use super::request::ExecRequest;
use super::state::{Created, ExecSession, Started};
use crate::runtime::ExecOps;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Issues the exec control calls of a session.
pub struct SessionClient<'a, R: ?Sized> {
    runtime: &'a R,
}

impl<'a, R: ExecOps + ?Sized> SessionClient<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Create the exec instance and write each daemon warning to `warnings_to`.
    ///
    /// Returns `None` when the daemon answered with an empty id: there is
    /// nothing to start.
    pub async fn create<W>(
        &self,
        request: &ExecRequest,
        warnings_to: &mut W,
    ) -> Result<Option<ExecSession<Created>>, SessionError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let created = self
            .runtime
            .create_exec(request.container(), &request.to_exec_config())
            .await
            .map_err(SessionError::remote("create exec"))?;

        for warning in &created.warnings {
            let line = format!("WARNING: {warning}\n");
            if let Err(e) = warnings_to.write_all(line.as_bytes()).await {
                tracing::debug!("failed to print daemon warning: {}", e);
            }
        }
        if !created.warnings.is_empty()
            && let Err(e) = warnings_to.flush().await
        {
            tracing::debug!("failed to flush daemon warnings: {}", e);
        }

        if created.id.is_empty() {
            return Ok(None);
        }

        tracing::debug!(exec = %created.id, container = %request.container(), "exec created");
        Ok(Some(ExecSession::new(created.id, request.tty)))
    }

    /// Start the exec without attaching to it.
    pub async fn start_detached(
        &self,
        session: ExecSession<Created>,
    ) -> Result<ExecSession<Started>, SessionError> {
        self.runtime
            .start_exec_detached(session.id(), session.tty())
            .await
            .map_err(SessionError::remote("start exec"))?;
        tracing::debug!(exec = %session.id(), "exec started detached");
        Ok(session.start())
    }
}
