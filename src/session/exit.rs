// ABOUTME: Resolves the remote exit code once the attached streams have closed.
// ABOUTME: Polls inspect while the daemon still reports the exec as running.

use super::error::SessionError;
use super::state::{Attached, ExecSession};
use crate::runtime::ExecOps;
use std::time::Duration;
use tokio::time::Instant;

/// Exit status of a remote process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    code: i64,
}

impl ExitStatus {
    pub fn new(code: i64) -> Self {
        Self { code }
    }

    /// Exit code as reported by the daemon.
    pub fn code(&self) -> i64 {
        self.code
    }

    /// Code usable as a local process exit status.
    ///
    /// Codes the OS cannot represent become 255 instead of being truncated.
    pub fn process_code(&self) -> i32 {
        if (0..=255).contains(&self.code) {
            self.code as i32
        } else {
            255
        }
    }
}

/// Reads the exit code of a finished exec.
pub struct ExitResolver<'a, R: ?Sized> {
    runtime: &'a R,
    poll_interval: Duration,
    timeout: Duration,
}

impl<'a, R: ExecOps + ?Sized> ExitResolver<'a, R> {
    pub fn new(runtime: &'a R, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            runtime,
            poll_interval,
            timeout,
        }
    }

    /// Inspect the exec until it reports a final state.
    ///
    /// The stream can close slightly before the daemon records the code, so a
    /// still-running exec is polled until `timeout`.
    pub async fn resolve(
        &self,
        session: &ExecSession<Attached>,
    ) -> Result<ExitStatus, SessionError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let info = self
                .runtime
                .inspect_exec(session.id())
                .await
                .map_err(SessionError::remote("inspect exec"))?;

            if !info.running {
                let status = ExitStatus::new(info.exit_code.unwrap_or(0));
                tracing::debug!(exec = %session.id(), code = status.code(), "exec finished");
                return Ok(status);
            }

            if Instant::now() >= deadline {
                return Err(SessionError::RemoteRequest {
                    operation: "inspect exec",
                    source: crate::runtime::ExecError::Failed(format!(
                        "exec {} still running {:?} after its streams closed",
                        session.id(),
                        self.timeout
                    )),
                });
            }

            tracing::debug!(exec = %session.id(), "exec still running, polling again");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
