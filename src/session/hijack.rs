// ABOUTME: Background half of an attached session: take over the connection and pump it.
// ABOUTME: Signals the handshake before any I/O and releases the connection on every exit.

use super::attach::{Endpoints, attach};
use super::connection::{ConnectionCloser, HijackedConnection};
use super::error::SessionError;
use crate::runtime::HijackOps;
use crate::types::ExecId;
use tokio::sync::oneshot;

/// Start the exec attached, announce the connection, then pump until done.
///
/// A failure to obtain the connection is returned from here, so the handshake
/// sender is dropped without a value.
pub async fn hijack<R>(
    runtime: &R,
    exec_id: &ExecId,
    tty: bool,
    endpoints: Endpoints,
    handshake: oneshot::Sender<ConnectionCloser>,
) -> Result<(), SessionError>
where
    R: HijackOps + ?Sized,
{
    tracing::debug!(exec = %exec_id, "waiting for hijack");
    let stream = runtime
        .start_exec_attached(exec_id, tty)
        .await
        .map_err(SessionError::remote("start exec"))?;

    let connection = HijackedConnection::new(stream);
    let closer = connection.closer();
    let released = closer.subscribe();
    let (stream, _guard) = connection.into_parts();

    if handshake.send(closer).is_err() {
        tracing::debug!(exec = %exec_id, "nobody is waiting for the connection");
        return Ok(());
    }

    attach(stream, endpoints, tty, released).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::traits::sealed::Sealed;
    use crate::runtime::{ExecError, HijackedStream};
    use async_trait::async_trait;

    struct Refusing;

    impl Sealed for Refusing {}

    #[async_trait]
    impl HijackOps for Refusing {
        async fn start_exec_attached(
            &self,
            _: &ExecId,
            _: bool,
        ) -> Result<HijackedStream, ExecError> {
            Err(ExecError::ExecNotFound("no such exec".to_string()))
        }
    }

    fn no_endpoints() -> Endpoints {
        Endpoints {
            stdin: None,
            stdout: None,
            stderr: None,
        }
    }

    #[tokio::test]
    async fn refused_start_reports_through_the_result_not_the_handshake() {
        let (tx, rx) = oneshot::channel();
        let err = hijack(&Refusing, &ExecId::new("e1"), false, no_endpoints(), tx)
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::RemoteRequest { .. }));
        assert!(rx.await.is_err());
    }
}
