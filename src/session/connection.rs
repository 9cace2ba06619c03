// ABOUTME: Ownership and close-once release of the taken-over daemon connection.
// ABOUTME: The pump owns the stream; everyone else holds a cloneable release handle.

use crate::runtime::HijackedStream;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle to the connection's close-once operation.
///
/// Closing signals the pump to stop and drop the stream. Only the first
/// close has an effect.
#[derive(Debug, Clone)]
pub struct ConnectionCloser {
    closed: Arc<watch::Sender<bool>>,
}

impl ConnectionCloser {
    fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            closed: Arc::new(tx),
        }
    }

    /// Close the connection. Returns true only for the call that closed it.
    pub fn close(&self) -> bool {
        let closed_now = self.closed.send_if_modified(|closed| !std::mem::replace(closed, true));
        if closed_now {
            tracing::debug!("releasing hijacked connection");
        }
        closed_now
    }

    /// Guard that closes the connection when dropped.
    pub fn guard(&self) -> ConnectionGuard {
        ConnectionGuard {
            closer: self.clone(),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

/// Resolves once `flag` is set, or once its sender is gone.
///
/// The borrow `wait_for` yields is dropped here, so callers can hold this
/// future across other awaits in a spawned task.
pub(crate) async fn wait_until_set(flag: &mut watch::Receiver<bool>) {
    let _ = flag.wait_for(|set| *set).await;
}

/// Closes the connection when it goes out of scope, on every path.
#[derive(Debug)]
pub struct ConnectionGuard {
    closer: ConnectionCloser,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.closer.close();
    }
}

/// A daemon connection after the attached start call was upgraded.
pub struct HijackedConnection {
    stream: HijackedStream,
    closer: ConnectionCloser,
}

impl HijackedConnection {
    pub fn new(stream: HijackedStream) -> Self {
        Self {
            stream,
            closer: ConnectionCloser::new(),
        }
    }

    pub fn closer(&self) -> ConnectionCloser {
        self.closer.clone()
    }

    /// Hand the stream to its single owner, tied to a guard releasing it.
    pub(crate) fn into_parts(self) -> (HijackedStream, ConnectionGuard) {
        let guard = self.closer.guard();
        (self.stream, guard)
    }
}
