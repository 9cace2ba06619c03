// ABOUTME: Type-state model of an exec session's lifecycle.
// ABOUTME: Created, Started, Attached and Finished; only valid transitions compile.

use super::exit::ExitStatus;
use crate::types::ExecId;

/// Exec instance exists on the daemon but has not been started.
#[derive(Debug)]
pub struct Created;

/// Start was requested (detached, or the upgrade call is in flight).
#[derive(Debug)]
pub struct Started;

/// The connection was taken over and the streams are attached.
#[derive(Debug)]
pub struct Attached;

/// The remote process is gone and its exit status is known.
#[derive(Debug)]
pub struct Finished {
    status: ExitStatus,
}

/// An exec instance on the daemon, tagged with its lifecycle state.
///
/// Read-only once created: transitions consume the value and only move
/// the identity forward.
#[derive(Debug)]
pub struct ExecSession<S> {
    id: ExecId,
    tty: bool,
    state: S,
}

impl<S> ExecSession<S> {
    pub fn id(&self) -> &ExecId {
        &self.id
    }

    pub fn tty(&self) -> bool {
        self.tty
    }

    fn transition<T>(self, state: T) -> ExecSession<T> {
        ExecSession {
            id: self.id,
            tty: self.tty,
            state,
        }
    }
}

impl ExecSession<Created> {
    pub(crate) fn new(id: ExecId, tty: bool) -> Self {
        Self {
            id,
            tty,
            state: Created,
        }
    }

    pub(crate) fn start(self) -> ExecSession<Started> {
        self.transition(Started)
    }
}

impl ExecSession<Started> {
    pub(crate) fn attach(self) -> ExecSession<Attached> {
        self.transition(Attached)
    }
}

impl ExecSession<Attached> {
    pub(crate) fn finish(self, status: ExitStatus) -> ExecSession<Finished> {
        self.transition(Finished { status })
    }
}

impl ExecSession<Finished> {
    pub fn status(&self) -> ExitStatus {
        self.state.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_keep_identity() {
        let created = ExecSession::new(ExecId::new("e1"), true);

        let finished = created.start().attach().finish(ExitStatus::new(3));
        assert_eq!(finished.id().as_str(), "e1");
        assert!(finished.tty());
        assert_eq!(finished.status().code(), 3);
    }
}
