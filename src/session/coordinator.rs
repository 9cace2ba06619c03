// ABOUTME: Drives one exec session from creation to its exit status.
// ABOUTME: Runs the hijack in a background task and owns release of the connection.

use super::attach::Endpoints;
use super::client::SessionClient;
use super::connection::ConnectionCloser;
use super::error::SessionError;
use super::exit::{ExitResolver, ExitStatus};
use super::hijack::hijack;
use super::request::ExecRequest;
use super::resize::{ResizeMonitor, ResizeTrigger};
use super::state::{Attached, ExecSession};
use crate::diagnostics::Diagnostics;
use crate::runtime::ExecRuntime;
use crate::terminal::{LocalTerminal, RawModeGuard, Streams};
use crate::types::ExecId;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};

/// Message written to the output when the daemon hands back no exec id.
pub const EMPTY_ID_MESSAGE: &str = "exec ID empty";

/// Timing knobs for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub resize_trigger: ResizeTrigger,
    pub exit_poll_interval: Duration,
    pub exit_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            resize_trigger: ResizeTrigger::platform_default(Duration::from_millis(250)),
            exit_poll_interval: Duration::from_millis(100),
            exit_timeout: Duration::from_secs(10),
        }
    }
}

/// How a session ended, short of an error.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The daemon returned an empty exec id; nothing was started.
    NothingToRun,
    /// The exec was started in the background.
    Detached { exec_id: ExecId },
    /// The remote process ran attached and exited.
    Exited {
        exec_id: ExecId,
        status: ExitStatus,
        diagnostics: Diagnostics,
    },
}

impl SessionOutcome {
    /// Local process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NothingToRun | Self::Detached { .. } => 0,
            Self::Exited { status, .. } => status.process_code(),
        }
    }
}

type PumpTask = JoinHandle<Result<(), SessionError>>;

/// Runs exec sessions against one runtime.
pub struct SessionCoordinator<R: ?Sized> {
    runtime: Arc<R>,
    options: SessionOptions,
}

impl<R: ExecRuntime + ?Sized + 'static> SessionCoordinator<R> {
    pub fn new(runtime: Arc<R>, options: SessionOptions) -> Self {
        Self { runtime, options }
    }

    /// Run `request` to completion using the given local endpoints.
    pub async fn run(
        &self,
        request: &ExecRequest,
        mut streams: Streams,
        terminal: Arc<dyn LocalTerminal>,
    ) -> Result<SessionOutcome, SessionError> {
        let client = SessionClient::new(&*self.runtime);

        let Some(session) = client.create(request, &mut streams.error).await? else {
            write_notice(&mut streams, EMPTY_ID_MESSAGE).await;
            return Ok(SessionOutcome::NothingToRun);
        };

        if request.detach {
            let session = client.start_detached(session).await?;
            return Ok(SessionOutcome::Detached {
                exec_id: session.id().clone(),
            });
        }

        let interactive_input = terminal.is_input_terminal();
        if request.attach_stdin && request.tty && !interactive_input {
            return Err(SessionError::TtyInput);
        }

        // Before the pump exists, so no keystroke is read in cooked mode.
        let _raw_mode = if request.tty && request.attach_stdin && interactive_input {
            enable_raw_mode(&*terminal)
        } else {
            None
        };

        let session = session.start();
        let endpoints = Endpoints::select(request, streams);
        let (handshake_tx, handshake_rx) = oneshot::channel();
        let task = tokio::spawn({
            let runtime = Arc::clone(&self.runtime);
            let exec_id = session.id().clone();
            let tty = request.tty;
            async move { hijack(&*runtime, &exec_id, tty, endpoints, handshake_tx).await }
        });

        let (closer, pump) = await_handshake(handshake_rx, task).await?;
        // Released when this function returns, whichever way it returns.
        let _release = closer.guard();
        let session = session.attach();

        let monitor = (request.tty && interactive_input).then(|| {
            ResizeMonitor::spawn(
                Arc::clone(&self.runtime),
                session.id().clone(),
                Arc::clone(&terminal),
                self.options.resize_trigger,
            )
        });

        let pumped = pump.join().await;
        let mut diagnostics = Diagnostics::default();
        if let Some(monitor) = monitor {
            diagnostics.extend(monitor.stop().await);
        }
        pumped?;

        let status = self.resolve_exit(&session).await?;
        let session = session.finish(status);
        Ok(SessionOutcome::Exited {
            exec_id: session.id().clone(),
            status: session.status(),
            diagnostics,
        })
    }

    async fn resolve_exit(
        &self,
        session: &ExecSession<Attached>,
    ) -> Result<ExitStatus, SessionError> {
        ExitResolver::new(
            &*self.runtime,
            self.options.exit_poll_interval,
            self.options.exit_timeout,
        )
        .resolve(session)
        .await
    }
}

/// The background task, possibly already finished when the handshake arrived.
enum Pump {
    Running(PumpTask),
    Done(Result<(), SessionError>),
}

impl Pump {
    async fn join(self) -> Result<(), SessionError> {
        match self {
            Self::Running(task) => task_result(task.await),
            Self::Done(result) => result,
        }
    }
}

/// Wait for whichever comes first: the connection, or the task failing.
async fn await_handshake(
    mut handshake: oneshot::Receiver<ConnectionCloser>,
    mut task: PumpTask,
) -> Result<(ConnectionCloser, Pump), SessionError> {
    tokio::select! {
        biased;

        received = &mut handshake => match received {
            Ok(closer) => Ok((closer, Pump::Running(task))),
            // Sender dropped without a connection; the task's result says why.
            Err(_) => Err(failure(task_result(task.await))),
        },
        joined = &mut task => {
            let result = task_result(joined);
            match handshake.try_recv() {
                Ok(closer) => Ok((closer, Pump::Done(result))),
                Err(_) => Err(failure(result)),
            }
        }
    }
}

fn failure(result: Result<(), SessionError>) -> SessionError {
    match result {
        Err(e) => e,
        Ok(()) => SessionError::task("session ended before the connection was established"),
    }
}

fn task_result(joined: Result<Result<(), SessionError>, JoinError>) -> Result<(), SessionError> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(SessionError::task("session task panicked")),
        Err(e) => Err(SessionError::task(format!("session task failed: {e}"))),
    }
}

fn enable_raw_mode(terminal: &dyn LocalTerminal) -> Option<RawModeGuard> {
    terminal.raw_mode().unwrap_or_else(|e| {
        tracing::warn!("failed to enable raw mode: {}", e);
        None
    })
}

async fn write_notice(streams: &mut Streams, message: &str) {
    let line = format!("{message}\n");
    if let Err(e) = streams.output.write_all(line.as_bytes()).await {
        tracing::debug!("failed to write notice: {}", e);
        return;
    }
    if let Err(e) = streams.output.flush().await {
        tracing::debug!("failed to flush notice: {}", e);
    }
}
