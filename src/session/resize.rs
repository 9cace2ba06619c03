// ABOUTME: Keeps the remote TTY size in step with the local terminal.
// ABOUTME: Runs as a background task between the handshake and the end of the session.

use super::connection::wait_until_set;
use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::{ExecOps, TtySize};
use crate::terminal::LocalTerminal;
use crate::types::ExecId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long `stop` waits for an in-flight resize before giving up on it.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// How terminal size changes are noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeTrigger {
    /// React to `SIGWINCH`, and re-check the size every `poll` as well.
    #[cfg(unix)]
    Signal { poll: Duration },
    /// Sample the size at a fixed interval.
    Poll(Duration),
}

impl ResizeTrigger {
    /// Signals where the platform has them, polling otherwise. The
    /// interval applies either way.
    pub fn platform_default(poll_interval: Duration) -> Self {
        #[cfg(unix)]
        {
            Self::Signal {
                poll: poll_interval,
            }
        }
        #[cfg(not(unix))]
        {
            Self::Poll(poll_interval)
        }
    }

    /// Interval at which the size is sampled.
    pub fn poll_interval(&self) -> Duration {
        match *self {
            #[cfg(unix)]
            Self::Signal { poll } => poll,
            Self::Poll(poll) => poll,
        }
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval
}

enum SizeChanges {
    #[cfg(unix)]
    Signal(tokio::signal::unix::Signal, tokio::time::Interval),
    Poll(tokio::time::Interval),
}

impl SizeChanges {
    fn new(trigger: ResizeTrigger) -> std::io::Result<Self> {
        match trigger {
            #[cfg(unix)]
            ResizeTrigger::Signal { poll } => {
                use tokio::signal::unix::{SignalKind, signal};
                Ok(Self::Signal(signal(SignalKind::window_change())?, ticker(poll)))
            }
            ResizeTrigger::Poll(period) => Ok(Self::Poll(ticker(period))),
        }
    }

    async fn next(&mut self) {
        match self {
            #[cfg(unix)]
            Self::Signal(signal, interval) => {
                tokio::select! {
                    received = signal.recv() => {
                        // Signal stream gone; the interval still fires.
                        if received.is_none() {
                            interval.tick().await;
                        }
                    }
                    _ = interval.tick() => {}
                }
            }
            Self::Poll(interval) => {
                interval.tick().await;
            }
        }
    }
}

/// Handle to a running resize monitor.
pub struct ResizeMonitor {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Diagnostics>,
}

impl ResizeMonitor {
    /// Send the current size, then follow every change until stopped.
    pub fn spawn<R>(
        runtime: Arc<R>,
        exec_id: ExecId,
        terminal: Arc<dyn LocalTerminal>,
        trigger: ResizeTrigger,
    ) -> Self
    where
        R: ExecOps + ?Sized + 'static,
    {
        let (shutdown, stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            run(&*runtime, &exec_id, &*terminal, trigger, stop_rx).await
        });
        Self { shutdown, task }
    }

    /// Stop following size changes and return what went wrong meanwhile.
    pub async fn stop(mut self) -> Diagnostics {
        self.shutdown.send_replace(true);

        tokio::select! {
            joined = &mut self.task => match joined {
                Ok(diagnostics) => diagnostics,
                Err(e) => {
                    let mut diagnostics = Diagnostics::default();
                    diagnostics.warn(Warning::connection_close(format!(
                        "resize monitor failed: {e}"
                    )));
                    diagnostics
                }
            },
            _ = tokio::time::sleep(STOP_TIMEOUT) => {
                self.task.abort();
                let mut diagnostics = Diagnostics::default();
                diagnostics.warn(Warning::connection_close(
                    "resize monitor did not stop in time",
                ));
                diagnostics
            }
        }
    }
}

async fn run<R>(
    runtime: &R,
    exec_id: &ExecId,
    terminal: &dyn LocalTerminal,
    trigger: ResizeTrigger,
    mut stop: watch::Receiver<bool>,
) -> Diagnostics
where
    R: ExecOps + ?Sized,
{
    let mut diagnostics = Diagnostics::default();
    let mut last = None;

    // Listen before the first report so a change in between is not lost.
    let changes = SizeChanges::new(trigger);
    report(runtime, exec_id, terminal, &mut last, &mut diagnostics).await;

    let mut changes = match changes {
        Ok(changes) => changes,
        Err(e) => {
            diagnostics.warn(Warning::resize(format!(
                "cannot watch terminal size changes: {e}"
            )));
            return diagnostics;
        }
    };

    loop {
        tokio::select! {
            _ = wait_until_set(&mut stop) => break,
            _ = changes.next() => {
                report(runtime, exec_id, terminal, &mut last, &mut diagnostics).await;
            }
        }
    }

    diagnostics
}

async fn report<R>(
    runtime: &R,
    exec_id: &ExecId,
    terminal: &dyn LocalTerminal,
    last: &mut Option<TtySize>,
    diagnostics: &mut Diagnostics,
) where
    R: ExecOps + ?Sized,
{
    let Some(size) = terminal.size().filter(|size| !size.is_zero()) else {
        return;
    };
    if *last == Some(size) {
        return;
    }

    match runtime.resize_exec(exec_id, size).await {
        Ok(()) => {
            tracing::debug!(exec = %exec_id, %size, "resized remote tty");
            *last = Some(size);
        }
        Err(e) => diagnostics.warn(Warning::resize(format!(
            "failed to resize tty of exec {exec_id} to {size}: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_default_keeps_the_interval() {
        let trigger = ResizeTrigger::platform_default(Duration::from_millis(40));
        assert_eq!(trigger.poll_interval(), Duration::from_millis(40));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn signal_trigger_also_fires_on_its_interval() {
        let mut changes = SizeChanges::new(ResizeTrigger::Signal {
            poll: Duration::from_millis(10),
        })
        .unwrap();

        // First tick is immediate, the second one waits a full period.
        for _ in 0..2 {
            tokio::time::timeout(Duration::from_secs(2), changes.next())
                .await
                .expect("interval should wake the monitor without a signal");
        }
    }
}
