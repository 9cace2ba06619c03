// ABOUTME: The local side of an exec session: stdio endpoints and terminal state.
// ABOUTME: Reports whether input is a terminal, its size, and manages raw mode.

use crate::runtime::TtySize;
use std::io::{self, IsTerminal};
use tokio::io::{AsyncRead, AsyncWrite};

/// Local input endpoint.
pub type InputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Local output endpoint.
pub type OutputStream = Box<dyn AsyncWrite + Send + Unpin>;

/// The three local endpoints a session reads from and writes to.
pub struct Streams {
    pub input: InputStream,
    pub output: OutputStream,
    pub error: OutputStream,
}

impl Streams {
    /// The process's own stdin, stdout and stderr.
    pub fn stdio() -> Self {
        Self {
            input: Box::new(tokio::io::stdin()),
            output: Box::new(tokio::io::stdout()),
            error: Box::new(tokio::io::stderr()),
        }
    }
}

/// What the session needs to know about the local terminal.
pub trait LocalTerminal: Send + Sync {
    /// Whether local input is an interactive terminal.
    fn is_input_terminal(&self) -> bool;

    /// Current size, or `None` when it cannot be determined.
    fn size(&self) -> Option<TtySize>;

    /// Put the terminal into raw mode for the duration of the returned guard.
    fn raw_mode(&self) -> io::Result<Option<RawModeGuard>> {
        Ok(None)
    }
}

/// The terminal this process runs in.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdTerminal;

impl LocalTerminal for StdTerminal {
    fn is_input_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn size(&self) -> Option<TtySize> {
        crossterm::terminal::size()
            .ok()
            .map(|(cols, rows)| TtySize::new(rows, cols))
            .filter(|size| !size.is_zero())
    }

    fn raw_mode(&self) -> io::Result<Option<RawModeGuard>> {
        RawModeGuard::enable().map(Some)
    }
}

/// Keeps the terminal in raw mode until dropped.
#[derive(Debug)]
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        tracing::debug!("terminal switched to raw mode");
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            tracing::warn!("failed to restore terminal mode: {}", e);
        }
    }
}
