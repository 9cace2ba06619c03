// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ExecConfig, ExecCreated, ExecInfo, TtySize.

use crate::types::ExecId;
use serde::Serialize;

/// Exec configuration sent to the daemon when creating an exec instance.
///
/// Serializes to the daemon's `ExecConfig` JSON body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecConfig {
    /// Command and arguments to run.
    pub cmd: Vec<String>,
    /// Environment variables (`KEY=VALUE`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    /// Working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// User to run as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Attach stdin.
    pub attach_stdin: bool,
    /// Attach stdout.
    pub attach_stdout: bool,
    /// Attach stderr.
    pub attach_stderr: bool,
    /// Allocate a TTY.
    pub tty: bool,
    /// Run in privileged mode.
    pub privileged: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            cmd: Vec::new(),
            env: Vec::new(),
            working_dir: None,
            user: None,
            attach_stdin: false,
            attach_stdout: true,
            attach_stderr: true,
            tty: false,
            privileged: false,
        }
    }
}

/// Response of a successful exec create call.
#[derive(Debug, Clone)]
pub struct ExecCreated {
    /// Exec instance id. May be empty on a degenerate daemon response.
    pub id: ExecId,
    /// Advisory messages, in the order the daemon sent them.
    pub warnings: Vec<String>,
}

/// State of an exec instance as reported by inspect.
#[derive(Debug, Clone)]
pub struct ExecInfo {
    /// Whether the exec is running.
    pub running: bool,
    /// Exit code (if finished).
    pub exit_code: Option<i64>,
}

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtySize {
    pub rows: u16,
    pub cols: u16,
}

impl TtySize {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    /// A zero dimension means the size could not be determined.
    pub fn is_zero(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

impl std::fmt::Display for TtySize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}
