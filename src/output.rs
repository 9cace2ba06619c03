// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes on stderr.

use crate::diagnostics::Diagnostics;
use serde::Serialize;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly messages
    Normal,
    /// Errors only
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI feedback based on the configured mode.
///
/// Everything goes to stderr; stdout belongs to the remote process.
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    /// Print an informational message (suppressed in quiet mode).
    pub fn info(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("{message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => emit(&JsonEvent::new("info", message)),
        }
    }

    /// Print collected warnings once a session is over.
    pub fn diagnostics(&self, diagnostics: &Diagnostics) {
        for warning in diagnostics.warnings() {
            match self.mode {
                OutputMode::Normal => eprintln!("warning: {}", warning.message),
                OutputMode::Quiet => {}
                OutputMode::Json => emit(&JsonEvent::new("warning", &warning.message)),
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => emit(&JsonEvent::new("error", message)),
        }
    }
}

fn emit(event: &JsonEvent<'_>) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
}

impl<'a> JsonEvent<'a> {
    fn new(event: &'a str, message: &'a str) -> Self {
        Self { event, message }
    }
}
