// ABOUTME: Diagnostics accumulator for non-fatal warnings during an exec session.
// ABOUTME: Collects problems that shouldn't fail the session but should be shown to users.

/// Collects non-fatal warnings during a session.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Take over warnings collected elsewhere, keeping their order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during a session.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a terminal resize warning.
    pub fn resize(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Resize,
            message: message.into(),
        }
    }

    /// Create a connection close warning.
    pub fn connection_close(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ConnectionClose,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The remote TTY could not be resized to match the local terminal.
    Resize,
    /// A background part of the session did not shut down cleanly.
    ConnectionClose,
}
