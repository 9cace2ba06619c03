// ABOUTME: Validated description of a command to run inside a running container.
// ABOUTME: Carries attachment flags and converts to the daemon's exec create body.

use crate::runtime::ExecConfig;
use crate::types::ContainerId;
use nonempty::NonEmpty;

/// Rejected exec requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("container reference cannot be empty")]
    EmptyContainer,

    #[error("command cannot be empty")]
    EmptyCommand,

    #[error("environment entries cannot be empty")]
    EmptyEnvEntry,
}

/// What to run, where, and which local endpoints take part.
///
/// Built with [`ExecRequest::new`] and the consuming setters. By default
/// stdout and stderr are attached, stdin is not, and no TTY is allocated.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    container: ContainerId,
    command: NonEmpty<String>,
    /// Forward local input to the remote process.
    pub attach_stdin: bool,
    /// Copy remote stdout to the local output.
    pub attach_stdout: bool,
    /// Copy remote stderr to the local error stream.
    pub attach_stderr: bool,
    /// Allocate a pseudo-terminal for the remote process.
    pub tty: bool,
    /// Start and return without taking over the terminal.
    pub detach: bool,
    /// User to run as.
    pub user: Option<String>,
    /// Working directory inside the container.
    pub working_dir: Option<String>,
    /// Extra environment (`KEY=VALUE`).
    pub env: Vec<String>,
    /// Run with extended privileges.
    pub privileged: bool,
}

impl ExecRequest {
    pub fn new(container: impl Into<String>, command: Vec<String>) -> Result<Self, RequestError> {
        let container = container.into();
        if container.trim().is_empty() {
            return Err(RequestError::EmptyContainer);
        }
        let command = NonEmpty::from_vec(command).ok_or(RequestError::EmptyCommand)?;

        Ok(Self {
            container: ContainerId::new(container),
            command,
            attach_stdin: false,
            attach_stdout: true,
            attach_stderr: true,
            tty: false,
            detach: false,
            user: None,
            working_dir: None,
            env: Vec::new(),
            privileged: false,
        })
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.attach_stdin = interactive;
        self
    }

    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    pub fn detach(mut self, detach: bool) -> Self {
        self.detach = detach;
        self
    }

    pub fn attach_stdout(mut self, attach: bool) -> Self {
        self.attach_stdout = attach;
        self
    }

    pub fn attach_stderr(mut self, attach: bool) -> Self {
        self.attach_stderr = attach;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, env: Vec<String>) -> Result<Self, RequestError> {
        if env.iter().any(|entry| entry.is_empty()) {
            return Err(RequestError::EmptyEnvEntry);
        }
        self.env = env;
        Ok(self)
    }

    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    pub fn command(&self) -> &NonEmpty<String> {
        &self.command
    }

    /// Body for the exec create call.
    ///
    /// A detached exec never attaches anything, whatever the flags say.
    pub fn to_exec_config(&self) -> ExecConfig {
        let attach = !self.detach;
        ExecConfig {
            cmd: self.command.iter().cloned().collect(),
            env: self.env.clone(),
            working_dir: self.working_dir.clone(),
            user: self.user.clone(),
            attach_stdin: attach && self.attach_stdin,
            attach_stdout: attach && self.attach_stdout,
            attach_stderr: attach && self.attach_stderr,
            tty: self.tty,
            privileged: self.privileged,
        }
    }
}
