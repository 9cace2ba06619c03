// ABOUTME: Configuration types and parsing for hatch.yml.
// ABOUTME: Handles YAML discovery, duration parsing and environment overrides.

use crate::error::{Error, Result};
use crate::runtime::{RuntimeConfig, RuntimeType};
use crate::session::{ResizeTrigger, SessionOptions};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "hatch.yml";
pub const CONFIG_FILENAME_ALT: &str = "hatch.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hatch/config.yml";

/// Environment variable overriding the daemon socket.
pub const SOCKET_ENV: &str = "HATCH_SOCKET";
/// Environment variable overriding the runtime type.
pub const RUNTIME_ENV: &str = "HATCH_RUNTIME";

/// Exit code polling interval; not configurable.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub runtime: Option<RuntimeType>,

    #[serde(default)]
    pub socket: Option<String>,

    #[serde(default = "default_api_timeout", with = "humantime_serde")]
    pub api_timeout: Duration,

    #[serde(default = "default_resize_poll_interval", with = "humantime_serde")]
    pub resize_poll_interval: Duration,

    #[serde(default = "default_exit_timeout", with = "humantime_serde")]
    pub exit_timeout: Duration,
}

fn default_api_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_resize_poll_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_exit_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: None,
            socket: None,
            api_timeout: default_api_timeout(),
            resize_poll_interval: default_resize_poll_interval(),
            exit_timeout: default_exit_timeout(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`, or defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading config from {}", path.display());
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Apply `HATCH_SOCKET` and `HATCH_RUNTIME` on top of the file values.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(socket) = non_empty_env(SOCKET_ENV) {
            self.socket = Some(socket);
        }
        if let Some(runtime) = non_empty_env(RUNTIME_ENV) {
            let runtime = runtime
                .parse::<RuntimeType>()
                .map_err(|e| Error::InvalidConfig(format!("{RUNTIME_ENV}: {e}")))?;
            self.runtime = Some(runtime);
        }
        Ok(self)
    }

    /// Runtime override for detection, `None` when nothing was configured.
    pub fn runtime_config(&self) -> Option<RuntimeConfig> {
        if self.runtime.is_none() && self.socket.is_none() {
            return None;
        }
        Some(RuntimeConfig {
            runtime: self.runtime,
            socket: self.socket.clone(),
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            resize_trigger: ResizeTrigger::platform_default(self.resize_poll_interval),
            exit_poll_interval: EXIT_POLL_INTERVAL,
            exit_timeout: self.exit_timeout,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
