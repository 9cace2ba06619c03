// ABOUTME: Container runtime access for Docker and Podman.
// ABOUTME: Detects the local daemon socket and exposes exec capabilities over it.

mod bollard;
mod detection;
mod error;
mod http;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_runtime};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use http::{DaemonSocket, HttpError};
pub use traits::*;
pub use types::{RuntimeConfig, RuntimeEndpoint, RuntimeType};

/// Detect the daemon, connect to it and check that it answers.
pub async fn connect_runtime(
    config: Option<&RuntimeConfig>,
    api_timeout: std::time::Duration,
) -> Result<BollardRuntime, RuntimeError> {
    let endpoint = detect_runtime(config)?;
    tracing::debug!(
        "using {} at {}",
        endpoint.runtime_type,
        endpoint.socket_path
    );

    let runtime = BollardRuntime::connect(&endpoint, api_timeout)?;
    runtime.ping().await?;
    Ok(runtime)
}
