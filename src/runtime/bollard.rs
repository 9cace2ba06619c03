// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Supports both Docker and Podman via the Docker-compatible exec API.

use crate::runtime::http::{DaemonSocket, HttpError};
use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ExecConfig, ExecCreated, ExecError, ExecInfo, ExecOps, HijackOps, HijackedStream, RuntimeInfo,
    RuntimeInfoError, TtySize,
};
use crate::runtime::types::{RuntimeEndpoint, RuntimeType};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::exec::StartExecOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_exec_create_error(e: HttpError) -> ExecError {
    match e {
        HttpError::Status { status, message } if status == 404 => {
            ExecError::ContainerNotFound(message)
        }
        HttpError::Status { status, message } if status == 409 => {
            ExecError::ContainerNotRunning(message)
        }
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn map_exec_http_error(e: HttpError) -> ExecError {
    match e {
        HttpError::NotUpgraded { .. } => ExecError::UpgradeRefused(e.to_string()),
        HttpError::Status { status, message } if status == 404 => ExecError::ExecNotFound(message),
        HttpError::Status { status, message } if status == 409 => {
            ExecError::ContainerNotRunning(message)
        }
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn map_exec_not_found_error(e: bollard::errors::Error) -> ExecError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ExecError::ExecNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ExecError::ContainerNotRunning(message.clone()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

// =============================================================================
// Wire bodies
// =============================================================================

/// Exec create response. Older daemons send `Warnings`, newer ones omit it.
#[derive(Debug, Deserialize)]
struct CreateExecResponse {
    #[serde(rename = "Id", default)]
    id: String,
    #[serde(rename = "Warnings", default)]
    warnings: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartExecBody {
    detach: bool,
    tty: bool,
}

fn decode_create_response(body: &[u8]) -> Result<ExecCreated, ExecError> {
    let response: CreateExecResponse =
        serde_json::from_slice(body).map_err(|e| ExecError::Decode(e.to_string()))?;
    Ok(ExecCreated {
        id: ExecId::new(response.id),
        warnings: response.warnings.unwrap_or_default(),
    })
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// Control calls bollard models faithfully (detached start, inspect, ping)
/// go through the bollard client. Exec creation and the attached start
/// talk to the same socket through [`DaemonSocket`], since bollard drops
/// creation warnings and hides the upgraded connection.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
    socket: DaemonSocket,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client and the socket it uses.
    pub fn new(client: Docker, runtime_type: RuntimeType, socket: DaemonSocket) -> Self {
        Self {
            client,
            runtime_type,
            socket,
        }
    }

    /// Connect to a container runtime using a detected endpoint.
    ///
    /// Use with `detect_runtime()` to find the endpoint.
    pub fn connect(
        endpoint: &RuntimeEndpoint,
        api_timeout: Duration,
    ) -> Result<Self, RuntimeInfoError> {
        let client = Docker::connect_with_unix(
            &endpoint.socket_path,
            api_timeout.as_secs(),
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| RuntimeInfoError::ConnectionFailed {
            socket: endpoint.socket_path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(
            client,
            endpoint.runtime_type,
            DaemonSocket::new(endpoint.socket_path.clone(), api_timeout),
        ))
    }

    /// Get the runtime type (Docker or Podman).
    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    /// Path of the daemon socket this runtime talks to.
    pub fn socket_path(&self) -> &str {
        self.socket.path()
    }
}

// Implement Sealed trait to allow runtime trait implementations
impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed {
                socket: self.socket.path().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ExecOps for BollardRuntime {
    async fn create_exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecCreated, ExecError> {
        let path = format!(
            "/containers/{}/exec",
            urlencoding::encode(container.as_str())
        );
        let body = self
            .socket
            .post_json(&path, config)
            .await
            .map_err(map_exec_create_error)?;

        decode_create_response(&body)
    }

    async fn start_exec_detached(&self, exec_id: &ExecId, tty: bool) -> Result<(), ExecError> {
        let opts = StartExecOptions {
            detach: true,
            tty,
            ..Default::default()
        };

        self.client
            .start_exec(exec_id.as_str(), Some(opts))
            .await
            .map_err(map_exec_not_found_error)?;
        Ok(())
    }

    async fn resize_exec(&self, exec_id: &ExecId, size: TtySize) -> Result<(), ExecError> {
        let path = format!(
            "/exec/{}/resize?h={}&w={}",
            urlencoding::encode(exec_id.as_str()),
            size.rows,
            size.cols
        );
        self.socket
            .post_empty(&path)
            .await
            .map_err(map_exec_http_error)?;
        Ok(())
    }

    async fn inspect_exec(&self, exec_id: &ExecId) -> Result<ExecInfo, ExecError> {
        let details = self
            .client
            .inspect_exec(exec_id.as_str())
            .await
            .map_err(map_exec_not_found_error)?;

        Ok(ExecInfo {
            running: details.running.unwrap_or(false),
            exit_code: details.exit_code,
        })
    }
}

#[async_trait]
impl HijackOps for BollardRuntime {
    async fn start_exec_attached(
        &self,
        exec_id: &ExecId,
        tty: bool,
    ) -> Result<HijackedStream, ExecError> {
        let path = format!("/exec/{}/start", urlencoding::encode(exec_id.as_str()));
        let body = StartExecBody { detach: false, tty };

        tracing::debug!(exec = %exec_id, tty, "requesting attached exec start");
        self.socket
            .post_upgrade(&path, &body)
            .await
            .map_err(map_exec_http_error)
    }
}
