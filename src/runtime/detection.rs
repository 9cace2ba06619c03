// ABOUTME: Runtime detection for the local daemon socket.
// ABOUTME: Honors explicit overrides, then checks Podman sockets first, then Docker.

use super::types::{RuntimeConfig, RuntimeEndpoint, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("configured socket does not exist: {0}")]
    SocketNotFound(String),
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Resolve which daemon socket to use.
///
/// Order:
/// 1. Explicit runtime and/or socket from `config`
/// 2. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 3. Rootful Podman socket (`/run/podman/podman.sock`)
/// 4. Docker socket (`/var/run/docker.sock`)
pub fn detect_runtime(config: Option<&RuntimeConfig>) -> Result<RuntimeEndpoint, DetectionError> {
    detect_with(config, get_uid(), |path| Path::new(path).exists())
}

fn detect_with(
    config: Option<&RuntimeConfig>,
    uid: Option<String>,
    exists: impl Fn(&str) -> bool,
) -> Result<RuntimeEndpoint, DetectionError> {
    if let Some(cfg) = config {
        match (cfg.runtime, cfg.socket.as_deref()) {
            (Some(runtime_type), socket) => {
                let socket_path = socket
                    .map(str::to_string)
                    .unwrap_or_else(|| default_socket_path(runtime_type, uid.as_deref()));
                return Ok(RuntimeEndpoint {
                    runtime_type,
                    socket_path,
                });
            }
            (None, Some(socket)) => {
                if !exists(socket) {
                    return Err(DetectionError::SocketNotFound(socket.to_string()));
                }
                return Ok(RuntimeEndpoint {
                    runtime_type: runtime_for_socket(socket),
                    socket_path: socket.to_string(),
                });
            }
            (None, None) => {}
        }
    }

    if let Some(uid) = uid.as_deref() {
        let rootless_socket = rootless_podman_socket(uid);
        if exists(&rootless_socket) {
            return Ok(RuntimeEndpoint {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if exists(ROOTFUL_PODMAN) {
        return Ok(RuntimeEndpoint {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if exists(DOCKER_SOCKET) {
        return Ok(RuntimeEndpoint {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

fn rootless_podman_socket(uid: &str) -> String {
    format!("/run/user/{}/podman/podman.sock", uid)
}

fn default_socket_path(runtime: RuntimeType, uid: Option<&str>) -> String {
    match (runtime, uid) {
        (RuntimeType::Docker, _) => DOCKER_SOCKET.to_string(),
        (RuntimeType::Podman, Some("0")) | (RuntimeType::Podman, None) => {
            ROOTFUL_PODMAN.to_string()
        }
        (RuntimeType::Podman, Some(uid)) => rootless_podman_socket(uid),
    }
}

/// Guess the runtime from a socket path; Podman sockets carry its name.
fn runtime_for_socket(socket: &str) -> RuntimeType {
    if socket.contains("podman") {
        RuntimeType::Podman
    } else {
        RuntimeType::Docker
    }
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        // Fall back to reading /proc/self/status
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}
