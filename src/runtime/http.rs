// ABOUTME: Raw HTTP/1.1 requests to the daemon over its Unix socket using hyper.
// ABOUTME: Covers the calls bollard does not model: exec create warnings and the start upgrade.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::SendRequest;
use hyper::header::{CONNECTION, CONTENT_TYPE, HOST, UPGRADE};
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::net::UnixStream;

use super::traits::HijackedStream;

/// Errors talking to the daemon socket directly.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to connect to {socket}: {source}")]
    Connect {
        socket: String,
        source: std::io::Error,
    },

    #[error("HTTP handshake failed: {0}")]
    Handshake(hyper::Error),

    #[error("failed to build request: {0}")]
    Build(#[from] hyper::http::Error),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Request(hyper::Error),

    #[error("failed to read response: {0}")]
    Body(hyper::Error),

    #[error("daemon returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("daemon answered {status} without switching protocols")]
    NotUpgraded { status: u16 },

    #[error("connection upgrade failed: {0}")]
    Upgrade(hyper::Error),

    #[error("daemon did not answer {stage} within {timeout:?}")]
    Timeout {
        stage: &'static str,
        timeout: Duration,
    },
}

/// A daemon Unix socket. Each request opens its own connection.
///
/// Every step up to a complete response is bounded by `timeout`. An
/// upgraded stream is not: it lives as long as the remote process.
#[derive(Debug, Clone)]
pub struct DaemonSocket {
    path: String,
    timeout: Duration,
}

impl DaemonSocket {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn bounded<T, F>(&self, stage: &'static str, step: F) -> Result<T, HttpError>
    where
        F: Future<Output = Result<T, HttpError>>,
    {
        tokio::time::timeout(self.timeout, step)
            .await
            .map_err(|_| HttpError::Timeout {
                stage,
                timeout: self.timeout,
            })?
    }

    async fn connect(&self) -> Result<SendRequest<Full<Bytes>>, HttpError> {
        let stream = self
            .bounded("connect", async {
                UnixStream::connect(&self.path)
                    .await
                    .map_err(|source| HttpError::Connect {
                        socket: self.path.clone(),
                        source,
                    })
            })
            .await?;

        let (sender, conn) = self
            .bounded("handshake", async {
                hyper::client::conn::http1::handshake(TokioIo::new(stream))
                    .await
                    .map_err(HttpError::Handshake)
            })
            .await?;

        // Upgrades must be enabled on the connection future or the upgraded
        // stream is never handed back.
        tokio::spawn(async move {
            if let Err(e) = conn.with_upgrades().await {
                tracing::debug!("daemon connection error: {}", e);
            }
        });

        Ok(sender)
    }

    fn build_request(
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Request<Full<Bytes>>, HttpError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, "localhost");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder.body(Full::new(body.map(Bytes::from).unwrap_or_default()))?;
        Ok(req)
    }

    async fn send(&self, req: Request<Full<Bytes>>) -> Result<Bytes, HttpError> {
        let mut sender = self.connect().await?;
        let (status, body) = self
            .bounded("request", async {
                let resp = sender.send_request(req).await.map_err(HttpError::Request)?;
                let status = resp.status();
                Ok((status, read_body(resp).await?))
            })
            .await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(body)
    }

    /// POST a JSON body and return the successful response body.
    pub async fn post_json(&self, path: &str, body: &impl Serialize) -> Result<Bytes, HttpError> {
        let req = Self::build_request(Method::POST, path, Some(serde_json::to_vec(body)?))?;
        self.send(req).await
    }

    /// POST without a body; the daemon reads everything from the query string.
    pub async fn post_empty(&self, path: &str) -> Result<Bytes, HttpError> {
        let req = Self::build_request(Method::POST, path, None)?;
        self.send(req).await
    }

    /// POST a JSON body asking the daemon to upgrade the connection to a raw stream.
    pub async fn post_upgrade(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<HijackedStream, HttpError> {
        let mut sender = self.connect().await?;
        let mut req = Self::build_request(Method::POST, path, Some(serde_json::to_vec(body)?))?;
        let headers = req.headers_mut();
        headers.insert(CONNECTION, hyper::header::HeaderValue::from_static("Upgrade"));
        headers.insert(UPGRADE, hyper::header::HeaderValue::from_static("tcp"));

        let upgraded = self
            .bounded("start", async {
                let resp = sender.send_request(req).await.map_err(HttpError::Request)?;
                let status = resp.status();
                if status != StatusCode::SWITCHING_PROTOCOLS {
                    let body = read_body(resp).await?;
                    if status.is_success() {
                        return Err(HttpError::NotUpgraded {
                            status: status.as_u16(),
                        });
                    }
                    return Err(status_error(status, &body));
                }
                hyper::upgrade::on(resp).await.map_err(HttpError::Upgrade)
            })
            .await?;
        Ok(Box::new(TokioIo::new(upgraded)))
    }
}

async fn read_body(resp: Response<hyper::body::Incoming>) -> Result<Bytes, HttpError> {
    let collected = resp.into_body().collect().await.map_err(HttpError::Body)?;
    Ok(collected.to_bytes())
}

/// The daemon reports errors as `{"message": "..."}`; fall back to the raw text.
fn status_error(status: StatusCode, body: &[u8]) -> HttpError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }

    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());

    HttpError::Status {
        status: status.as_u16(),
        message,
    }
}
