// ABOUTME: Minimal HTTP/1.1 daemon on a Unix socket that speaks the exec endpoints.
// ABOUTME: Records every request and can upgrade the start call to a raw stream.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;

/// A request as the daemon saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// How the daemon answers.
#[derive(Debug, Clone)]
pub struct Script {
    pub create_status: u16,
    pub create_body: String,
    /// Answer the start call with 101 and this raw stream.
    pub upgrade: bool,
    /// Status for a start call that is not upgraded.
    pub start_status: u16,
    /// Read requests but never answer them.
    pub silent: bool,
    pub stream: Vec<u8>,
    /// Bytes to read from the client after writing `stream`.
    pub read_input: usize,
    pub exit_code: i64,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            create_status: 201,
            create_body: r#"{"Id":"e1","Warnings":[]}"#.to_string(),
            upgrade: true,
            start_status: 404,
            silent: false,
            stream: Vec::new(),
            read_input: 0,
            exit_code: 0,
        }
    }
}

pub struct FakeDaemon {
    socket: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    input: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
    _dir: TempDir,
}

impl FakeDaemon {
    pub fn start(script: Script) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("daemon.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let input = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn({
            let requests = Arc::clone(&requests);
            let input = Arc::clone(&input);
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let script = script.clone();
                    let requests = Arc::clone(&requests);
                    let input = Arc::clone(&input);
                    tokio::spawn(async move {
                        if let Err(e) = serve(stream, &script, &requests, &input).await {
                            eprintln!("fake daemon: {e}");
                        }
                    });
                }
            }
        });

        Self {
            socket: socket.to_string_lossy().into_owned(),
            requests,
            input,
            task,
            _dir: dir,
        }
    }

    pub fn socket(&self) -> &str {
        &self.socket
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    /// Requests whose path contains `fragment`.
    pub fn requests_to(&self, fragment: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.contains(fragment))
            .collect()
    }

    pub fn received_input(&self) -> Vec<u8> {
        self.input.lock().clone()
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: UnixStream,
    script: &Script,
    requests: &Mutex<Vec<Recorded>>,
    input: &Mutex<Vec<u8>>,
) -> io::Result<()> {
    let request = read_request(&mut stream).await?;
    requests.lock().push(request.clone());
    if script.silent {
        std::future::pending::<()>().await;
    }
    let path = request.path.split('?').next().unwrap_or_default().to_string();

    if path.ends_with("/exec") && request.method == "POST" {
        return respond(&mut stream, script.create_status, &script.create_body).await;
    }

    if path.ends_with("/start") {
        if !script.upgrade {
            let body = match script.start_status {
                404 => r#"{"message":"No such exec instance: e1"}"#,
                _ => "",
            };
            return respond(&mut stream, script.start_status, body).await;
        }
        stream
            .write_all(
                b"HTTP/1.1 101 UPGRADED\r\n\
                  Content-Type: application/vnd.docker.raw-stream\r\n\
                  Connection: Upgrade\r\n\
                  Upgrade: tcp\r\n\r\n",
            )
            .await?;
        stream.write_all(&script.stream).await?;
        if script.read_input > 0 {
            let mut received = vec![0u8; script.read_input];
            stream.read_exact(&mut received).await?;
            input.lock().extend_from_slice(&received);
        }
        return stream.shutdown().await;
    }

    if path.ends_with("/resize") {
        return respond(&mut stream, 200, "").await;
    }

    if path.ends_with("/json") && path.contains("/exec/") {
        let body = format!(
            r#"{{"ID":"e1","Running":false,"ExitCode":{},"ContainerID":"c1","ProcessConfig":{{"tty":false,"entrypoint":"sh","arguments":[],"privileged":false}},"OpenStdin":false,"OpenStderr":true,"OpenStdout":true,"CanRemove":false,"DetachKeys":"","Pid":42}}"#,
            script.exit_code
        );
        return respond(&mut stream, 200, &body).await;
    }

    respond(&mut stream, 404, r#"{"message":"page not found"}"#).await
}

async fn read_request(stream: &mut UnixStream) -> io::Result<Recorded> {
    // Byte by byte so nothing after the head is consumed.
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if stream.read(&mut byte).await? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "closed mid-request"));
        }
        head.push(byte[0]);
    }

    let head = String::from_utf8_lossy(&head).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    stream.read_exact(&mut body).await?;

    Ok(Recorded {
        method,
        path,
        headers,
        body,
    })
}

async fn respond(stream: &mut UnixStream, status: u16, body: &str) -> io::Result<()> {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        409 => "Conflict",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
