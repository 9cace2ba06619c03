// ABOUTME: Pumps bytes between the local endpoints and a hijacked connection.
// ABOUTME: Input and output copy concurrently; the session ends with the output side.

use super::connection::wait_until_set;
use super::error::SessionError;
use super::frame::{StreamKind, read_frame};
use super::request::ExecRequest;
use crate::runtime::HijackedStream;
use crate::terminal::{InputStream, OutputStream, Streams};
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

/// Local endpoints taking part in a session, chosen once from the request.
pub struct Endpoints {
    pub stdin: Option<InputStream>,
    pub stdout: Option<OutputStream>,
    pub stderr: Option<OutputStream>,
}

impl Endpoints {
    /// Pick the endpoints the request attaches.
    ///
    /// With a TTY the daemon merges stderr into stdout, so expected stderr
    /// output goes to the stdout sink.
    pub fn select(request: &ExecRequest, streams: Streams) -> Self {
        let Streams {
            input,
            output,
            error,
        } = streams;
        let stdin = request.attach_stdin.then_some(input);

        if request.tty {
            Self {
                stdin,
                stdout: (request.attach_stdout || request.attach_stderr).then_some(output),
                stderr: None,
            }
        } else {
            Self {
                stdin,
                stdout: request.attach_stdout.then_some(output),
                stderr: request.attach_stderr.then_some(error),
            }
        }
    }
}

/// Pump until the remote closes its side, a copy fails, or the connection is
/// released locally.
pub async fn attach(
    stream: HijackedStream,
    endpoints: Endpoints,
    tty: bool,
    mut released: watch::Receiver<bool>,
) -> Result<(), SessionError> {
    let Endpoints {
        stdin,
        stdout,
        stderr,
    } = endpoints;
    let (mut reader, mut writer) = tokio::io::split(stream);

    let output = async {
        if tty {
            copy_raw(&mut reader, stdout).await
        } else {
            demux(&mut reader, stdout, stderr).await
        }
    };
    tokio::pin!(output);

    let mut input_done = stdin.is_none();
    let input = copy_input(stdin, &mut writer);
    tokio::pin!(input);

    loop {
        tokio::select! {
            result = &mut output => {
                tracing::debug!("remote side of the stream closed");
                return result.map_err(SessionError::TransportStream);
            }
            result = &mut input, if !input_done => {
                input_done = true;
                result.map_err(SessionError::TransportStream)?;
                tracing::debug!("local input reached end of stream");
            }
            _ = wait_until_set(&mut released) => {
                tracing::debug!("connection released while attached");
                return Ok(());
            }
        }
    }
}

/// Copy local input to the remote. EOF stops the copy but leaves the write
/// side open, so the remote process decides when the session ends.
async fn copy_input<W>(input: Option<InputStream>, writer: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(mut input) = input else {
        return Ok(());
    };
    let copied = tokio::io::copy(&mut input, writer).await?;
    writer.flush().await?;
    tracing::debug!(bytes = copied, "input copy finished");
    Ok(())
}

/// TTY streams are not framed; copy verbatim or drain.
async fn copy_raw<R>(reader: &mut R, stdout: Option<OutputStream>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    match stdout {
        Some(mut out) => {
            tokio::io::copy(reader, &mut out).await?;
            out.flush().await
        }
        None => tokio::io::copy(reader, &mut tokio::io::sink()).await.map(|_| ()),
    }
}

async fn demux<R>(
    reader: &mut R,
    mut stdout: Option<OutputStream>,
    mut stderr: Option<OutputStream>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    while let Some(frame) = read_frame(reader).await? {
        let sink = match frame.stream {
            StreamKind::Stdin | StreamKind::Stdout => stdout.as_mut(),
            StreamKind::Stderr => stderr.as_mut(),
            StreamKind::System => {
                return Err(io::Error::other(format!(
                    "error from daemon in stream: {}",
                    String::from_utf8_lossy(&frame.payload)
                )));
            }
        };
        if let Some(sink) = sink {
            sink.write_all(&frame.payload).await?;
            sink.flush().await?;
        }
    }
    Ok(())
}
