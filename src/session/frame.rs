// ABOUTME: Decoder for the daemon's multiplexed stdout/stderr stream framing.
// ABOUTME: Used for attached exec streams without a TTY.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Length of a frame header: stream type, three zero bytes, big-endian size.
pub const HEADER_LEN: usize = 8;

/// Most payload space reserved before any of it has arrived.
const MAX_PREALLOC: usize = 32 * 1024;

/// Which remote stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
    /// Error reported by the daemon itself in the middle of the stream.
    System,
}

impl StreamKind {
    fn from_byte(byte: u8) -> io::Result<Self> {
        match byte {
            0 => Ok(Self::Stdin),
            1 => Ok(Self::Stdout),
            2 => Ok(Self::Stderr),
            3 => Ok(Self::System),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unrecognized stream type {other}"),
            )),
        }
    }

    fn as_byte(self) -> u8 {
        match self {
            Self::Stdin => 0,
            Self::Stdout => 1,
            Self::Stderr => 2,
            Self::System => 3,
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub stream: StreamKind,
    pub payload: Vec<u8>,
}

/// Encode a payload the way the daemon frames it.
pub fn encode_frame(stream: StreamKind, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(stream.as_byte());
    out.extend_from_slice(&[0, 0, 0]);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Read the next frame. `Ok(None)` means the stream ended cleanly between frames.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<Option<Frame>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended inside a frame header",
            ));
        }
        filled += n;
    }

    let stream = StreamKind::from_byte(header[0])?;
    let size = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;

    // The size comes off the wire; the buffer grows with the bytes actually read.
    let mut payload = Vec::with_capacity(size.min(MAX_PREALLOC));
    (&mut *reader)
        .take(size as u64)
        .read_to_end(&mut payload)
        .await?;
    if payload.len() < size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream ended inside a frame payload",
        ));
    }

    Ok(Some(Frame { stream, payload }))
}
