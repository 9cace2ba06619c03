// ABOUTME: In-crate test doubles for sessions: a scripted runtime and terminal.
// ABOUTME: The runtime traits are sealed, so these live inside the crate.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::{
    ExecConfig, ExecCreated, ExecError, ExecInfo, ExecOps, HijackOps, HijackedStream, TtySize,
};
use crate::terminal::{LocalTerminal, RawModeGuard, Streams};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};

/// Calls the fake daemon received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create,
    StartDetached,
    StartAttached,
    Resize(TtySize),
    Inspect,
}

/// Scripted daemon.
///
/// The attached start hands back one end of an in-memory pipe. The other end
/// waits for `expect_input` bytes, writes `output`, then hangs up.
pub struct FakeRuntime {
    calls: Mutex<Vec<Call>>,
    exec_id: String,
    warnings: Vec<String>,
    exit_code: Option<i64>,
    output: Vec<u8>,
    expect_input: usize,
    received_input: Arc<Mutex<Vec<u8>>>,
    still_running: Mutex<u32>,
    start_delay: Duration,
    refuse_resize: bool,
    refuse_start: bool,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            exec_id: "exec-1".to_string(),
            warnings: Vec::new(),
            exit_code: Some(0),
            output: Vec::new(),
            expect_input: 0,
            received_input: Arc::default(),
            still_running: Mutex::new(0),
            start_delay: Duration::ZERO,
            refuse_resize: false,
            refuse_start: false,
        }
    }

    pub fn exec_id(mut self, id: &str) -> Self {
        self.exec_id = id.to_string();
        self
    }

    pub fn warnings(mut self, warnings: &[&str]) -> Self {
        self.warnings = warnings.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn exit_code(mut self, code: Option<i64>) -> Self {
        self.exit_code = code;
        self
    }

    pub fn output(mut self, bytes: Vec<u8>) -> Self {
        self.output = bytes;
        self
    }

    pub fn expect_input(mut self, len: usize) -> Self {
        self.expect_input = len;
        self
    }

    pub fn still_running(self, polls: u32) -> Self {
        *self.still_running.lock() = polls;
        self
    }

    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn refuse_resize(mut self) -> Self {
        self.refuse_resize = true;
        self
    }

    pub fn refuse_start(mut self) -> Self {
        self.refuse_start = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn received_input(&self) -> Vec<u8> {
        self.received_input.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn exec(&self, exec_id: &ExecId) -> Result<(), ExecError> {
        if exec_id.as_str() == self.exec_id {
            Ok(())
        } else {
            Err(ExecError::ExecNotFound(exec_id.to_string()))
        }
    }
}

impl Sealed for FakeRuntime {}

#[async_trait]
impl ExecOps for FakeRuntime {
    async fn create_exec(
        &self,
        _container: &ContainerId,
        _config: &ExecConfig,
    ) -> Result<ExecCreated, ExecError> {
        self.record(Call::Create);
        Ok(ExecCreated {
            id: ExecId::new(self.exec_id.clone()),
            warnings: self.warnings.clone(),
        })
    }

    async fn start_exec_detached(&self, exec_id: &ExecId, _tty: bool) -> Result<(), ExecError> {
        self.record(Call::StartDetached);
        self.exec(exec_id)
    }

    async fn resize_exec(&self, exec_id: &ExecId, size: TtySize) -> Result<(), ExecError> {
        self.record(Call::Resize(size));
        self.exec(exec_id)?;
        if self.refuse_resize {
            return Err(ExecError::ContainerNotRunning("gone".to_string()));
        }
        Ok(())
    }

    async fn inspect_exec(&self, exec_id: &ExecId) -> Result<ExecInfo, ExecError> {
        self.record(Call::Inspect);
        self.exec(exec_id)?;

        let running = {
            let mut remaining = self.still_running.lock();
            if *remaining > 0 {
                *remaining -= 1;
                true
            } else {
                false
            }
        };
        Ok(ExecInfo {
            running,
            exit_code: if running { None } else { self.exit_code },
        })
    }
}

#[async_trait]
impl HijackOps for FakeRuntime {
    async fn start_exec_attached(
        &self,
        exec_id: &ExecId,
        _tty: bool,
    ) -> Result<HijackedStream, ExecError> {
        self.record(Call::StartAttached);
        self.exec(exec_id)?;
        if self.refuse_start {
            return Err(ExecError::UpgradeRefused("daemon answered 200".to_string()));
        }
        tokio::time::sleep(self.start_delay).await;

        let (local, mut remote) = tokio::io::duplex(64 * 1024);
        let output = self.output.clone();
        let expect_input = self.expect_input;
        let received = Arc::clone(&self.received_input);
        tokio::spawn(async move {
            let mut input = vec![0u8; expect_input];
            if remote.read_exact(&mut input).await.is_ok() {
                received.lock().extend_from_slice(&input);
            }
            let _ = remote.write_all(&output).await;
        });
        Ok(Box::new(local))
    }
}

/// Terminal with a fixed interactivity and an adjustable size.
pub struct FakeTerminal {
    interactive: bool,
    size: Mutex<Option<TtySize>>,
    input: Mutex<Option<ProbeInput>>,
    raw_mode_requests: Mutex<Vec<bool>>,
}

impl FakeTerminal {
    pub fn new(interactive: bool, size: Option<TtySize>) -> Arc<Self> {
        Arc::new(Self {
            interactive,
            size: Mutex::new(size),
            input: Mutex::new(None),
            raw_mode_requests: Mutex::new(Vec::new()),
        })
    }

    pub fn set_size(&self, size: TtySize) {
        *self.size.lock() = Some(size);
    }

    /// Note, on each raw mode request, whether `input` had been read yet.
    pub fn watch_input(&self, input: &ProbeInput) {
        *self.input.lock() = Some(input.clone());
    }

    /// One entry per raw mode request: was input already read at the time.
    pub fn raw_mode_requests(&self) -> Vec<bool> {
        self.raw_mode_requests.lock().clone()
    }
}

impl LocalTerminal for FakeTerminal {
    fn is_input_terminal(&self) -> bool {
        self.interactive
    }

    fn size(&self) -> Option<TtySize> {
        *self.size.lock()
    }

    fn raw_mode(&self) -> io::Result<Option<RawModeGuard>> {
        let read_already = self
            .input
            .lock()
            .as_ref()
            .is_some_and(|input| input.was_read());
        self.raw_mode_requests.lock().push(read_already);
        Ok(None)
    }
}

/// Output sink whose contents can be read after it was moved into a session.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl AsyncWrite for Capture {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.0.lock().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Input that remembers whether anyone tried to read it.
#[derive(Clone)]
pub struct ProbeInput {
    data: Arc<Mutex<Vec<u8>>>,
    touched: Arc<AtomicBool>,
}

impl ProbeInput {
    pub fn new(data: &[u8]) -> Self {
        Self {
            data: Arc::new(Mutex::new(data.to_vec())),
            touched: Arc::default(),
        }
    }

    pub fn was_read(&self) -> bool {
        self.touched.load(Ordering::SeqCst)
    }
}

impl AsyncRead for ProbeInput {
    fn poll_read(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.touched.store(true, Ordering::SeqCst);
        let mut data = self.data.lock();
        let n = data.len().min(buf.remaining());
        buf.put_slice(&data[..n]);
        data.drain(..n);
        Poll::Ready(Ok(()))
    }
}

/// Local endpoints wired to captures.
pub struct TestStreams {
    pub input: ProbeInput,
    pub output: Capture,
    pub error: Capture,
}

impl TestStreams {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: ProbeInput::new(input),
            output: Capture::default(),
            error: Capture::default(),
        }
    }

    pub fn streams(&self) -> Streams {
        Streams {
            input: Box::new(self.input.clone()),
            output: Box::new(self.output.clone()),
            error: Box::new(self.error.clone()),
        }
    }
}
