//! Renderer invocation: the only stage that leaves the process.
//!
//! ## Why a trait?
//!
//! The real renderer drives a headless browser and takes seconds per deck.
//! [`RendererInvoker`] is the seam between the handler and that subprocess,
//! so tests can swap in an invoker that never touches a browser.
//!
//! ## Supervision
//!
//! [`ProcessInvoker`] spawns the program with piped stdout/stderr and drains
//! both streams into [`CappedBuffer`]s *while* waiting for the exit status.
//! A full pipe would otherwise stall the child forever. The child is spawned
//! with `kill_on_drop`, so a request future that is dropped mid-flight takes
//! its renderer down with it.
//!
//! On unix the renderer runs in its own process group. A timeout kills the
//! whole group, which includes the browser the renderer launched, so
//! the pipes close and the request fails promptly.

use crate::config::ServiceConfig;
use crate::error::ConvertError;
use crate::pipeline::capture::CappedBuffer;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// How long readers keep collecting output after a timed-out renderer is killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// What a finished renderer left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RendererOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the renderer with a prepared argument vector.
///
/// Implementations return `Ok` whenever the renderer ran to completion,
/// whatever its exit code. `Err` is reserved for failures to run it at all
/// ([`ConvertError::LaunchFailed`]) or to let it finish
/// ([`ConvertError::RendererTimeout`]).
#[async_trait]
pub trait RendererInvoker: Send + Sync {
    async fn invoke(&self, args: &[String]) -> Result<RendererOutput, ConvertError>;
}

/// Invokes the renderer as a child process.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    program: PathBuf,
    timeout: Option<Duration>,
    max_output: usize,
}

impl ProcessInvoker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
            max_output: ServiceConfig::default().max_captured_output,
        }
    }

    /// Build an invoker from the service configuration.
    ///
    /// Bare program names are resolved on `PATH` once, here. A name that
    /// cannot be resolved is kept as-is; the launch then fails per request
    /// with a descriptive [`ConvertError::LaunchFailed`].
    pub fn from_config(config: &ServiceConfig) -> Self {
        let program = match which::which(&config.renderer) {
            Ok(resolved) => {
                debug!(renderer = %resolved.display(), "Resolved renderer program");
                resolved
            }
            Err(e) => {
                warn!(
                    renderer = %config.renderer.display(),
                    "Renderer not found on PATH ({e}); conversions will fail until it is installed"
                );
                config.renderer.clone()
            }
        };
        Self {
            program,
            timeout: config.render_timeout_secs.map(Duration::from_secs),
            max_output: config.max_captured_output,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.max_output = bytes;
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

#[async_trait]
impl RendererInvoker for ProcessInvoker {
    async fn invoke(&self, args: &[String]) -> Result<RendererOutput, ConvertError> {
        debug!(program = %self.program.display(), ?args, "Spawning renderer");

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| ConvertError::LaunchFailed {
            program: self.program.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut out = CappedBuffer::new(self.max_output);
        let mut err = CappedBuffer::new(self.max_output);
        let limit = self.timeout;
        let (killed_tx, killed_rx) = oneshot::channel::<()>();

        let status = async {
            let Some(limit) = limit else {
                drop(killed_tx);
                return child.wait().await.map(Some);
            };
            let waited = tokio::time::timeout(limit, child.wait()).await;
            match waited {
                Ok(status) => {
                    drop(killed_tx);
                    status.map(Some)
                }
                Err(_) => {
                    warn!("Renderer exceeded {:?}, killing its process group", limit);
                    let killed = kill_renderer(&mut child).await;
                    let _ = killed_tx.send(());
                    killed.map(|()| None)
                }
            }
        };

        // Once the renderer is killed, readers get DRAIN_GRACE to collect
        // what is left in the pipes. Anything still holding them open after
        // that is abandoned.
        let drained = async {
            let streams = async {
                tokio::join!(
                    drain(stdout, "stdout", &mut out),
                    drain(stderr, "stderr", &mut err)
                );
            };
            let abandon = async {
                match killed_rx.await {
                    Ok(()) => tokio::time::sleep(DRAIN_GRACE).await,
                    Err(_) => std::future::pending().await,
                }
            };
            tokio::select! {
                () = streams => {}
                () = abandon => debug!("Renderer output still open after kill, keeping what was captured"),
            }
        };

        let (status, ()) = tokio::join!(status, drained);
        let status: Option<ExitStatus> = status
            .map_err(|e| ConvertError::Internal(format!("Failed to wait for renderer: {e}")))?;

        let stdout = out.into_text();
        let stderr = err.into_text();
        match status {
            Some(status) => {
                debug!(exit_code = ?status.code(), "Renderer exited");
                Ok(RendererOutput {
                    exit_code: status.code(),
                    stdout,
                    stderr,
                })
            }
            None => Err(ConvertError::RendererTimeout {
                secs: limit.map(|d| d.as_secs()).unwrap_or_default(),
                stdout,
                stderr,
            }),
        }
    }
}

/// Kill the renderer and everything it spawned.
///
/// The child leads its own process group, so its pid doubles as the group id.
#[cfg(unix)]
async fn kill_renderer(child: &mut Child) -> std::io::Result<()> {
    if let Some(pid) = child.id() {
        // SAFETY: signal delivery only; the target shares no memory with us.
        if unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } != 0 {
            let e = std::io::Error::last_os_error();
            if e.raw_os_error() != Some(libc::ESRCH) {
                warn!("Failed to kill renderer process group {pid}: {e}");
            }
        }
    }
    child.kill().await
}

#[cfg(not(unix))]
async fn kill_renderer(child: &mut Child) -> std::io::Result<()> {
    child.kill().await
}

/// Read a child stream to EOF into `buffer`.
async fn drain<R>(reader: Option<R>, stream: &'static str, buffer: &mut CappedBuffer)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                trace!(stream = stream, "{}", String::from_utf8_lossy(&chunk[..n]).trim_end());
                buffer.push(&chunk[..n]);
            }
            Err(e) => {
                warn!(stream = stream, "Failed to read renderer output: {e}");
                break;
            }
        }
    }
    if buffer.dropped() > 0 {
        debug!(stream = stream, dropped = buffer.dropped(), "Renderer output truncated");
    }
}
