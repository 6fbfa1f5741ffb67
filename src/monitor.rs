//! Concurrent output stream draining
//!
//! [`StreamMonitor`] owns two background reader tasks, one per child stream,
//! that feed completed lines into a single channel. Neither stream's silence
//! can block observation of the other; interleaving across the two streams is
//! best-effort, which matches the underlying tools (they make no cross-stream
//! ordering promise either).

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Which child stream a line arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    /// Child's standard output
    Stdout,
    /// Child's standard error
    Stderr,
}

/// One completed line of child output
#[derive(Debug, Clone)]
pub struct OutputLine {
    /// Stream the line arrived on
    pub source: StreamSource,
    /// Line content, trailing newline stripped
    pub text: String,
}

/// Drains stdout and stderr of one running process, line by line
pub struct StreamMonitor {
    line_rx: mpsc::UnboundedReceiver<OutputLine>,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
}

impl StreamMonitor {
    /// Spawn reader tasks over the child's output handles
    ///
    /// When `cancel` is given, each reader checks it every iteration and stops
    /// draining once it fires - the abort-now path. Without a token the
    /// readers run until EOF regardless of cancellation, which the
    /// answer-and-continue path relies on.
    #[must_use]
    pub fn spawn(
        stdout: ChildStdout,
        stderr: ChildStderr,
        cancel: Option<CancellationToken>,
    ) -> Self {
        let (tx, line_rx) = mpsc::unbounded_channel();
        let stdout_task = spawn_reader(
            BufReader::new(stdout),
            StreamSource::Stdout,
            tx.clone(),
            cancel.clone(),
        );
        let stderr_task = spawn_reader(BufReader::new(stderr), StreamSource::Stderr, tx, cancel);
        Self {
            line_rx,
            stdout_task,
            stderr_task,
        }
    }

    /// Next completed line in arrival order
    ///
    /// Resolves `None` once both streams have closed (or both readers stopped
    /// on cancellation) and every buffered line has been observed.
    pub async fn next_line(&mut self) -> Option<OutputLine> {
        self.line_rx.recv().await
    }
}

impl Drop for StreamMonitor {
    fn drop(&mut self) {
        self.stdout_task.abort();
        self.stderr_task.abort();
    }
}

fn spawn_reader<R>(
    mut reader: BufReader<R>,
    source: StreamSource,
    tx: mpsc::UnboundedSender<OutputLine>,
    cancel: Option<CancellationToken>,
) -> JoinHandle<()>
where
    BufReader<R>: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let mut line = String::new();
            let read = if let Some(ref cancel) = cancel {
                tokio::select! {
                    () = cancel.cancelled() => {
                        log::debug!("{source:?} reader stopping on cancellation");
                        break;
                    }
                    read = reader.read_line(&mut line) => read,
                }
            } else {
                reader.read_line(&mut line).await
            };

            match read {
                Ok(0) => break, // EOF
                Ok(_) => {
                    let text = line.trim_end_matches(['\r', '\n']).to_string();
                    if tx.send(OutputLine { source, text }).is_err() {
                        // Receiver dropped, stop reading
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("{source:?} read failed: {e}");
                    break;
                }
            }
        }
    })
}
