//! Top-level command execution
//!
//! [`CommandRunner`] prepares the environment, optionally acquires the
//! privileged credential, spawns the process, and runs it in plain or
//! interactive mode. It renders judgment on nothing: a non-zero exit code is
//! ordinary result data for the caller, and retry policy lives in the
//! orchestration layer above.

use std::collections::HashMap;
use std::ffi::OsString;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio_util::sync::CancellationToken;

use crate::classifier::{Classification, classify};
use crate::credentials::CredentialBroker;
use crate::error::{Result, VintnerError};
use crate::mediator::PromptMediator;
use crate::monitor::StreamMonitor;
use crate::types::callbacks::PromptCallback;
use crate::types::command::Command;
use crate::types::result::{DefaultAnswer, ExecutionResult, PromptEvent, PromptKind};

/// What a fired cancellation signal means for a running command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelMode {
    /// Resolve the outstanding prompt with its default and let the process
    /// run to completion; the result comes back `cancelled = true`
    AnswerDefault,
    /// Stop draining, kill the process, and return
    /// [`Cancelled`](VintnerError::Cancelled) with the partial result
    Abort,
}

/// Elevation prefix prepended to privileged argv: `sudo -S` reading the
/// secret from stdin, with sudo's own prompt suppressed.
const DEFAULT_PRIVILEGE_PREFIX: &[&str] = &["sudo", "-S", "-p", ""];

/// Executes commands, mediating prompts and privilege
pub struct CommandRunner {
    on_prompt: PromptCallback,
    broker: Option<Arc<CredentialBroker>>,
    cancel: CancellationToken,
    cancel_mode: CancelMode,
    privilege_prefix: Vec<String>,
}

impl CommandRunner {
    /// Create a runner answering prompts through the given collaborator
    #[must_use]
    pub fn new(on_prompt: PromptCallback) -> Self {
        Self {
            on_prompt,
            broker: None,
            cancel: CancellationToken::new(),
            cancel_mode: CancelMode::AnswerDefault,
            privilege_prefix: DEFAULT_PRIVILEGE_PREFIX
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Attach the credential broker required by privileged commands
    #[must_use]
    pub fn with_broker(mut self, broker: Arc<CredentialBroker>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Attach an external cancellation token and its interpretation
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken, mode: CancelMode) -> Self {
        self.cancel = cancel;
        self.cancel_mode = mode;
        self
    }

    /// Replace the elevation prefix wrapped around privileged argv
    ///
    /// An empty prefix runs the command directly while still delivering the
    /// secret on stdin; embedders using doas or pkexec substitute theirs here.
    #[must_use]
    pub fn with_privilege_prefix<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.privilege_prefix = prefix.into_iter().map(Into::into).collect();
        self
    }

    /// Run one command to completion
    ///
    /// Suspends the caller until the process terminates or is cancelled. Each
    /// call produces an independent [`ExecutionResult`]; the only state shared
    /// across calls is the broker's cached credential.
    ///
    /// # Errors
    /// - [`Authentication`](VintnerError::Authentication) when a privileged
    ///   command cannot obtain a validated secret
    /// - [`ProcessSpawn`](VintnerError::ProcessSpawn) when the executable is
    ///   missing or unrunnable
    /// - [`Timeout`](VintnerError::Timeout) when the non-interactive path
    ///   exceeds its wall-clock bound, carrying the partial result
    /// - [`Cancelled`](VintnerError::Cancelled) when an interactive run is
    ///   aborted, carrying the partial result
    pub async fn run(&self, cmd: &Command) -> Result<ExecutionResult> {
        let secret = if cmd.requires_privilege() {
            let broker = self.broker.as_ref().ok_or_else(|| {
                VintnerError::authentication("privileged command issued without a credential broker")
            })?;
            Some(broker.get_secret().await?)
        } else {
            None
        };

        let mut argv: Vec<String> = Vec::new();
        if secret.is_some() {
            argv.extend(self.privilege_prefix.iter().cloned());
        }
        argv.extend(cmd.argv().iter().cloned());
        let program = &argv[0];

        let resolved = which::which(program)
            .map_err(|e| VintnerError::spawn(format!("{program}: {e}")))?;

        // Overlay merges over the inherited environment; unknown keys pass
        // through untouched.
        let env = merged_env(std::env::vars_os(), cmd.env_overlay());

        let mut command = tokio::process::Command::new(&resolved);
        command
            .args(&argv[1..])
            .env_clear()
            .envs(&env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = cmd.cwd() {
            command.current_dir(cwd);
        }

        log::debug!("spawning {program} (interactive: {})", cmd.interactive());
        let started = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|e| VintnerError::spawn(format!("{program}: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VintnerError::spawn("failed to get stdin handle".to_string()))?;

        if let Some(ref secret) = secret {
            stdin.write_all(secret.expose().as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;
        }

        if cmd.interactive() {
            self.run_interactive(child, stdin, started).await
        } else {
            // Close stdin so a prompt that slipped past the suppression
            // overlay reads EOF instead of blocking forever.
            drop(stdin);
            Self::run_plain(cmd, child, started).await
        }
    }

    /// Non-interactive path: drain to completion under the wall-clock bound
    ///
    /// Trusts prevention - no prompt detection happens here, so a stall is
    /// only diagnosable by the timeout.
    async fn run_plain(
        cmd: &Command,
        mut child: Child,
        started: Instant,
    ) -> Result<ExecutionResult> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VintnerError::spawn("failed to get stdout handle".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| VintnerError::spawn("failed to get stderr handle".to_string()))?;

        let deadline = cmd
            .timeout()
            .map(|bound| tokio::time::Instant::now() + bound);
        let mut monitor = StreamMonitor::spawn(stdout, stderr, None);
        let mut acc = ResultAccumulator::new(started);

        loop {
            let line = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, monitor.next_line()).await {
                        Ok(line) => line,
                        Err(_) => return Err(Self::kill_on_timeout(cmd, &mut child, acc).await),
                    }
                }
                None => monitor.next_line().await,
            };
            match line {
                Some(line) => acc.push_line(line.text),
                None => break,
            }
        }

        let status = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, child.wait()).await {
                Ok(status) => status?,
                Err(_) => return Err(Self::kill_on_timeout(cmd, &mut child, acc).await),
            },
            None => child.wait().await?,
        };

        Ok(acc.finish(status.code()))
    }

    async fn kill_on_timeout(
        cmd: &Command,
        child: &mut Child,
        acc: ResultAccumulator,
    ) -> VintnerError {
        log::warn!("command exceeded its {:?} bound, killing", cmd.timeout());
        let _ = child.start_kill();
        let _ = child.wait().await;
        let elapsed = acc.started.elapsed();
        VintnerError::timeout(elapsed, acc.finish(None))
    }

    /// Interactive path: line-by-line monitoring with prompt mediation
    async fn run_interactive(
        &self,
        mut child: Child,
        mut stdin: ChildStdin,
        started: Instant,
    ) -> Result<ExecutionResult> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| VintnerError::spawn("failed to get stdout handle".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| VintnerError::spawn("failed to get stderr handle".to_string()))?;

        let abort = self.cancel_mode == CancelMode::Abort;
        let monitor_cancel = abort.then(|| self.cancel.clone());
        let mut monitor = StreamMonitor::spawn(stdout, stderr, monitor_cancel);
        let mediator = PromptMediator::new(self.on_prompt.clone(), self.cancel.clone());
        let mut acc = ResultAccumulator::new(started);

        while let Some(line) = monitor.next_line().await {
            acc.push_line(line.text.clone());

            let (kind, default) = match classify(&line.text) {
                Classification::None => continue,
                Classification::YesNo(default) => (PromptKind::YesNo, default),
                Classification::FreeText => (PromptKind::FreeText, DefaultAnswer::None),
            };

            let response = mediator.ask(&line.text, default).await?;
            if response.cancelled {
                acc.cancelled = true;
                if abort {
                    break;
                }
            }

            stdin.write_all(response.text.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;

            acc.push_prompt(PromptEvent {
                line: line.text,
                kind,
                default,
                response: response.text,
                timestamp: Utc::now(),
            });
        }

        if abort && self.cancel.is_cancelled() {
            log::debug!("aborting interactive command on cancellation");
            let _ = child.start_kill();
            let _ = child.wait().await;
            acc.cancelled = true;
            return Err(VintnerError::cancelled(acc.finish(None)));
        }

        drop(stdin);
        let status = child.wait().await?;
        Ok(acc.finish(status.code()))
    }
}

/// Merge the overlay over the inherited environment
///
/// Values stay opaque OS strings end to end: an inherited variable holding
/// non-UTF-8 bytes passes through to the child unchanged instead of breaking
/// the spawn.
fn merged_env<I>(base: I, overlay: &HashMap<String, String>) -> HashMap<OsString, OsString>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: HashMap<OsString, OsString> = base.into_iter().collect();
    env.extend(
        overlay
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v))),
    );
    env
}

/// In-flight result state, finalized exactly once by [`finish`]
///
/// [`finish`]: ResultAccumulator::finish
struct ResultAccumulator {
    started: Instant,
    output: Vec<String>,
    prompts: Vec<PromptEvent>,
    cancelled: bool,
}

impl ResultAccumulator {
    fn new(started: Instant) -> Self {
        Self {
            started,
            output: Vec::new(),
            prompts: Vec::new(),
            cancelled: false,
        }
    }

    fn push_line(&mut self, text: String) {
        log::trace!("captured: {text}");
        self.output.push(text);
    }

    fn push_prompt(&mut self, event: PromptEvent) {
        self.prompts.push(event);
    }

    fn finish(self, exit_code: Option<i32>) -> ExecutionResult {
        ExecutionResult {
            exit_code,
            output: self.output,
            prompts: self.prompts,
            cancelled: self.cancelled,
            elapsed: self.started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn overlay_wins_over_inherited_values() {
        let base = vec![
            (OsString::from("LANG"), OsString::from("de_DE.UTF-8")),
            (OsString::from("HOME"), OsString::from("/home/u")),
        ];
        let mut overlay = HashMap::new();
        overlay.insert("LANG".to_string(), "C".to_string());

        let merged = merged_env(base, &overlay);
        assert_eq!(merged.get(OsStr::new("LANG")), Some(&OsString::from("C")));
        assert_eq!(
            merged.get(OsStr::new("HOME")),
            Some(&OsString::from("/home/u"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_inherited_value_passes_through() {
        use std::os::unix::ffi::OsStringExt;

        let odd = OsString::from_vec(vec![0x66, 0xff, 0x6f]);
        let base = vec![(OsString::from("ODD_BYTES"), odd.clone())];

        let merged = merged_env(base, &HashMap::new());
        assert_eq!(merged.get(OsStr::new("ODD_BYTES")), Some(&odd));
    }
}
