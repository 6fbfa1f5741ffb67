//! Execution output contract
//!
//! [`ExecutionResult`] is what a finished (or terminated) command run looks
//! like to callers: exit code, the full captured transcript in emission order,
//! every mediated prompt, a cancelled flag, and elapsed time. The core
//! persists nothing itself - these types are `Serialize` so an external
//! logging collaborator can write them to durable storage.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of detected prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PromptKind {
    /// Question answerable with yes or no
    YesNo,
    /// Question expecting arbitrary text
    FreeText,
}

/// Default answer inferred from the prompt's own casing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultAnswer {
    /// Capitalized token before the slash, e.g. `(Y/n)`
    Yes,
    /// Capitalized token after the slash, e.g. `(y/N)`
    No,
    /// No casing hint
    None,
}

impl DefaultAnswer {
    /// Reply written to the child when an ask is cancelled
    ///
    /// `None` falls back to the safe answer "n" - declining is always the
    /// conservative choice for an installer prompt.
    #[must_use]
    pub const fn fallback_reply(self) -> &'static str {
        match self {
            Self::Yes => "y",
            Self::No | Self::None => "n",
        }
    }
}

/// One detected and mediated prompt
///
/// Immutable after creation; appended to [`ExecutionResult::prompts`] in
/// emission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptEvent {
    /// Raw line the prompt was detected in
    pub line: String,
    /// Classified kind
    pub kind: PromptKind,
    /// Inferred default answer
    pub default: DefaultAnswer,
    /// Response actually written to the process
    pub response: String,
    /// When the prompt was resolved
    pub timestamp: DateTime<Utc>,
}

/// Outcome of one command run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Process exit code; `None` when the process was force-terminated or
    /// died to a signal before reporting one
    pub exit_code: Option<i32>,
    /// Full captured output, one entry per line, in emission order
    pub output: Vec<String>,
    /// Every mediated prompt, in emission order
    pub prompts: Vec<PromptEvent>,
    /// True when a cancellation signal resolved an outstanding prompt or
    /// terminated the run
    pub cancelled: bool,
    /// Wall-clock time from spawn to finalization
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// Captured output joined back into one newline-separated string
    #[must_use]
    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }

    /// Whether the process reported a zero exit code
    ///
    /// A non-zero code is ordinary result data, never an error raised by the
    /// core; this is a convenience for callers that do want to branch on it.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
