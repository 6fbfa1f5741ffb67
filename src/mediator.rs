//! Prompt mediation
//!
//! [`PromptMediator`] is the rendezvous between a blocked child process and
//! the human-interaction collaborator. Asks are strictly serialized: the
//! monitored process is itself blocked awaiting exactly one answer, so a
//! second ask can never overtake the first.

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::callbacks::PromptCallback;
use crate::types::result::DefaultAnswer;

/// Resolution of one mediated prompt
#[derive(Debug, Clone)]
pub struct MediatedResponse {
    /// Text to write to the child's stdin (newline appended by the caller)
    pub text: String,
    /// True when cancellation, not the collaborator, supplied the text
    pub cancelled: bool,
}

/// Serializes detected prompts and resolves each through the collaborator
pub struct PromptMediator {
    on_prompt: PromptCallback,
    cancel: CancellationToken,
    ask_lock: Mutex<()>,
}

impl PromptMediator {
    /// Create a mediator over the collaborator callback and cancel signal
    #[must_use]
    pub fn new(on_prompt: PromptCallback, cancel: CancellationToken) -> Self {
        Self {
            on_prompt,
            cancel,
            ask_lock: Mutex::new(()),
        }
    }

    /// Resolve one detected prompt
    ///
    /// Suspends until the collaborator answers or the cancellation token
    /// fires; a cancelled ask resolves immediately to the inferred default
    /// (the safe answer "n" when there is none) and is flagged so the caller
    /// marks the run cancelled.
    ///
    /// The wait has no hidden timeout. Cancellation is the only sanctioned way
    /// to stop waiting; callers wanting a deadline cancel the token themselves
    /// after their chosen interval.
    ///
    /// # Errors
    /// Returns [`Collaborator`](crate::VintnerError::Collaborator) or another
    /// error surfaced by the collaborator callback itself.
    pub async fn ask(
        &self,
        prompt_text: &str,
        default_hint: DefaultAnswer,
    ) -> Result<MediatedResponse> {
        let _serialized = self.ask_lock.lock().await;

        if self.cancel.is_cancelled() {
            return Ok(Self::cancelled_response(default_hint));
        }

        log::debug!("mediating prompt: {prompt_text}");
        let answer = (self.on_prompt)(prompt_text.to_string(), default_hint);
        tokio::select! {
            () = self.cancel.cancelled() => {
                log::debug!("ask cancelled, answering with default");
                Ok(Self::cancelled_response(default_hint))
            }
            reply = answer => Ok(MediatedResponse {
                text: reply?,
                cancelled: false,
            }),
        }
    }

    fn cancelled_response(default_hint: DefaultAnswer) -> MediatedResponse {
        MediatedResponse {
            text: default_hint.fallback_reply().to_string(),
            cancelled: true,
        }
    }
}
