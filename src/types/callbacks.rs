//! Human-interaction collaborator callback aliases
//!
//! The core never talks to a user directly. Whoever embeds it - a graphical
//! dialog, a terminal fallback, a scripted test double - supplies these
//! callbacks, and the core reaches them only through message-passing
//! rendezvous inside [`PromptMediator`](crate::mediator::PromptMediator) and
//! [`CredentialBroker`](crate::credentials::CredentialBroker).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;
use crate::types::result::DefaultAnswer;

/// Callback answering one detected prompt
///
/// Called with the raw prompt text and the inferred default; returns the
/// response string to write to the process (without trailing newline).
pub type PromptCallback = Arc<
    dyn Fn(String, DefaultAnswer) -> Pin<Box<dyn Future<Output = Result<String>> + Send>>
        + Send
        + Sync,
>;

/// Callback collecting the privileged secret
///
/// Called with the 1-based attempt number and the prior failure reason, if
/// any. Returns `Ok(None)` when the user explicitly cancels collection.
pub type SecretCallback = Arc<
    dyn Fn(u32, Option<String>) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send>>
        + Send
        + Sync,
>;

/// Callback validating a collected secret with a harmless privileged probe
///
/// Returns `Ok(true)` when the secret grants privilege, `Ok(false)` when it
/// was rejected, `Err` only for probe infrastructure failures.
pub type SecretValidator =
    Arc<dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<bool>> + Send>> + Send + Sync>;
