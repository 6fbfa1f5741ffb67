//! Privileged credential management
//!
//! [`CredentialBroker`] owns the one privileged secret of a session: it
//! collects the secret through the human-interaction collaborator, validates
//! it with a harmless privileged probe before trusting it, caches it in
//! memory, and permanently fails after the retry budget is spent. The secret
//! never leaves this module except through [`Secret`], which redacts its
//! `Debug` output and derives no serialization.

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{Result, VintnerError};
use crate::types::callbacks::{SecretCallback, SecretValidator};

/// Validation attempts allowed before the broker permanently fails
pub const MAX_ATTEMPTS: u32 = 3;

/// Opaque validated secret
///
/// Cloning hands the caller a copy of the value for feeding a child's stdin;
/// it is never logged, serialized, or stored in an
/// [`ExecutionResult`](crate::ExecutionResult).
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    /// The raw secret value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

enum BrokerState {
    Uncollected,
    Validated(Secret),
    Failed,
}

struct BrokerSlot {
    state: BrokerState,
    attempts: u32,
}

/// Single-owner broker for the session's privileged credential
pub struct CredentialBroker {
    collect: SecretCallback,
    validate: SecretValidator,
    slot: Mutex<BrokerSlot>,
}

impl CredentialBroker {
    /// Create a broker validating through the sudo probe
    #[must_use]
    pub fn new(collect: SecretCallback) -> Self {
        Self::with_validator(collect, sudo_probe_validator())
    }

    /// Create a broker with a custom validator
    ///
    /// Used by embedders that elevate through something other than sudo, and
    /// by tests substituting a scripted probe.
    #[must_use]
    pub fn with_validator(collect: SecretCallback, validate: SecretValidator) -> Self {
        Self {
            collect,
            validate,
            slot: Mutex::new(BrokerSlot {
                state: BrokerState::Uncollected,
                attempts: 0,
            }),
        }
    }

    /// Obtain the validated secret, collecting and validating on first use
    ///
    /// The slot mutex is held across collection and validation, so concurrent
    /// callers never validate simultaneously: the first caller wins and the
    /// rest wake up to its cached result or its permanent failure.
    ///
    /// # Errors
    /// Returns [`Authentication`](VintnerError::Authentication) when the
    /// retry budget is spent, the user cancelled collection, or the broker
    /// already failed permanently this session.
    pub async fn get_secret(&self) -> Result<Secret> {
        let mut slot = self.slot.lock().await;

        match &slot.state {
            BrokerState::Validated(secret) => return Ok(secret.clone()),
            BrokerState::Failed => {
                return Err(VintnerError::authentication(
                    "credential validation already failed permanently this session",
                ));
            }
            BrokerState::Uncollected => {}
        }

        let mut prior_failure: Option<String> = None;
        while slot.attempts < MAX_ATTEMPTS {
            slot.attempts += 1;
            let attempt = slot.attempts;

            let Some(candidate) = (self.collect)(attempt, prior_failure.take()).await? else {
                log::debug!("secret collection cancelled on attempt {attempt}");
                return Err(VintnerError::authentication(
                    "secret collection cancelled by user",
                ));
            };

            if (self.validate)(candidate.clone()).await? {
                log::debug!("credential validated on attempt {attempt}");
                let secret = Secret(candidate);
                slot.state = BrokerState::Validated(secret.clone());
                return Ok(secret);
            }

            log::warn!("credential validation failed on attempt {attempt}");
            prior_failure = Some(format!("validation failed on attempt {attempt}"));
        }

        slot.state = BrokerState::Failed;
        Err(VintnerError::authentication(format!(
            "credential rejected {MAX_ATTEMPTS} times, not prompting again this session"
        )))
    }

    /// Drop a validated cache, forcing the next call to re-collect
    ///
    /// Called on detected privilege expiry. Resets the attempt budget for the
    /// fresh collection cycle. A permanently failed broker stays failed.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        if matches!(slot.state, BrokerState::Validated(_)) {
            log::debug!("cached credential invalidated");
            slot.state = BrokerState::Uncollected;
            slot.attempts = 0;
        }
    }
}

/// Validator probing with `sudo -S -k true`
///
/// `-k` discards any cached sudo timestamp so the probe genuinely exercises
/// the secret, `-S` reads it from stdin, and the empty `-p` keeps sudo's own
/// prompt out of the child's stderr.
#[must_use]
pub fn sudo_probe_validator() -> SecretValidator {
    Arc::new(|secret: String| {
        Box::pin(async move {
            let mut child = tokio::process::Command::new("sudo")
                .args(["-S", "-k", "-p", "", "true"])
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| VintnerError::spawn(format!("sudo: {e}")))?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(secret.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await?;
            }

            let status = child.wait().await?;
            Ok(status.success())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret("hunter2".to_string());
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
    }
}
