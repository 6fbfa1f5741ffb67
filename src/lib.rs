//! # vintner-exec
//!
//! Command execution and interactive-prompt mediation core for the Vintner
//! Windows-app installer. The crate runs external processes - package
//! managers, compatibility-layer tooling - whose output may unexpectedly
//! demand human input, detects that condition in real time, routes the
//! decision to a human-interaction collaborator without hanging the process,
//! and manages the one cached privileged credential some of those processes
//! need.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vintner_exec::{Command, CommandRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = CommandRunner::new(Arc::new(|prompt, _default| {
//!         Box::pin(async move {
//!             log::info!("tool asked: {prompt}");
//!             Ok("y".to_string())
//!         })
//!     }));
//!
//!     let cmd = Command::builder("winetricks")
//!         .arg("corefonts")
//!         .env("WINETRICKS_GUI", "none")
//!         .interactive(true)
//!         .build();
//!
//!     let result = runner.run(&cmd).await?;
//!     log::info!("exit: {:?}, prompts: {}", result.exit_code, result.prompts.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`runner`]: [`CommandRunner`], the top-level entry point
//! - [`monitor`]: [`StreamMonitor`], concurrent stdout/stderr draining
//! - [`classifier`]: pure output-line prompt classification
//! - [`mediator`]: [`PromptMediator`], serialized prompt resolution
//! - [`credentials`]: [`CredentialBroker`], the session's privileged secret
//! - [`types`]: the command description and the execution output contract
//! - [`error`]: error types and handling
//!
//! The core persists nothing. [`ExecutionResult`] is `Serialize` so an
//! external logging collaborator can write it wherever it pleases; the
//! [`Secret`](credentials::Secret) deliberately is not.
//!
//! ## Limitations
//!
//! Prompt detection matches English tool output only. Under localized output
//! a missed prompt surfaces as a stall, which callers diagnose through their
//! own cancellation or, on the non-interactive path, the wall-clock timeout.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classifier;
pub mod credentials;
pub mod error;
pub mod mediator;
pub mod monitor;
pub mod runner;
pub mod types;

// Re-export commonly used types for a flat public API
pub use classifier::{Classification, classify};
pub use credentials::{CredentialBroker, Secret, sudo_probe_validator};
pub use error::{Result, VintnerError};
pub use mediator::{MediatedResponse, PromptMediator};
pub use monitor::{OutputLine, StreamMonitor, StreamSource};
pub use runner::{CancelMode, CommandRunner};
pub use types::callbacks::{PromptCallback, SecretCallback, SecretValidator};
pub use types::command::{Command, CommandBuilder, RECOGNIZED_OVERLAY_KEYS};
pub use types::result::{DefaultAnswer, ExecutionResult, PromptEvent, PromptKind};
