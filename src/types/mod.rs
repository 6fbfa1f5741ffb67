//! Core type definitions
//!
//! Split into submodules by concern: the immutable command description, the
//! execution output contract, and the human-interaction callback aliases.

pub mod callbacks;
pub mod command;
pub mod result;

pub use callbacks::{PromptCallback, SecretCallback, SecretValidator};
pub use command::{Command, CommandBuilder, RECOGNIZED_OVERLAY_KEYS};
pub use result::{DefaultAnswer, ExecutionResult, PromptEvent, PromptKind};
