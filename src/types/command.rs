//! Command description and builder
//!
//! A [`Command`] is an immutable description of one external process run:
//! argument vector, optional working directory, environment overlay, privilege
//! and interactivity flags, and an optional wall-clock timeout. Construction
//! goes through [`CommandBuilder`]; once built, a command never changes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Environment overlay keys the installers around this core commonly set.
///
/// The core never interprets these - overlay values are opaque strings and
/// unrecognized keys pass through to the child unchanged, so new
/// package-manager flags keep working without a core change. This table
/// exists purely as documentation for callers.
pub const RECOGNIZED_OVERLAY_KEYS: &[&str] = &[
    "DEBIAN_FRONTEND",
    "NEEDRESTART_MODE",
    "DEBIAN_PRIORITY",
    "APT_LISTCHANGES_FRONTEND",
    "LANG",
    "LC_ALL",
    "WINETRICKS_GUI",
    "DISPLAY",
];

/// Immutable description of one external command
#[derive(Debug, Clone)]
pub struct Command {
    argv: Vec<String>,
    cwd: Option<PathBuf>,
    env_overlay: HashMap<String, String>,
    requires_privilege: bool,
    interactive: bool,
    timeout: Option<Duration>,
}

impl Command {
    /// Create a builder starting from the program name
    pub fn builder(program: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            command: Self {
                argv: vec![program.into()],
                cwd: None,
                env_overlay: HashMap::new(),
                requires_privilege: false,
                interactive: false,
                timeout: None,
            },
        }
    }

    /// Full argument vector, program name first
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Program name (first argv entry)
    #[must_use]
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Working directory, if one was set
    #[must_use]
    pub fn cwd(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    /// Environment overlay merged over the inherited environment at spawn
    #[must_use]
    pub fn env_overlay(&self) -> &HashMap<String, String> {
        &self.env_overlay
    }

    /// Whether this command needs a validated privileged credential
    #[must_use]
    pub fn requires_privilege(&self) -> bool {
        self.requires_privilege
    }

    /// Whether output is watched for prompts and mediated line by line
    #[must_use]
    pub fn interactive(&self) -> bool {
        self.interactive
    }

    /// Hard wall-clock bound for the non-interactive path
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`Command`]
#[derive(Debug)]
pub struct CommandBuilder {
    command: Command,
}

impl CommandBuilder {
    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.command.argv.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command.argv.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.command.cwd = Some(path.into());
        self
    }

    /// Set one overlay variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.command.env_overlay.insert(key.into(), value.into());
        self
    }

    /// Merge a map of overlay variables
    #[must_use]
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.command
            .env_overlay
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Mark the command as requiring a validated privileged credential
    #[must_use]
    pub const fn requires_privilege(mut self, required: bool) -> Self {
        self.command.requires_privilege = required;
        self
    }

    /// Run with line-by-line prompt detection and mediation
    #[must_use]
    pub const fn interactive(mut self, interactive: bool) -> Self {
        self.command.interactive = interactive;
        self
    }

    /// Set the wall-clock timeout for the non-interactive path
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.command.timeout = Some(timeout);
        self
    }

    /// Build the immutable command
    #[must_use]
    pub fn build(self) -> Command {
        self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assembles_argv_in_order() {
        let cmd = Command::builder("apt-get")
            .arg("install")
            .args(["-y", "cabextract"])
            .build();
        assert_eq!(cmd.argv(), ["apt-get", "install", "-y", "cabextract"]);
        assert_eq!(cmd.program(), "apt-get");
    }

    #[test]
    fn unrecognized_overlay_keys_are_kept() {
        let cmd = Command::builder("apt-get")
            .env("DEBIAN_FRONTEND", "noninteractive")
            .env("SOME_FUTURE_FLAG", "1")
            .build();
        assert_eq!(
            cmd.env_overlay().get("SOME_FUTURE_FLAG").map(String::as_str),
            Some("1")
        );
        assert!(RECOGNIZED_OVERLAY_KEYS.contains(&"DEBIAN_FRONTEND"));
    }

    #[test]
    fn flags_default_off() {
        let cmd = Command::builder("true").build();
        assert!(!cmd.requires_privilege());
        assert!(!cmd.interactive());
        assert!(cmd.timeout().is_none());
        assert!(cmd.cwd().is_none());
    }
}
