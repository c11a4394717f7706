//! Fluent wrapper around assert_cmd::Command.

// Allow dead code since this is a test utility shared by several test binaries
#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Fluent wrapper around `assert_cmd::Command` for the `simplynote` binary.
///
/// Provides a builder-style API for constructing and executing CLI commands.
pub struct NoteCommand {
    args: Vec<String>,
}

impl NoteCommand {
    /// Creates a new command for the `simplynote` binary.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Sets `--data-dir`, and points `--config` at a file inside it so the
    /// developer's own config never leaks into a test.
    pub fn data_dir(mut self, path: &Path) -> Self {
        self.args.push("--config".to_string());
        self.args
            .push(path.join("config.toml").to_string_lossy().to_string());
        self.args.push("--data-dir".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    /// Sets `--user`.
    pub fn user(self, name: &str) -> Self {
        self.args(["--user", name])
    }

    /// Adds arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Returns the current arguments (for testing).
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("simplynote").expect("Failed to find simplynote binary");
        cmd.env_remove("RUST_LOG");
        cmd.args(&self.args);
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    /// Configures for the `new` command with a title.
    pub fn new_note(self, title: &str) -> Self {
        self.args(["new", title])
    }

    /// Configures for the `ls` command.
    pub fn ls(self) -> Self {
        self.args(["ls"])
    }

    /// Configures for the `show` command with an ID.
    pub fn show(self, id: i64) -> Self {
        self.args(["show".to_string(), id.to_string()])
    }

    /// Configures for the `tags` command.
    pub fn tags(self) -> Self {
        self.args(["tags"])
    }

    // ===========================================
    // Format Options
    // ===========================================

    /// Adds `--format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }
}

impl Default for NoteCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ===========================================
    // NoteCommand Basics
    // ===========================================

    #[test]
    fn test_command_runs_binary() {
        NoteCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_with_data_dir() {
        let temp = TempDir::new().unwrap();
        let cmd = NoteCommand::new().data_dir(temp.path());
        let args = cmd.get_args();
        assert_eq!(args[0], "--config");
        assert!(args[1].ends_with("config.toml"));
        assert_eq!(args[2], "--data-dir");
        assert_eq!(args[3], temp.path().to_string_lossy());
    }

    #[test]
    fn test_command_shortcuts() {
        let cmd = NoteCommand::new().ls().format_json();
        let args = cmd.get_args();
        assert!(args.contains(&"ls".to_string()));
        assert!(args.contains(&"--format".to_string()));
        assert!(args.contains(&"json".to_string()));
    }
}
