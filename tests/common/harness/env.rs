//! Isolated test environment with temp data directory.

// Allow dead code since this is a test utility shared by several test binaries
#![allow(dead_code)]

use super::NoteCommand;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment with a temporary data directory.
///
/// The directory holds the database, the upload directory and an (empty)
/// config file, and is removed when the environment is dropped.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    data_dir: PathBuf,
}

impl TestEnv {
    /// Creates a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().to_path_buf();
        let env = Self {
            _temp_dir: temp_dir,
            data_dir,
        };
        env.write_config("");
        env
    }

    /// Returns the path to the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the path of the SQLite database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("simplynote.db")
    }

    /// Returns the upload directory.
    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("files")
    }

    /// Replaces the config file used by every command of this environment.
    pub fn write_config(&self, contents: &str) {
        self.write_file("config.toml", contents.as_bytes());
    }

    /// Writes a file to the test environment and returns its path.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.data_dir.join(name);
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Creates a NoteCommand configured for this test environment.
    pub fn cmd(&self) -> NoteCommand {
        NoteCommand::new().data_dir(&self.data_dir)
    }

    /// Creates a NoteCommand acting as `user`.
    pub fn cmd_as(&self, user: &str) -> NoteCommand {
        self.cmd().user(user)
    }

    /// Creates a user account through the CLI.
    pub fn add_user(&self, name: &str) {
        self.cmd()
            .args(["user", "add", name, "--password", "secret"])
            .assert()
            .success();
    }

    /// Creates a note through the CLI and returns its id.
    pub fn add_note(&self, user: &str, title: &str, content: &str) -> i64 {
        let created: Value = self
            .cmd_as(user)
            .new_note(title)
            .args(["--content", content])
            .format_json()
            .output_json();
        created["data"]["id"].as_i64().expect("note id in output")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // TestEnv Foundation
    // ===========================================

    #[test]
    fn test_env_creates_temp_directory() {
        let env = TestEnv::new();
        assert!(env.data_dir().is_dir());
        assert!(env.data_dir().join("config.toml").exists());
    }

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.data_dir().to_path_buf()
        };
        assert!(
            !path.exists(),
            "temp directory should be cleaned up on drop"
        );
    }

    #[test]
    fn test_env_paths_live_in_data_dir() {
        let env = TestEnv::new();
        assert!(env.db_path().starts_with(env.data_dir()));
        assert!(env.upload_dir().ends_with("files"));
    }

    #[test]
    fn test_env_add_note_returns_id() {
        let env = TestEnv::new();
        env.add_user("alice");
        let id = env.add_note("alice", "First", "body");
        assert!(id > 0);
        assert!(env.db_path().exists());
    }
}
