//! Test harness for CLI integration tests.
//!
//! Provides isolated data directories and CLI assertion helpers using
//! `assert_cmd`.

mod command;
mod env;

// Re-export main types for external use
#[allow(unused_imports)]
pub use command::NoteCommand;
#[allow(unused_imports)]
pub use env::TestEnv;
