//! SQLite-backed note store implementation.

mod cascade;
mod connection;
mod repo_impl;
mod rows;
mod transaction;

#[cfg(test)]
mod tests;

use rusqlite::Connection;

pub(crate) use cascade::delete_notes_in;
pub(crate) use rows::parse_timestamp;
pub use transaction::Transaction;

// ===========================================
// SqliteStore Struct
// ===========================================

/// SQLite-backed note store.
///
/// Each logical operation is expected to open its own store, do its work and
/// drop it; nothing holds a connection across operations.
pub struct SqliteStore {
    pub(crate) conn: Connection,
}
