//! Connection management for SqliteStore.

use super::SqliteStore;
use super::transaction::Transaction;
use crate::domain::normalize_tag_name;
use crate::store::{StoreError, StoreResult, create_schema};
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use std::fs;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Applies per-connection settings and the `normalize_tag()` SQL function.
fn configure(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // Readers are not blocked by writers. In-memory databases report "memory".
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.create_scalar_function(
        "normalize_tag",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let raw: Option<String> = ctx.get(0)?;
            Ok(normalize_tag_name(raw.as_deref().unwrap_or("")))
        },
    )?;
    Ok(())
}

impl SqliteStore {
    // ===========================================
    // In-Memory Connection
    // ===========================================

    /// Opens an in-memory database with the store schema.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===========================================
    // File-Based Connection
    // ===========================================

    /// Opens or creates a database at the given path.
    ///
    /// Creates parent directories if they don't exist and initializes the
    /// schema on first use.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        configure(&conn)?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    // ===========================================
    // Connection Accessors
    // ===========================================

    /// Returns a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ===========================================
    // Transaction Support
    // ===========================================

    /// Begins a new transaction that rolls back on drop unless committed.
    pub fn transaction(&mut self) -> StoreResult<Transaction<'_>> {
        Transaction::begin(&self.conn)
    }
}
