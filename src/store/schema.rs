//! SQLite schema for the note store.

use rusqlite::Connection;

/// Current schema version recorded in `schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Creates the database schema.
///
/// Idempotent: calling it on an initialized database is a no-op.
///
/// # Tables Created
/// - `users` - Accounts with one role each
/// - `notes` - Note text, owner and importance flag
/// - `tags` - Normalized tag names
/// - `note_tags` - Many-to-many junction for notes and tags
/// - `attachments` - Original/stored file names per note
/// - `notes_fts` - FTS5 index over note title and content
/// - `schema_version` - Schema version tracking
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            created_at TEXT NOT NULL
        );",
    )?;

    // AUTOINCREMENT keeps ids from being reused after deletion
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            is_important INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS note_tags (
            note_id INTEGER NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (note_id, tag_id)
        );",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS attachments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            note_id INTEGER NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            filename_original TEXT NOT NULL,
            filename_stored TEXT NOT NULL UNIQUE,
            uploaded_at TEXT NOT NULL
        );",
    )?;

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);
         CREATE INDEX IF NOT EXISTS idx_notes_user_title ON notes(user_id, title);
         CREATE INDEX IF NOT EXISTS idx_note_tags_tag ON note_tags(tag_id);
         CREATE INDEX IF NOT EXISTS idx_attachments_note ON attachments(note_id);",
    )?;

    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
            title,
            content,
            content='notes',
            content_rowid='id'
        );",
    )?;

    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS notes_fts_insert
        AFTER INSERT ON notes BEGIN
            INSERT INTO notes_fts(rowid, title, content)
            VALUES (NEW.id, NEW.title, NEW.content);
        END;

        CREATE TRIGGER IF NOT EXISTS notes_fts_delete
        AFTER DELETE ON notes BEGIN
            INSERT INTO notes_fts(notes_fts, rowid, title, content)
            VALUES ('delete', OLD.id, OLD.title, OLD.content);
        END;

        CREATE TRIGGER IF NOT EXISTS notes_fts_update
        AFTER UPDATE OF title, content ON notes BEGIN
            INSERT INTO notes_fts(notes_fts, rowid, title, content)
            VALUES ('delete', OLD.id, OLD.title, OLD.content);
            INSERT INTO notes_fts(rowid, title, content)
            VALUES (NEW.id, NEW.title, NEW.content);
        END;",
    )?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Returns the current schema version.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get(0)
    })
}
