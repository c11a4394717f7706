//! NoteRepository trait and result types.

use crate::domain::{Attachment, AttachmentId, NewNote, Note, NoteId, Role, TagName, User, UserId};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

// ===========================================
// Errors
// ===========================================

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entity is absent or not owned by the caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The input was rejected before touching the database.
    #[error("{0}")]
    Validation(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A row could not be decoded into a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// An I/O error occurred.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn note_not_found(id: NoteId) -> Self {
        Self::NotFound {
            entity: "note",
            id: id.to_string(),
        }
    }

    pub fn tag_not_found(name: &str) -> Self {
        Self::NotFound {
            entity: "tag",
            id: name.to_string(),
        }
    }

    pub fn attachment_not_found(id: AttachmentId) -> Self {
        Self::NotFound {
            entity: "attachment",
            id: id.to_string(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ===========================================
// Result Types
// ===========================================

/// A tag with the number of the user's non-trashed notes carrying it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TagWithCount {
    pub name: String,
    pub note_count: u32,
}

/// Outcome of a batched note deletion.
///
/// `stored_files` lists the attachment files whose rows were removed; the
/// caller deletes them from disk after the commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletedNotes {
    pub count: usize,
    pub stored_files: Vec<String>,
}

// ===========================================
// NoteRepository Trait
// ===========================================

/// User-scoped access to notes, tags and attachment rows.
///
/// Every note-level method takes the owner; a note id alone never grants
/// access. Single-item methods report a foreign or missing note as
/// `StoreError::NotFound`; batched deletion silently skips foreign ids.
pub trait NoteRepository {
    /// Creates a user. Fails with `Validation` if the username is taken.
    fn create_user(&mut self, username: &str, credential_hash: &str, role: Role)
    -> StoreResult<User>;

    /// Looks up a user by username.
    fn find_user(&self, username: &str) -> StoreResult<Option<User>>;

    /// Inserts a note with no tags and no attachments.
    fn insert_note(&mut self, owner: UserId, note: &NewNote) -> StoreResult<Note>;

    /// Retrieves a single note with its tags.
    fn get_note(&self, owner: UserId, id: NoteId) -> StoreResult<Note>;

    /// Lists the owner's notes, optionally restricted to one tag.
    ///
    /// Ordered by importance, then most recently updated, then insertion order.
    fn list_notes(&self, owner: UserId, tag: Option<&TagName>) -> StoreResult<Vec<Note>>;

    /// Full-text search over title and content, best match first.
    fn search_notes(&self, owner: UserId, query: &str) -> StoreResult<Vec<Note>>;

    /// Returns true if the owner already has a note with exactly this title.
    fn title_exists(&self, owner: UserId, title: &str) -> StoreResult<bool>;

    /// Replaces title and content and stamps `updated_at`.
    fn update_note(
        &mut self,
        owner: UserId,
        id: NoteId,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Note>;

    /// Flips the importance flag and returns the new value.
    fn toggle_important(&mut self, owner: UserId, id: NoteId) -> StoreResult<bool>;

    /// Deletes the owned subset of `ids` together with their attachment rows.
    fn delete_notes(&mut self, owner: UserId, ids: &[NoteId]) -> StoreResult<DeletedNotes>;

    /// Ids of the owner's notes carrying the trash tag.
    fn trashed_note_ids(&self, owner: UserId) -> StoreResult<Vec<NoteId>>;

    /// Links a tag to a note, creating the tag if needed. Idempotent.
    ///
    /// Returns the note's tags afterwards.
    fn attach_tag(&mut self, owner: UserId, id: NoteId, tag: &TagName)
    -> StoreResult<Vec<TagName>>;

    /// Unlinks a tag from a note. The tag row itself is left for the sweeper.
    ///
    /// Returns the note's tags afterwards.
    fn detach_tag(&mut self, owner: UserId, id: NoteId, tag: &TagName)
    -> StoreResult<Vec<TagName>>;

    /// Lists the owner's tags with counts that ignore trashed notes.
    fn list_tags(&self, owner: UserId) -> StoreResult<Vec<TagWithCount>>;

    /// Records an attachment row for an already-stored file.
    fn add_attachment(
        &mut self,
        owner: UserId,
        note: NoteId,
        original_name: &str,
        stored_name: &str,
        uploaded_at: DateTime<Utc>,
    ) -> StoreResult<Attachment>;

    /// Lists a note's attachments in upload order.
    fn note_attachments(&self, owner: UserId, note: NoteId) -> StoreResult<Vec<Attachment>>;

    /// Deletes an attachment row and returns it so the caller can release the file.
    fn delete_attachment(&mut self, owner: UserId, id: AttachmentId) -> StoreResult<Attachment>;
}
