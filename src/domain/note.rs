//! Notes and their outward JSON shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use super::{Attachment, AttachmentId, TagName, UserId};

/// Row identifier of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Replaces CRLF and lone CR line endings with LF.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Values needed to insert a note row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub is_important: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewNote {
    /// A fresh, unflagged note stamped with `now`.
    pub fn new(title: impl Into<String>, content: &str, now: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            content: normalize_newlines(content),
            is_important: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the importance flag.
    pub fn important(mut self, flag: bool) -> Self {
        self.is_important = flag;
        self
    }
}

/// A stored note with its aggregated tag names.
///
/// `updated_at` is optional because rows written by older installations
/// may lack it.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub owner: UserId,
    pub title: String,
    pub content: String,
    pub is_important: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub tags: Vec<TagName>,
}

impl Note {
    /// Returns true if the note carries the trash tag.
    pub fn is_trashed(&self) -> bool {
        self.tags.iter().any(TagName::is_trash)
    }
}

/// Reference to an attachment as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: AttachmentId,
    pub filename: String,
    pub url: String,
}

impl From<&Attachment> for FileRef {
    fn from(att: &Attachment) -> Self {
        Self {
            id: att.id,
            filename: att.original_name.clone(),
            url: att.url(),
        }
    }
}

/// Outward JSON shape of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteView {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub is_important: bool,
    pub tags: Vec<String>,
    pub files: Vec<FileRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NoteView {
    pub fn new(note: Note, attachments: &[Attachment]) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            is_important: note.is_important,
            tags: note.tags.into_iter().map(|t| t.as_str().to_string()).collect(),
            files: attachments.iter().map(FileRef::from).collect(),
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}
