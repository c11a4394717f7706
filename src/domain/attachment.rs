//! Attachment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use super::NoteId;

/// URL prefix under which stored attachment bytes are served.
pub const FILES_URL_PREFIX: &str = "/files/";

/// Row identifier of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(i64);

impl AttachmentId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttachmentId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// An uploaded file owned by one note.
///
/// `stored_name` is the opaque on-disk name; it is unique across the whole
/// store and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub note_id: NoteId,
    pub original_name: String,
    pub stored_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Attachment {
    /// Stable URL of the stored bytes.
    pub fn url(&self) -> String {
        format!("{FILES_URL_PREFIX}{}", self.stored_name)
    }
}
