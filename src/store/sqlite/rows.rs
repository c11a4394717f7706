//! Row decoding and timestamp encoding.

use crate::domain::{Attachment, AttachmentId, Note, NoteId, Role, TagName, User, UserId};
use crate::store::{StoreError, StoreResult};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::Row;

/// Separator used when aggregating tag names with GROUP_CONCAT.
pub(crate) const TAG_SEPARATOR: char = '\u{1f}';

/// Columns selected by [`NoteRow::from_row`], aggregated with tag names.
pub(crate) const NOTE_COLUMNS: &str = "n.id, n.user_id, n.title, n.content, n.is_important, \
     n.created_at, n.updated_at, GROUP_CONCAT(t.name, char(31)) AS tags";

/// Encodes a timestamp as fixed-width RFC 3339 UTC so that text ordering
/// matches time ordering.
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decodes a stored timestamp. Values without an offset are taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::Corrupt(format!("invalid timestamp '{raw}': {e}")))
}

/// Raw note columns before domain conversion.
pub(crate) struct NoteRow {
    id: i64,
    user_id: i64,
    title: String,
    content: String,
    is_important: bool,
    created_at: String,
    updated_at: Option<String>,
    tags: Option<String>,
}

impl NoteRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            is_important: row.get::<_, i64>(4)? != 0,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            tags: row.get(7)?,
        })
    }

    pub(crate) fn into_note(self) -> StoreResult<Note> {
        let mut tags: Vec<TagName> = self
            .tags
            .as_deref()
            .unwrap_or("")
            .split(TAG_SEPARATOR)
            .filter_map(|name| TagName::new(name).ok())
            .collect();
        tags.sort();
        tags.dedup();

        Ok(Note {
            id: NoteId::new(self.id),
            owner: UserId::new(self.user_id),
            title: self.title,
            content: self.content,
            is_important: self.is_important,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: self
                .updated_at
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(parse_timestamp)
                .transpose()?,
            tags,
        })
    }
}

/// Decodes `id, username, password, role, created_at`.
pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

pub(crate) fn into_user(raw: (i64, String, String, String, String)) -> StoreResult<User> {
    let (id, username, credential_hash, role, created_at) = raw;
    let role: Role = role
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("user {id}: {e}")))?;
    Ok(User {
        id: UserId::new(id),
        username,
        credential_hash,
        role,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Decodes `id, note_id, filename_original, filename_stored, uploaded_at`.
pub(crate) fn attachment_from_row(
    row: &Row<'_>,
) -> rusqlite::Result<(i64, i64, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

pub(crate) fn into_attachment(raw: (i64, i64, String, String, String)) -> StoreResult<Attachment> {
    let (id, note_id, original_name, stored_name, uploaded_at) = raw;
    Ok(Attachment {
        id: AttachmentId::new(id),
        note_id: NoteId::new(note_id),
        original_name,
        stored_name,
        uploaded_at: parse_timestamp(&uploaded_at)?,
    })
}
