//! Portable zip archive of a user's notes.
//!
//! Layout of an archive:
//!
//! ```text
//! 7`Grocery List.txt                    note body + optional trailer
//! attachments/7`Grocery List/receipt.png
//! ```
//!
//! The number before the backtick is the note id at export time. On import
//! it is only used to find the note's attachment directory; new ids are
//! assigned.

pub mod export;
pub mod import;
mod trailer;

pub use export::{export_archive, export_filename};
pub use import::{ImportReport, import_archive};
pub use trailer::NoteTrailer;

use std::io;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use thiserror::Error;
use zip::result::ZipError;

use crate::domain::NoteId;
use crate::infra::{AttachmentError, sanitize_filename};
use crate::store::StoreError;

/// Separates the originating note id from the title in entry names.
pub const ID_SEPARATOR: char = '`';

/// Directory holding per-note attachment directories.
pub const ATTACHMENTS_DIR: &str = "attachments/";

/// Maximum length of the sanitized title in entry names.
pub const TITLE_MAX_LEN: usize = 80;

/// Maximum length of a sanitized attachment name.
pub const ATTACHMENT_NAME_MAX_LEN: usize = 100;

/// Extensions of entries read back as notes.
const TEXT_EXTENSIONS: [&str; 2] = [".txt", ".md"];

/// Errors raised while writing or reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Only ZIP files are supported.")]
    NotAnArchive,

    #[error("zip error: {0}")]
    Zip(#[from] ZipError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error("archive I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// `"{id}`{sanitized title}"`, shared by the text entry and attachment directory.
pub fn note_stem(id: NoteId, title: &str) -> String {
    format!(
        "{id}{ID_SEPARATOR}{}",
        sanitize_filename(title, TITLE_MAX_LEN)
    )
}

/// Attachment path prefix for notes exported with `origin_id`.
pub fn attachment_prefix(origin_id: &str) -> String {
    format!("{ATTACHMENTS_DIR}{origin_id}{ID_SEPARATOR}")
}

/// Title and originating id recovered from a text entry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryName {
    pub origin_id: Option<String>,
    pub title: String,
}

impl EntryName {
    /// Parses a text entry path; `None` for anything that is not `.txt`/`.md`.
    pub fn parse(path: &str) -> Option<Self> {
        if !TEXT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return None;
        }

        let file = path.rsplit('/').next().unwrap_or(path);
        let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);

        Some(match stem.split_once(ID_SEPARATOR) {
            Some((id, title)) => Self {
                origin_id: Some(id.to_string()).filter(|id| !id.is_empty()),
                title: title.to_string(),
            },
            None => Self {
                origin_id: None,
                title: stem.to_string(),
            },
        })
    }
}

/// Converts a UTC instant to a zip entry timestamp.
///
/// Zip timestamps have two-second resolution and cover 1980..=2107.
pub fn to_zip_time(ts: DateTime<Utc>) -> Option<zip::DateTime> {
    let year = u16::try_from(ts.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        ts.month() as u8,
        ts.day() as u8,
        ts.hour() as u8,
        ts.minute() as u8,
        ts.second() as u8,
    )
    .ok()
}

/// Reads a zip entry timestamp as wall-clock time in `tz` and converts it to UTC.
///
/// Wall-clock times skipped by a DST transition fall back to UTC.
pub fn from_zip_time<Tz: TimeZone>(zt: zip::DateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(i32::from(zt.year()), zt.month().into(), zt.day().into())?
        .and_hms_opt(zt.hour().into(), zt.minute().into(), zt.second().into())?;
    Some(
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    )
}
