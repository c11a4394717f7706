//! Archive Exporter.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ATTACHMENT_NAME_MAX_LEN, ATTACHMENTS_DIR, ArchiveResult, NoteTrailer, note_stem, to_zip_time};
use crate::domain::UserId;
use crate::infra::{AttachmentStore, dedup_name, sanitize_filename};
use crate::store::NoteRepository;

/// Download name for an export made on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("simplynote_export_{}.zip", date.format("%Y%m%d"))
}

/// Download name for an export made today, in local time.
pub fn export_filename_today() -> String {
    export_filename(Local::now().date_naive())
}

/// Writes every note of `owner` into a deflate-compressed zip archive.
///
/// Each note becomes a text entry stamped with its `updated_at` (or `now`
/// when absent). Attachments whose bytes are missing from the store are left
/// out.
pub fn export_archive<R, S>(
    repo: &R,
    files: &S,
    owner: UserId,
    now: DateTime<Utc>,
) -> ArchiveResult<Vec<u8>>
where
    R: NoteRepository + ?Sized,
    S: AttachmentStore + ?Sized,
{
    let mut notes = repo.list_notes(owner, None)?;
    notes.sort_by_key(|note| note.id);

    let base = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let export_time = to_zip_time(now).unwrap_or_default();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut attachment_count = 0usize;

    for note in &notes {
        let stem = note_stem(note.id, &note.title);

        let trailer = NoteTrailer::new(
            note.tags.iter().map(|t| t.as_str().to_string()).collect(),
            note.is_important,
        );
        let modified = note
            .updated_at
            .and_then(to_zip_time)
            .unwrap_or(export_time);

        zip.start_file(format!("{stem}.txt"), base.last_modified_time(modified))?;
        zip.write_all(trailer.encode(&note.content).as_bytes())?;

        let dir = format!("{ATTACHMENTS_DIR}{stem}/");
        let mut written = HashSet::new();
        for attachment in repo.note_attachments(owner, note.id)? {
            let Some(bytes) = files.get(&attachment.stored_name)? else {
                debug!(
                    note = %note.id,
                    stored = %attachment.stored_name,
                    "attachment file missing, not exported"
                );
                continue;
            };

            let name = dedup_name(
                &sanitize_filename(&attachment.original_name, ATTACHMENT_NAME_MAX_LEN),
                &mut written,
            );
            zip.start_file(format!("{dir}{name}"), base.last_modified_time(export_time))?;
            zip.write_all(&bytes)?;
            attachment_count += 1;
        }
    }

    let bytes = zip.finish()?.into_inner();
    info!(
        user = %owner,
        notes = notes.len(),
        attachments = attachment_count,
        size = bytes.len(),
        "exported archive"
    );
    Ok(bytes)
}
