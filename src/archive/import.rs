//! Archive Importer.

use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};

use chrono::{TimeZone, Utc};
use serde::Serialize;
use tracing::{info, warn};
use zip::ZipArchive;

use super::{ATTACHMENTS_DIR, ArchiveError, ArchiveResult, EntryName, NoteTrailer, attachment_prefix, from_zip_time};
use crate::domain::{NewNote, NoteId, TagName, UserId, normalize_newlines};
use crate::infra::{AttachmentError, AttachmentStore};
use crate::store::NoteRepository;

/// Outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub message: String,
}

impl ImportReport {
    fn new(imported: usize, skipped: usize) -> Self {
        Self {
            imported,
            skipped,
            message: format!("{imported} notes imported successfully, {skipped} skipped."),
        }
    }
}

/// Returns true if the upload name looks like a zip archive.
pub fn is_zip_name(upload_name: &str) -> bool {
    upload_name.to_ascii_lowercase().ends_with(".zip")
}

/// Reads an uploaded archive into notes, tags and attachments of `owner`.
///
/// Entry timestamps are read as wall-clock time in `tz`. Notes are committed
/// one by one: an error partway through keeps the notes imported before it.
/// The upload is rejected with [`ArchiveError::NotAnArchive`] before anything
/// is written if its name or bytes are not a zip archive.
pub fn import_archive<R, S, Tz>(
    repo: &mut R,
    files: &S,
    owner: UserId,
    upload_name: &str,
    bytes: &[u8],
    tz: &Tz,
) -> ArchiveResult<ImportReport>
where
    R: NoteRepository + ?Sized,
    S: AttachmentStore + ?Sized,
    Tz: TimeZone,
{
    if !is_zip_name(upload_name) {
        return Err(ArchiveError::NotAnArchive);
    }
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|_| ArchiveError::NotAnArchive)?;

    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).map(|file| file.name().to_string()))
        .collect::<Result<_, _>>()?;

    let mut tally = Tally::default();
    if let Err(err) = import_entries(repo, files, owner, &mut archive, &names, tz, &mut tally) {
        warn!(
            user = %owner,
            imported = tally.imported,
            skipped = tally.skipped,
            error = %err,
            "import stopped partway"
        );
        return Err(err);
    }

    let report = ImportReport::new(tally.imported, tally.skipped);
    info!(user = %owner, imported = tally.imported, skipped = tally.skipped, "imported archive");
    Ok(report)
}

/// Notes committed so far.
#[derive(Debug, Default)]
struct Tally {
    imported: usize,
    skipped: usize,
}

fn import_entries<R, S, A, Tz>(
    repo: &mut R,
    files: &S,
    owner: UserId,
    archive: &mut ZipArchive<A>,
    names: &[String],
    tz: &Tz,
    tally: &mut Tally,
) -> ArchiveResult<()>
where
    R: NoteRepository + ?Sized,
    S: AttachmentStore + ?Sized,
    A: Read + Seek,
    Tz: TimeZone,
{
    let mut consumed: HashSet<usize> = HashSet::new();

    for (index, path) in names.iter().enumerate() {
        if consumed.contains(&index) || path.starts_with(ATTACHMENTS_DIR) {
            continue;
        }
        let Some(entry) = EntryName::parse(path) else {
            continue;
        };

        let (raw, modified) = read_entry(archive, index)?;
        let Ok(text) = String::from_utf8(raw) else {
            info!(entry = %path, "import skip: not UTF-8");
            tally.skipped += 1;
            continue;
        };

        let timestamp = from_zip_time(modified, tz).unwrap_or_else(Utc::now);
        let (body, trailer) = NoteTrailer::split(&normalize_newlines(&text));

        let mut title = entry.title;
        if repo.title_exists(owner, &title)? {
            title = format!("{title} (imported {})", timestamp.format("%Y%m%d%H%M%S"));
        }

        let note = repo.insert_note(
            owner,
            &NewNote::new(title, &body, timestamp).important(trailer.important),
        )?;
        tally.imported += 1;

        for raw_tag in &trailer.tags {
            if let Ok(tag) = TagName::new(raw_tag) {
                repo.attach_tag(owner, note.id, &tag)?;
            }
        }

        if let Some(origin_id) = entry.origin_id {
            let prefix = attachment_prefix(&origin_id);
            for (other, other_path) in names.iter().enumerate() {
                if consumed.contains(&other)
                    || !other_path.starts_with(&prefix)
                    || other_path.ends_with('/')
                {
                    continue;
                }
                consumed.insert(other);
                restore_attachment(repo, files, owner, note.id, archive, other, other_path)?;
            }
        }
    }
    Ok(())
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
) -> ArchiveResult<(Vec<u8>, zip::DateTime)> {
    let mut file = archive.by_index(index)?;
    let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
    file.read_to_end(&mut data)?;
    Ok((data, file.last_modified()))
}

/// Stores one attachment entry under a new stored name and links it to `note`.
///
/// Oversized entries are skipped with a warning.
fn restore_attachment<R, S, A>(
    repo: &mut R,
    files: &S,
    owner: UserId,
    note: NoteId,
    archive: &mut ZipArchive<A>,
    index: usize,
    path: &str,
) -> ArchiveResult<()>
where
    R: NoteRepository + ?Sized,
    S: AttachmentStore + ?Sized,
    A: Read + Seek,
{
    let original_name = path.rsplit('/').next().unwrap_or(path);
    let (bytes, _) = read_entry(archive, index)?;

    let stored = match files.put(original_name, &bytes) {
        Ok(stored) => stored,
        Err(err @ AttachmentError::TooLarge { .. }) => {
            warn!(entry = %path, error = %err, "import: attachment not restored");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if let Err(err) = repo.add_attachment(owner, note, original_name, &stored, Utc::now()) {
        if let Err(cleanup) = files.delete(&stored) {
            warn!(stored = %stored, error = %cleanup, "failed to remove unlinked attachment file");
        }
        return Err(err.into());
    }
    Ok(())
}
