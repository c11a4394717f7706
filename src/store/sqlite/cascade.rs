//! Batched note deletion shared by the repository and the sweeper.

use crate::domain::{NoteId, UserId};
use crate::store::{DeletedNotes, StoreResult};
use rusqlite::{Connection, params_from_iter};

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Deletes notes and their attachment rows on an open transaction.
///
/// With an owner, ids belonging to anyone else are dropped up front, so
/// neither their notes nor their attachments are touched. Order is fixed:
/// collect stored file names, delete attachment rows, delete note rows.
/// The returned count is the number of note rows actually removed.
pub(crate) fn delete_notes_in(
    conn: &Connection,
    owner: Option<UserId>,
    ids: &[NoteId],
) -> StoreResult<DeletedNotes> {
    if ids.is_empty() {
        return Ok(DeletedNotes::default());
    }

    let requested: Vec<i64> = ids.iter().map(|id| id.get()).collect();
    let targets: Vec<i64> = match owner {
        Some(owner) => {
            let sql = format!(
                "SELECT id FROM notes WHERE user_id = ? AND id IN ({})",
                placeholders(requested.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let params = std::iter::once(owner.get()).chain(requested.iter().copied());
            let owned: Vec<i64> = stmt
                .query_map(params_from_iter(params), |row| row.get(0))?
                .collect::<Result<_, _>>()?;
            owned
        }
        None => requested,
    };
    if targets.is_empty() {
        return Ok(DeletedNotes::default());
    }

    let list = placeholders(targets.len());

    let stored_files: Vec<String> = conn
        .prepare(&format!(
            "SELECT filename_stored FROM attachments WHERE note_id IN ({list}) ORDER BY id"
        ))?
        .query_map(params_from_iter(targets.iter()), |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    conn.execute(
        &format!("DELETE FROM attachments WHERE note_id IN ({list})"),
        params_from_iter(targets.iter()),
    )?;

    let count = conn.execute(
        &format!("DELETE FROM notes WHERE id IN ({list})"),
        params_from_iter(targets.iter()),
    )?;

    Ok(DeletedNotes {
        count,
        stored_files,
    })
}
