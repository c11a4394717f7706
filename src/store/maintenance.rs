//! Integrity sweep run after mutations.
//!
//! The sweep is three steps in a fixed order, each relying on the previous
//! one having finished:
//!
//! 1. purge trashed notes older than the retention window (a cascading
//!    note deletion that also yields attachment files to release)
//! 2. remove `note_tags` rows whose note no longer exists
//! 3. remove tags that no `note_tags` row references
//!
//! The sweep commits on its own. It is never folded into the transaction of
//! the mutation that triggered it, so another connection can briefly observe
//! an orphaned link or an expired trashed note between the two commits.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, params};
use tracing::info;

use crate::domain::{NoteId, TRASH_TAG, UserId};
use crate::store::sqlite::{SqliteStore, delete_notes_in, parse_timestamp};
use crate::store::{DeletedNotes, StoreResult};

/// Automatic trash emptying policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrashPolicy {
    pub enabled: bool,
    pub retention_days: u32,
}

impl TrashPolicy {
    pub const DISABLED: Self = Self {
        enabled: false,
        retention_days: 0,
    };

    pub fn new(enabled: bool, retention_days: u32) -> Self {
        Self {
            enabled,
            retention_days,
        }
    }

    /// Notes last updated before this instant are expired. `None` when the
    /// policy is off or the retention window is zero.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.enabled && self.retention_days > 0)
            .then(|| now - Duration::days(i64::from(self.retention_days)))
    }
}

/// What a sweep removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub purged_notes: usize,
    pub orphan_links: usize,
    pub unused_tags: usize,
    /// Stored attachment files of purged notes, to be released by the caller.
    pub released_files: Vec<String>,
}

impl SweepReport {
    /// True if the sweep deleted nothing.
    pub fn is_clean(&self) -> bool {
        self.purged_notes == 0 && self.orphan_links == 0 && self.unused_tags == 0
    }
}

/// Step 1: deletes trashed notes whose last update is older than the cutoff.
///
/// Trash is matched through `normalize_tag()` so rows tagged before tag
/// normalization existed are covered too. Notes without `updated_at` age
/// from `created_at`.
pub fn purge_expired_trashed_notes(
    conn: &Connection,
    policy: TrashPolicy,
    owner: Option<UserId>,
    now: DateTime<Utc>,
) -> StoreResult<DeletedNotes> {
    let Some(cutoff) = policy.cutoff(now) else {
        return Ok(DeletedNotes::default());
    };

    let candidates: Vec<(i64, String)> = conn
        .prepare(
            "SELECT DISTINCT n.id, COALESCE(NULLIF(n.updated_at, ''), n.created_at)
             FROM notes n
             JOIN note_tags nt ON n.id = nt.note_id
             JOIN tags t ON nt.tag_id = t.id
             WHERE normalize_tag(t.name) = ?1
               AND (?2 IS NULL OR n.user_id = ?2)",
        )?
        .query_map(params![TRASH_TAG, owner.map(UserId::get)], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<_, _>>()?;

    let mut expired = Vec::new();
    for (id, updated_at) in candidates {
        if parse_timestamp(&updated_at)? < cutoff {
            expired.push(NoteId::new(id));
        }
    }

    let deleted = delete_notes_in(conn, owner, &expired)?;
    if deleted.count > 0 {
        info!(
            count = deleted.count,
            days = policy.retention_days,
            "deleted expired trashed notes"
        );
    }
    Ok(deleted)
}

/// Step 2: deletes links whose note no longer exists.
pub fn remove_orphan_note_tags(conn: &Connection) -> StoreResult<usize> {
    let count = conn.execute(
        "DELETE FROM note_tags WHERE note_id NOT IN (SELECT id FROM notes)",
        [],
    )?;
    if count > 0 {
        info!(count, "deleted orphaned note_tags");
    }
    Ok(count)
}

/// Step 3: deletes tags with no remaining links.
pub fn remove_unused_tags(conn: &Connection) -> StoreResult<usize> {
    let count = conn.execute(
        "DELETE FROM tags WHERE id NOT IN (SELECT DISTINCT tag_id FROM note_tags)",
        [],
    )?;
    if count > 0 {
        info!(count, "deleted unused tags");
    }
    Ok(count)
}

/// Runs the three sweep steps, in order, as one commit.
///
/// `owner` limits step 1 to one user's notes; steps 2 and 3 are always global.
pub fn run_sweep(
    store: &mut SqliteStore,
    policy: TrashPolicy,
    owner: Option<UserId>,
    now: DateTime<Utc>,
) -> StoreResult<SweepReport> {
    let tx = store.transaction()?;

    let purged = purge_expired_trashed_notes(tx.conn(), policy, owner, now)?;
    let orphan_links = remove_orphan_note_tags(tx.conn())?;
    let unused_tags = remove_unused_tags(tx.conn())?;

    tx.commit()?;

    Ok(SweepReport {
        purged_notes: purged.count,
        orphan_links,
        unused_tags,
        released_files: purged.stored_files,
    })
}
