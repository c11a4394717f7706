use super::*;
use crate::domain::{NewNote, NoteId, Role, TagName, UserId};
use crate::store::{NoteRepository, StoreError, TrashPolicy, run_sweep};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

// ===========================================
// Test Helpers
// ===========================================

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
}

fn store_with_user() -> (SqliteStore, UserId) {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let user = store.create_user("alice", "sha256$x$y", Role::User).unwrap();
    (store, user.id)
}

fn add_note(store: &mut SqliteStore, owner: UserId, title: &str, at: DateTime<Utc>) -> NoteId {
    store
        .insert_note(owner, &NewNote::new(title, "body", at))
        .unwrap()
        .id
}

fn tag(name: &str) -> TagName {
    TagName::new(name).unwrap()
}

fn count(store: &SqliteStore, table: &str) -> i64 {
    store
        .conn()
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
}

// ===========================================
// Connection
// ===========================================

#[test]
fn open_in_memory_enables_foreign_keys() {
    let store = SqliteStore::open_in_memory().unwrap();
    let fk: i32 = store
        .conn()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fk, 1);
}

#[test]
fn open_creates_parent_directory_and_uses_wal() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("nested").join("notes.db");

    let store = SqliteStore::open(&db_path).unwrap();
    assert!(db_path.exists());

    let mode: String = store
        .conn()
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn reopen_preserves_data() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("notes.db");
    {
        let mut store = SqliteStore::open(&db_path).unwrap();
        let user = store.create_user("bob", "h", Role::Admin).unwrap();
        add_note(&mut store, user.id, "kept", t0());
    }
    let store = SqliteStore::open(&db_path).unwrap();
    let user = store.find_user("bob").unwrap().unwrap();
    assert_eq!(user.role, Role::Admin);
    assert_eq!(store.list_notes(user.id, None).unwrap().len(), 1);
}

#[test]
fn normalize_tag_sql_function_is_registered() {
    let store = SqliteStore::open_in_memory().unwrap();
    let value: String = store
        .conn()
        .query_row("SELECT normalize_tag(' ｔｒａｓｈ ')", [], |row| row.get(0))
        .unwrap();
    assert_eq!(value, "TRASH");
}

#[test]
fn dropped_transaction_rolls_back() {
    let (mut store, owner) = store_with_user();
    {
        let tx = store.transaction().unwrap();
        tx.execute(
            "INSERT INTO notes (user_id, title, content, created_at) VALUES (?1, 'x', 'y', 'z')",
            [owner.get()],
        )
        .unwrap();
    }
    assert_eq!(count(&store, "notes"), 0);
}

// ===========================================
// Users
// ===========================================

#[test]
fn duplicate_username_is_a_validation_error() {
    let (mut store, _) = store_with_user();
    let err = store.create_user("alice", "h", Role::User).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn blank_username_is_rejected() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    assert!(matches!(
        store.create_user("  ", "h", Role::User),
        Err(StoreError::Validation(_))
    ));
}

#[test]
fn find_user_returns_none_for_unknown() {
    let (store, _) = store_with_user();
    assert!(store.find_user("mallory").unwrap().is_none());
}

// ===========================================
// Notes
// ===========================================

#[test]
fn insert_then_get_roundtrip() {
    let (mut store, owner) = store_with_user();
    let created = store
        .insert_note(owner, &NewNote::new("Title", "line1\r\nline2", t0()))
        .unwrap();

    let fetched = store.get_note(owner, created.id).unwrap();
    assert_eq!(fetched.title, "Title");
    assert_eq!(fetched.content, "line1\nline2");
    assert!(!fetched.is_important);
    assert_eq!(fetched.created_at, t0());
    assert_eq!(fetched.updated_at, Some(t0()));
    assert!(fetched.tags.is_empty());
}

#[test]
fn notes_of_other_users_are_not_found() {
    let (mut store, alice) = store_with_user();
    let bob = store.create_user("bob", "h", Role::User).unwrap().id;
    let id = add_note(&mut store, alice, "private", t0());

    assert!(matches!(
        store.get_note(bob, id),
        Err(StoreError::NotFound { entity: "note", .. })
    ));
    assert!(store.update_note(bob, id, "x", "y", t0()).is_err());
    assert!(store.toggle_important(bob, id).is_err());
    assert!(store.attach_tag(bob, id, &tag("x")).is_err());
    assert!(store.list_notes(bob, None).unwrap().is_empty());
}

#[test]
fn list_orders_by_importance_then_recency_then_insertion() {
    let (mut store, owner) = store_with_user();
    let old = add_note(&mut store, owner, "old", t0());
    let new = add_note(&mut store, owner, "new", t0() + Duration::hours(1));
    let tie_a = add_note(&mut store, owner, "tie a", t0() + Duration::minutes(30));
    let tie_b = add_note(&mut store, owner, "tie b", t0() + Duration::minutes(30));
    let flagged = add_note(&mut store, owner, "flagged", t0() - Duration::days(1));
    assert!(store.toggle_important(owner, flagged).unwrap());

    let order: Vec<NoteId> = store
        .list_notes(owner, None)
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(order, vec![flagged, new, tie_a, tie_b, old]);
}

#[test]
fn list_filtered_by_tag_keeps_all_tags_of_matching_notes() {
    let (mut store, owner) = store_with_user();
    let a = add_note(&mut store, owner, "a", t0());
    let b = add_note(&mut store, owner, "b", t0());
    store.attach_tag(owner, a, &tag("work")).unwrap();
    store.attach_tag(owner, a, &tag("urgent")).unwrap();
    store.attach_tag(owner, b, &tag("home")).unwrap();

    let notes = store.list_notes(owner, Some(&tag("work"))).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, a);
    assert_eq!(notes[0].tags, vec![tag("urgent"), tag("work")]);
}

#[test]
fn update_refreshes_updated_at_and_keeps_flag() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "before", t0());
    store.toggle_important(owner, id).unwrap();

    let later = t0() + Duration::days(2);
    let updated = store.update_note(owner, id, "after", "new body", later).unwrap();
    assert_eq!(updated.title, "after");
    assert_eq!(updated.content, "new body");
    assert_eq!(updated.updated_at, Some(later));
    assert_eq!(updated.created_at, t0());
    assert!(updated.is_important);
}

#[test]
fn toggle_important_flips_without_touching_updated_at() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "n", t0());
    assert!(store.toggle_important(owner, id).unwrap());
    assert!(!store.toggle_important(owner, id).unwrap());
    assert_eq!(store.get_note(owner, id).unwrap().updated_at, Some(t0()));
}

#[test]
fn title_exists_is_scoped_to_owner() {
    let (mut store, alice) = store_with_user();
    let bob = store.create_user("bob", "h", Role::User).unwrap().id;
    add_note(&mut store, alice, "Grocery List", t0());
    assert!(store.title_exists(alice, "Grocery List").unwrap());
    assert!(!store.title_exists(alice, "grocery list").unwrap());
    assert!(!store.title_exists(bob, "Grocery List").unwrap());
}

#[test]
fn legacy_rows_without_updated_at_are_readable() {
    let (store, owner) = store_with_user();
    store
        .conn()
        .execute(
            "INSERT INTO notes (user_id, title, content, created_at, updated_at)
             VALUES (?1, 'legacy', 'x', '2023-03-01T00:00:00', NULL)",
            [owner.get()],
        )
        .unwrap();
    let notes = store.list_notes(owner, None).unwrap();
    assert_eq!(notes[0].updated_at, None);
    assert_eq!(
        notes[0].created_at,
        Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap()
    );
}

// ===========================================
// Search
// ===========================================

#[test]
fn search_matches_title_and_content_for_owner_only() {
    let (mut store, alice) = store_with_user();
    let bob = store.create_user("bob", "h", Role::User).unwrap().id;
    let hit = store
        .insert_note(alice, &NewNote::new("Pancakes", "flour eggs milk", t0()))
        .unwrap()
        .id;
    store
        .insert_note(bob, &NewNote::new("Bob's pancakes", "milk", t0()))
        .unwrap();

    let results = store.search_notes(alice, "milk").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, hit);
    assert!(store.search_notes(alice, "   ").unwrap().is_empty());
}

#[test]
fn malformed_search_query_is_a_validation_error() {
    let (mut store, owner) = store_with_user();
    add_note(&mut store, owner, "x", t0());
    assert!(matches!(
        store.search_notes(owner, "\"unterminated"),
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        store.search_notes(owner, "AND OR"),
        Err(StoreError::Validation(_))
    ));
}

// ===========================================
// Tags
// ===========================================

#[test]
fn attach_tag_is_idempotent() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "n", t0());
    store.attach_tag(owner, id, &tag("work")).unwrap();
    let tags = store.attach_tag(owner, id, &tag("WORK")).unwrap();
    assert_eq!(tags, vec![tag("work")]);
    assert_eq!(count(&store, "tags"), 1);
    assert_eq!(count(&store, "note_tags"), 1);
}

#[test]
fn tags_are_shared_across_notes_and_users() {
    let (mut store, alice) = store_with_user();
    let bob = store.create_user("bob", "h", Role::User).unwrap().id;
    let a = add_note(&mut store, alice, "a", t0());
    let b = add_note(&mut store, bob, "b", t0());
    store.attach_tag(alice, a, &tag("shared")).unwrap();
    store.attach_tag(bob, b, &tag("shared")).unwrap();
    assert_eq!(count(&store, "tags"), 1);
}

#[test]
fn detach_tag_leaves_tag_row_for_sweeper() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "n", t0());
    store.attach_tag(owner, id, &tag("temp")).unwrap();

    let tags = store.detach_tag(owner, id, &tag("temp")).unwrap();
    assert!(tags.is_empty());
    assert_eq!(count(&store, "tags"), 1);
    assert_eq!(count(&store, "note_tags"), 0);
}

#[test]
fn detach_unknown_tag_is_not_found() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "n", t0());
    assert!(matches!(
        store.detach_tag(owner, id, &tag("nope")),
        Err(StoreError::NotFound { entity: "tag", .. })
    ));
}

#[test]
fn list_tags_counts_exclude_trashed_notes() {
    let (mut store, owner) = store_with_user();
    let a = add_note(&mut store, owner, "a", t0());
    let b = add_note(&mut store, owner, "b", t0());
    let c = add_note(&mut store, owner, "c", t0());
    store.attach_tag(owner, a, &tag("work")).unwrap();
    store.attach_tag(owner, b, &tag("work")).unwrap();
    store.attach_tag(owner, b, &tag("apple")).unwrap();
    store.attach_tag(owner, c, &tag("work")).unwrap();
    store.attach_tag(owner, c, &TagName::trash()).unwrap();

    let tags = store.list_tags(owner).unwrap();
    let pairs: Vec<(String, u32)> = tags.into_iter().map(|t| (t.name, t.note_count)).collect();
    assert_eq!(
        pairs,
        vec![("APPLE".to_string(), 1), ("WORK".to_string(), 2)]
    );
}

#[test]
fn trashed_note_ids_matches_legacy_spellings() {
    let (mut store, owner) = store_with_user();
    let a = add_note(&mut store, owner, "a", t0());
    let b = add_note(&mut store, owner, "b", t0());
    add_note(&mut store, owner, "c", t0());
    store.attach_tag(owner, a, &TagName::trash()).unwrap();
    store
        .conn()
        .execute_batch(&format!(
            "INSERT INTO tags (name) VALUES ('Trash');
             INSERT INTO note_tags (note_id, tag_id)
             SELECT {}, id FROM tags WHERE name = 'Trash';",
            b.get()
        ))
        .unwrap();

    assert_eq!(store.trashed_note_ids(owner).unwrap(), vec![a, b]);

    let remaining = store.detach_tag(owner, b, &TagName::trash()).unwrap();
    assert!(remaining.is_empty());
    assert_eq!(store.trashed_note_ids(owner).unwrap(), vec![a]);
}

// ===========================================
// Attachments
// ===========================================

#[test]
fn attachments_roundtrip_in_upload_order() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "n", t0());
    let first = store
        .add_attachment(owner, id, "a.png", "aaaa.png", t0())
        .unwrap();
    let second = store
        .add_attachment(owner, id, "b.pdf", "bbbb.pdf", t0())
        .unwrap();

    let listed = store.note_attachments(owner, id).unwrap();
    assert_eq!(listed, vec![first, second]);
    assert_eq!(listed[0].url(), "/files/aaaa.png");
}

#[test]
fn stored_names_are_globally_unique() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "n", t0());
    store.add_attachment(owner, id, "a", "same", t0()).unwrap();
    assert!(store.add_attachment(owner, id, "b", "same", t0()).is_err());
}

#[test]
fn attachment_ops_check_ownership() {
    let (mut store, alice) = store_with_user();
    let bob = store.create_user("bob", "h", Role::User).unwrap().id;
    let id = add_note(&mut store, alice, "n", t0());
    let att = store.add_attachment(alice, id, "a", "s1", t0()).unwrap();

    assert!(store.add_attachment(bob, id, "b", "s2", t0()).is_err());
    assert!(store.note_attachments(bob, id).is_err());
    assert!(matches!(
        store.delete_attachment(bob, att.id),
        Err(StoreError::NotFound { entity: "attachment", .. })
    ));

    let removed = store.delete_attachment(alice, att.id).unwrap();
    assert_eq!(removed.stored_name, "s1");
    assert_eq!(count(&store, "attachments"), 0);
}

// ===========================================
// Batched deletion
// ===========================================

#[test]
fn delete_notes_collects_files_and_removes_rows() {
    let (mut store, owner) = store_with_user();
    let a = add_note(&mut store, owner, "a", t0());
    let b = add_note(&mut store, owner, "b", t0());
    store.add_attachment(owner, a, "x", "s-a1", t0()).unwrap();
    store.add_attachment(owner, a, "y", "s-a2", t0()).unwrap();
    store.add_attachment(owner, b, "z", "s-b1", t0()).unwrap();
    store.attach_tag(owner, a, &tag("t")).unwrap();

    let deleted = store.delete_notes(owner, &[a, b]).unwrap();
    assert_eq!(deleted.count, 2);
    assert_eq!(deleted.stored_files, vec!["s-a1", "s-a2", "s-b1"]);
    assert_eq!(count(&store, "attachments"), 0);
    assert_eq!(count(&store, "notes"), 0);
    assert_eq!(count(&store, "note_tags"), 0);
}

#[test]
fn delete_notes_silently_skips_foreign_ids() {
    let (mut store, alice) = store_with_user();
    let bob = store.create_user("bob", "h", Role::User).unwrap().id;
    let mine = add_note(&mut store, alice, "mine", t0());
    let theirs = add_note(&mut store, bob, "theirs", t0());
    store.add_attachment(bob, theirs, "f", "bob-file", t0()).unwrap();

    let deleted = store.delete_notes(alice, &[mine, theirs]).unwrap();
    assert_eq!(deleted.count, 1);
    assert!(deleted.stored_files.is_empty());
    assert_eq!(store.note_attachments(bob, theirs).unwrap().len(), 1);
    assert!(store.get_note(bob, theirs).is_ok());
}

#[test]
fn delete_notes_with_empty_input_is_noop() {
    let (mut store, owner) = store_with_user();
    add_note(&mut store, owner, "n", t0());
    assert_eq!(store.delete_notes(owner, &[]).unwrap().count, 0);
    assert_eq!(count(&store, "notes"), 1);
}

// ===========================================
// Sweep
// ===========================================

fn policy() -> TrashPolicy {
    TrashPolicy::new(true, 30)
}

#[test]
fn sweep_removes_unused_tags() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "n", t0());
    store.attach_tag(owner, id, &tag("keep")).unwrap();
    store.attach_tag(owner, id, &tag("drop")).unwrap();
    store.detach_tag(owner, id, &tag("drop")).unwrap();

    let report = run_sweep(&mut store, policy(), Some(owner), t0()).unwrap();
    assert_eq!(report.unused_tags, 1);
    assert_eq!(count(&store, "tags"), 1);
}

#[test]
fn sweep_removes_orphan_links_left_without_foreign_keys() {
    let (mut store, owner) = store_with_user();
    let id = add_note(&mut store, owner, "n", t0());
    store.attach_tag(owner, id, &tag("t")).unwrap();

    store.conn().execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    store
        .conn()
        .execute("DELETE FROM notes WHERE id = ?", [id.get()])
        .unwrap();
    store.conn().execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    assert_eq!(count(&store, "note_tags"), 1);

    let report = run_sweep(&mut store, policy(), None, t0()).unwrap();
    assert_eq!(report.orphan_links, 1);
    assert_eq!(report.unused_tags, 1);
    assert_eq!(count(&store, "note_tags"), 0);
    assert_eq!(count(&store, "tags"), 0);
}

#[test]
fn sweep_purges_only_expired_trashed_notes() {
    let (mut store, owner) = store_with_user();
    let now = t0() + Duration::days(100);
    let expired = add_note(&mut store, owner, "expired", now - Duration::days(31));
    let fresh = add_note(&mut store, owner, "fresh", now - Duration::days(29));
    let old_kept = add_note(&mut store, owner, "old but not trashed", now - Duration::days(90));
    store.attach_tag(owner, expired, &TagName::trash()).unwrap();
    store.attach_tag(owner, fresh, &TagName::trash()).unwrap();
    store
        .add_attachment(owner, expired, "a.txt", "expired-file.txt", now)
        .unwrap();

    let report = run_sweep(&mut store, policy(), Some(owner), now).unwrap();
    assert_eq!(report.purged_notes, 1);
    assert_eq!(report.released_files, vec!["expired-file.txt"]);

    assert!(store.get_note(owner, expired).is_err());
    assert!(store.get_note(owner, fresh).is_ok());
    assert!(store.get_note(owner, old_kept).is_ok());
    assert_eq!(count(&store, "attachments"), 0);
}

#[test]
fn sweep_with_disabled_policy_keeps_trash() {
    let (mut store, owner) = store_with_user();
    let now = t0() + Duration::days(100);
    let id = add_note(&mut store, owner, "old", t0());
    store.attach_tag(owner, id, &TagName::trash()).unwrap();

    for policy in [TrashPolicy::new(false, 30), TrashPolicy::new(true, 0)] {
        let report = run_sweep(&mut store, policy, None, now).unwrap();
        assert_eq!(report.purged_notes, 0);
    }
    assert!(store.get_note(owner, id).is_ok());
}

#[test]
fn sweep_scoped_to_owner_leaves_other_users_trash() {
    let (mut store, alice) = store_with_user();
    let bob = store.create_user("bob", "h", Role::User).unwrap().id;
    let now = t0() + Duration::days(100);
    let a = add_note(&mut store, alice, "a", t0());
    let b = add_note(&mut store, bob, "b", t0());
    store.attach_tag(alice, a, &TagName::trash()).unwrap();
    store.attach_tag(bob, b, &TagName::trash()).unwrap();

    let report = run_sweep(&mut store, policy(), Some(alice), now).unwrap();
    assert_eq!(report.purged_notes, 1);
    assert!(store.get_note(bob, b).is_ok());
}

#[test]
fn sweep_is_idempotent() {
    let (mut store, owner) = store_with_user();
    let now = t0() + Duration::days(100);
    let a = add_note(&mut store, owner, "a", t0());
    let b = add_note(&mut store, owner, "b", now);
    store.attach_tag(owner, a, &TagName::trash()).unwrap();
    store.attach_tag(owner, b, &tag("x")).unwrap();
    store.attach_tag(owner, b, &tag("y")).unwrap();
    store.detach_tag(owner, b, &tag("y")).unwrap();

    let first = run_sweep(&mut store, policy(), None, now).unwrap();
    assert!(!first.is_clean());
    let second = run_sweep(&mut store, policy(), None, now).unwrap();
    assert!(second.is_clean(), "second sweep deleted {second:?}");
}

#[test]
fn sweep_leaves_no_unreferenced_tags_or_dangling_links() {
    let (mut store, owner) = store_with_user();
    let notes: Vec<NoteId> = (0..4)
        .map(|i| add_note(&mut store, owner, &format!("n{i}"), t0()))
        .collect();
    let names = ["alpha", "beta", "gamma", "delta", "epsilon"];

    for (i, note) in notes.iter().enumerate() {
        for name in names.iter().skip(i) {
            store.attach_tag(owner, *note, &tag(name)).unwrap();
        }
    }
    for (i, note) in notes.iter().enumerate() {
        for name in names.iter().skip(i).step_by(2) {
            store.detach_tag(owner, *note, &tag(name)).unwrap();
        }
    }
    store.delete_notes(owner, &notes[..1]).unwrap();

    run_sweep(&mut store, policy(), None, t0()).unwrap();

    let unreferenced: i64 = store
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM tags WHERE id NOT IN (SELECT tag_id FROM note_tags)",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let dangling: i64 = store
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM note_tags WHERE note_id NOT IN (SELECT id FROM notes)",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(unreferenced, 0);
    assert_eq!(dangling, 0);
}
