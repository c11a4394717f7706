//! NoteRepository trait implementation for SqliteStore.

use super::SqliteStore;
use super::cascade::delete_notes_in;
use super::rows::{
    NOTE_COLUMNS, NoteRow, attachment_from_row, format_timestamp, into_attachment, into_user,
    user_from_row,
};
use crate::domain::{
    Attachment, AttachmentId, NewNote, Note, NoteId, Role, TRASH_TAG, TagName, User, UserId,
};
use crate::store::{
    DeletedNotes, NoteRepository, StoreError, StoreResult, TagWithCount,
};
use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension, params};

impl SqliteStore {
    /// Fails with NotFound unless `id` is a note owned by `owner`.
    fn ensure_owned(&self, owner: UserId, id: NoteId) -> StoreResult<()> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM notes WHERE id = ?1 AND user_id = ?2",
                params![id.get(), owner.get()],
                |_| Ok(()),
            )
            .optional()?;
        found.ok_or_else(|| StoreError::note_not_found(id))
    }

    fn tags_of(&self, id: NoteId) -> StoreResult<Vec<TagName>> {
        let names: Vec<String> = self
            .conn
            .prepare(
                "SELECT t.name FROM tags t
                 JOIN note_tags nt ON t.id = nt.tag_id
                 WHERE nt.note_id = ?
                 ORDER BY t.name",
            )?
            .query_map([id.get()], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        Ok(names
            .iter()
            .filter_map(|name| TagName::new(name).ok())
            .collect())
    }

    fn query_notes(&self, sql: &str, params: impl rusqlite::Params) -> StoreResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows: Vec<NoteRow> = stmt
            .query_map(params, NoteRow::from_row)?
            .collect::<Result<_, _>>()?;
        rows.into_iter().map(NoteRow::into_note).collect()
    }
}

impl NoteRepository for SqliteStore {
    // ===========================================
    // Users
    // ===========================================

    fn create_user(
        &mut self,
        username: &str,
        credential_hash: &str,
        role: Role,
    ) -> StoreResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::Validation("username required".to_string()));
        }

        let now = Utc::now();
        let inserted = self.conn.execute(
            "INSERT INTO users (username, password, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![username, credential_hash, role.as_str(), format_timestamp(now)],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(StoreError::Validation(format!(
                    "username already exists: {username}"
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(User {
            id: UserId::new(self.conn.last_insert_rowid()),
            username: username.to_string(),
            credential_hash: credential_hash.to_string(),
            role,
            created_at: now,
        })
    }

    fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, username, password, role, created_at FROM users WHERE username = ?",
                [username.trim()],
                user_from_row,
            )
            .optional()?;
        raw.map(into_user).transpose()
    }

    // ===========================================
    // Notes
    // ===========================================

    fn insert_note(&mut self, owner: UserId, note: &NewNote) -> StoreResult<Note> {
        self.conn.execute(
            "INSERT INTO notes (user_id, title, content, is_important, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                owner.get(),
                note.title,
                note.content,
                note.is_important,
                format_timestamp(note.created_at),
                format_timestamp(note.updated_at),
            ],
        )?;

        Ok(Note {
            id: NoteId::new(self.conn.last_insert_rowid()),
            owner,
            title: note.title.clone(),
            content: note.content.clone(),
            is_important: note.is_important,
            created_at: note.created_at,
            updated_at: Some(note.updated_at),
            tags: Vec::new(),
        })
    }

    fn get_note(&self, owner: UserId, id: NoteId) -> StoreResult<Note> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS}
             FROM notes n
             LEFT JOIN note_tags nt ON n.id = nt.note_id
             LEFT JOIN tags t ON nt.tag_id = t.id
             WHERE n.id = ?1 AND n.user_id = ?2
             GROUP BY n.id"
        );
        self.query_notes(&sql, params![id.get(), owner.get()])?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::note_not_found(id))
    }

    fn list_notes(&self, owner: UserId, tag: Option<&TagName>) -> StoreResult<Vec<Note>> {
        const ORDER: &str =
            "ORDER BY n.is_important DESC, COALESCE(n.updated_at, n.created_at) DESC, n.id ASC";
        match tag {
            None => {
                let sql = format!(
                    "SELECT {NOTE_COLUMNS}
                     FROM notes n
                     LEFT JOIN note_tags nt ON n.id = nt.note_id
                     LEFT JOIN tags t ON nt.tag_id = t.id
                     WHERE n.user_id = ?1
                     GROUP BY n.id
                     {ORDER}"
                );
                self.query_notes(&sql, params![owner.get()])
            }
            Some(tag) => {
                let sql = format!(
                    "SELECT {NOTE_COLUMNS}
                     FROM notes n
                     LEFT JOIN note_tags nt ON n.id = nt.note_id
                     LEFT JOIN tags t ON nt.tag_id = t.id
                     WHERE n.user_id = ?1
                       AND n.id IN (
                           SELECT nt2.note_id FROM note_tags nt2
                           JOIN tags t2 ON nt2.tag_id = t2.id
                           WHERE normalize_tag(t2.name) = ?2
                       )
                     GROUP BY n.id
                     {ORDER}"
                );
                self.query_notes(&sql, params![owner.get(), tag.as_str()])
            }
        }
    }

    fn search_notes(&self, owner: UserId, query: &str) -> StoreResult<Vec<Note>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = {
            let mut stmt = self.conn.prepare(
                "SELECT n.id
                 FROM notes_fts
                 JOIN notes n ON notes_fts.rowid = n.id
                 WHERE notes_fts MATCH ?1 AND n.user_id = ?2
                 ORDER BY bm25(notes_fts, 10.0, 1.0)",
            )?;
            let rows = stmt
                .query_map(params![query, owner.get()], |row| row.get(0))
                .and_then(|rows| rows.collect::<Result<Vec<i64>, _>>());
            match rows {
                Ok(ids) => ids,
                // The statement is already prepared, so a plain SQLITE_ERROR
                // here comes from the FTS5 query parser.
                Err(rusqlite::Error::SqliteFailure(e, msg)) if e.code == ErrorCode::Unknown => {
                    let reason = msg.unwrap_or_else(|| e.to_string());
                    return Err(StoreError::Validation(format!("invalid search query: {reason}")));
                }
                Err(e) => return Err(e.into()),
            }
        };

        ids.into_iter()
            .map(|id| self.get_note(owner, NoteId::new(id)))
            .collect()
    }

    fn title_exists(&self, owner: UserId, title: &str) -> StoreResult<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM notes WHERE user_id = ?1 AND title = ?2 LIMIT 1",
                params![owner.get(), title],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn update_note(
        &mut self,
        owner: UserId,
        id: NoteId,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Note> {
        let changed = self.conn.execute(
            "UPDATE notes SET title = ?1, content = ?2, updated_at = ?3
             WHERE id = ?4 AND user_id = ?5",
            params![title, content, format_timestamp(now), id.get(), owner.get()],
        )?;
        if changed == 0 {
            return Err(StoreError::note_not_found(id));
        }
        self.get_note(owner, id)
    }

    fn toggle_important(&mut self, owner: UserId, id: NoteId) -> StoreResult<bool> {
        let tx = self.transaction()?;
        let current: Option<i64> = tx
            .conn()
            .query_row(
                "SELECT is_important FROM notes WHERE id = ?1 AND user_id = ?2",
                params![id.get(), owner.get()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Err(StoreError::note_not_found(id));
        };

        let flag = current == 0;
        tx.execute(
            "UPDATE notes SET is_important = ?1 WHERE id = ?2 AND user_id = ?3",
            params![flag, id.get(), owner.get()],
        )?;
        tx.commit()?;
        Ok(flag)
    }

    fn delete_notes(&mut self, owner: UserId, ids: &[NoteId]) -> StoreResult<DeletedNotes> {
        let tx = self.transaction()?;
        let deleted = delete_notes_in(tx.conn(), Some(owner), ids)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn trashed_note_ids(&self, owner: UserId) -> StoreResult<Vec<NoteId>> {
        let ids: Vec<i64> = self
            .conn
            .prepare(
                "SELECT DISTINCT n.id
                 FROM notes n
                 JOIN note_tags nt ON nt.note_id = n.id
                 JOIN tags t ON t.id = nt.tag_id
                 WHERE n.user_id = ?1 AND normalize_tag(t.name) = ?2
                 ORDER BY n.id",
            )?
            .query_map(params![owner.get(), TRASH_TAG], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        Ok(ids.into_iter().map(NoteId::new).collect())
    }

    // ===========================================
    // Tags
    // ===========================================

    fn attach_tag(
        &mut self,
        owner: UserId,
        id: NoteId,
        tag: &TagName,
    ) -> StoreResult<Vec<TagName>> {
        self.ensure_owned(owner, id)?;

        let tx = self.transaction()?;
        tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?)", [tag.as_str()])?;
        tx.execute(
            "INSERT OR IGNORE INTO note_tags (note_id, tag_id)
             SELECT ?1, id FROM tags WHERE name = ?2",
            params![id.get(), tag.as_str()],
        )?;
        tx.commit()?;

        self.tags_of(id)
    }

    fn detach_tag(
        &mut self,
        owner: UserId,
        id: NoteId,
        tag: &TagName,
    ) -> StoreResult<Vec<TagName>> {
        self.ensure_owned(owner, id)?;

        // Rows written before normalization may hold other spellings.
        let known: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE normalize_tag(name) = ?)",
            [tag.as_str()],
            |row| row.get(0),
        )?;
        if !known {
            return Err(StoreError::tag_not_found(tag.as_str()));
        }

        self.conn.execute(
            "DELETE FROM note_tags
             WHERE note_id = ?1
               AND tag_id IN (SELECT id FROM tags WHERE normalize_tag(name) = ?2)",
            params![id.get(), tag.as_str()],
        )?;

        self.tags_of(id)
    }

    fn list_tags(&self, owner: UserId) -> StoreResult<Vec<TagWithCount>> {
        let tags = self
            .conn
            .prepare(
                "SELECT t.name, COUNT(nt.note_id) AS note_count
                 FROM tags t
                 JOIN note_tags nt ON t.id = nt.tag_id
                 JOIN notes n ON nt.note_id = n.id
                 WHERE n.user_id = ?1
                   AND nt.note_id NOT IN (
                       SELECT nt2.note_id
                       FROM note_tags nt2
                       JOIN tags t2 ON nt2.tag_id = t2.id
                       WHERE normalize_tag(t2.name) = ?2
                   )
                 GROUP BY t.id
                 ORDER BY t.name COLLATE NOCASE",
            )?
            .query_map(params![owner.get(), TRASH_TAG], |row| {
                Ok(TagWithCount {
                    name: row.get(0)?,
                    note_count: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(tags)
    }

    // ===========================================
    // Attachments
    // ===========================================

    fn add_attachment(
        &mut self,
        owner: UserId,
        note: NoteId,
        original_name: &str,
        stored_name: &str,
        uploaded_at: DateTime<Utc>,
    ) -> StoreResult<Attachment> {
        self.ensure_owned(owner, note)?;

        self.conn.execute(
            "INSERT INTO attachments (note_id, filename_original, filename_stored, uploaded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![note.get(), original_name, stored_name, format_timestamp(uploaded_at)],
        )?;

        Ok(Attachment {
            id: AttachmentId::new(self.conn.last_insert_rowid()),
            note_id: note,
            original_name: original_name.to_string(),
            stored_name: stored_name.to_string(),
            uploaded_at,
        })
    }

    fn note_attachments(&self, owner: UserId, note: NoteId) -> StoreResult<Vec<Attachment>> {
        self.ensure_owned(owner, note)?;

        let raw: Vec<_> = self
            .conn
            .prepare(
                "SELECT id, note_id, filename_original, filename_stored, uploaded_at
                 FROM attachments WHERE note_id = ? ORDER BY id",
            )?
            .query_map([note.get()], attachment_from_row)?
            .collect::<Result<_, _>>()?;
        raw.into_iter().map(into_attachment).collect()
    }

    fn delete_attachment(&mut self, owner: UserId, id: AttachmentId) -> StoreResult<Attachment> {
        let raw = self
            .conn
            .query_row(
                "SELECT a.id, a.note_id, a.filename_original, a.filename_stored, a.uploaded_at
                 FROM attachments a
                 JOIN notes n ON a.note_id = n.id
                 WHERE a.id = ?1 AND n.user_id = ?2",
                params![id.get(), owner.get()],
                attachment_from_row,
            )
            .optional()?;
        let attachment = raw
            .map(into_attachment)
            .transpose()?
            .ok_or_else(|| StoreError::attachment_not_found(id))?;

        self.conn
            .execute("DELETE FROM attachments WHERE id = ?", [id.get()])?;
        Ok(attachment)
    }
}
