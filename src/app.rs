//! Operation layer between the command line and the store.
//!
//! Every operation opens its own connection, does its work and drops it.
//! Mutations commit first; the maintenance sweep then runs as a second,
//! separate commit, and attachment files are released only after the rows
//! referencing them are gone.

use std::path::PathBuf;

use chrono::{Local, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::archive::{self, ArchiveError, ImportReport};
use crate::domain::{
    Attachment, AttachmentId, FileRef, NewNote, NoteId, NoteView, Role, TRASH_TAG, TagName, User,
    UserId, hash_credential, normalize_newlines,
};
use crate::infra::{AttachmentError, AttachmentStore, FsAttachmentStore, release_files};
use crate::store::{
    NoteRepository, SqliteStore, StoreError, SweepReport, TagWithCount, TrashPolicy, run_sweep,
};

/// Where the store lives and how it behaves.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub trash: TrashPolicy,
}

/// Error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable identity was supplied.
    Unauthorized,
    /// Absent, or owned by someone else.
    NotFound,
    /// Rejected input.
    Validation,
    /// Filesystem trouble with attachment bytes.
    Storage,
    Internal,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

pub type AppResult<T> = Result<T, AppError>;

fn store_kind(err: &StoreError) -> ErrorKind {
    match err {
        StoreError::NotFound { .. } => ErrorKind::NotFound,
        StoreError::Validation(_) => ErrorKind::Validation,
        StoreError::Io { .. } => ErrorKind::Storage,
        StoreError::Database(_) | StoreError::Corrupt(_) => ErrorKind::Internal,
    }
}

fn attachment_kind(err: &AttachmentError) -> ErrorKind {
    match err {
        AttachmentError::TooLarge { .. } | AttachmentError::InvalidName(_) => {
            ErrorKind::Validation
        }
        AttachmentError::Io { .. } => ErrorKind::Storage,
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(e) => store_kind(e),
            Self::Attachment(e) => attachment_kind(e),
            Self::Archive(e) => match e {
                ArchiveError::NotAnArchive | ArchiveError::Zip(_) => ErrorKind::Validation,
                ArchiveError::Store(e) => store_kind(e),
                ArchiveError::Attachment(e) => attachment_kind(e),
                ArchiveError::Io(_) => ErrorKind::Internal,
            },
        }
    }
}

fn parse_tag(raw: &str) -> AppResult<TagName> {
    TagName::new(raw).map_err(|e| AppError::Validation(e.to_string()))
}

/// Entry point for all note operations.
#[derive(Debug, Clone)]
pub struct App {
    settings: Settings,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn open_store(&self) -> AppResult<SqliteStore> {
        Ok(SqliteStore::open(&self.settings.db_path)?)
    }

    fn files(&self) -> FsAttachmentStore {
        FsAttachmentStore::new(&self.settings.upload_dir, self.settings.max_upload_bytes)
    }

    /// Second commit after a mutation: sweep, then release purged files.
    fn sweep_after(&self, store: &mut SqliteStore, owner: UserId) -> AppResult<SweepReport> {
        let report = run_sweep(store, self.settings.trash, Some(owner), Utc::now())?;
        release_files(&self.files(), &report.released_files);
        Ok(report)
    }

    fn view(&self, store: &SqliteStore, owner: UserId, id: NoteId) -> AppResult<NoteView> {
        let note = store.get_note(owner, id)?;
        let attachments = store.note_attachments(owner, id)?;
        Ok(NoteView::new(note, &attachments))
    }

    // ===========================================
    // Users
    // ===========================================

    pub fn create_user(&self, username: &str, password: &str, role: Role) -> AppResult<User> {
        if password.is_empty() {
            return Err(AppError::Validation("password required".to_string()));
        }
        let mut store = self.open_store()?;
        let user = store.create_user(username, &hash_credential(password), role)?;
        info!(user = %user.username, role = %user.role, "created user");
        Ok(user)
    }

    /// Turns the caller's identity into a user id.
    pub fn resolve_user(&self, username: Option<&str>) -> AppResult<UserId> {
        let Some(username) = username.map(str::trim).filter(|u| !u.is_empty()) else {
            return Err(AppError::Unauthorized("no user given".to_string()));
        };
        let store = self.open_store()?;
        store
            .find_user(username)?
            .map(|user| user.id)
            .ok_or_else(|| AppError::Unauthorized(format!("unknown user: {username}")))
    }

    // ===========================================
    // Notes
    // ===========================================

    pub fn create_note(&self, owner: UserId, title: &str, content: &str) -> AppResult<NoteView> {
        let mut store = self.open_store()?;
        let note = store.insert_note(owner, &NewNote::new(title, content, Utc::now()))?;
        debug!(note = %note.id, "created note");
        Ok(NoteView::new(note, &[]))
    }

    pub fn get_note(&self, owner: UserId, id: NoteId) -> AppResult<NoteView> {
        let store = self.open_store()?;
        self.view(&store, owner, id)
    }

    /// Lists notes, optionally only those carrying `tag`.
    pub fn list_notes(&self, owner: UserId, tag: Option<&str>) -> AppResult<Vec<NoteView>> {
        let tag = tag.map(parse_tag).transpose()?;
        let store = self.open_store()?;
        store
            .list_notes(owner, tag.as_ref())?
            .into_iter()
            .map(|note| {
                let attachments = store.note_attachments(owner, note.id)?;
                Ok::<_, AppError>(NoteView::new(note, &attachments))
            })
            .collect()
    }

    pub fn search(&self, owner: UserId, query: &str) -> AppResult<Vec<NoteView>> {
        let store = self.open_store()?;
        store
            .search_notes(owner, query)?
            .into_iter()
            .map(|note| {
                let attachments = store.note_attachments(owner, note.id)?;
                Ok::<_, AppError>(NoteView::new(note, &attachments))
            })
            .collect()
    }

    pub fn update_note(
        &self,
        owner: UserId,
        id: NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> AppResult<NoteView> {
        let mut store = self.open_store()?;
        let current = store.get_note(owner, id)?;
        let content = normalize_newlines(content.unwrap_or(&current.content));
        store.update_note(
            owner,
            id,
            title.unwrap_or(&current.title),
            &content,
            Utc::now(),
        )?;
        self.view(&store, owner, id)
    }

    /// Flips the importance flag and returns the new value.
    pub fn toggle_important(&self, owner: UserId, id: NoteId) -> AppResult<bool> {
        let mut store = self.open_store()?;
        Ok(store.toggle_important(owner, id)?)
    }

    pub fn delete_note(&self, owner: UserId, id: NoteId) -> AppResult<()> {
        let mut store = self.open_store()?;
        let deleted = store.delete_notes(owner, &[id])?;
        if deleted.count == 0 {
            return Err(StoreError::note_not_found(id).into());
        }
        release_files(&self.files(), &deleted.stored_files);
        self.sweep_after(&mut store, owner)?;
        info!(note = %id, files = deleted.stored_files.len(), "deleted note");
        Ok(())
    }

    // ===========================================
    // Tags and trash
    // ===========================================

    /// Attaches a tag, creating it on demand. Returns the note's tags.
    pub fn add_tag(&self, owner: UserId, id: NoteId, raw: &str) -> AppResult<Vec<TagName>> {
        let tag = parse_tag(raw)?;
        let mut store = self.open_store()?;
        let tags = store.attach_tag(owner, id, &tag)?;
        self.sweep_after(&mut store, owner)?;
        Ok(tags)
    }

    /// Detaches a tag. The tag row is left for the sweep.
    pub fn remove_tag(&self, owner: UserId, id: NoteId, raw: &str) -> AppResult<Vec<TagName>> {
        let tag = parse_tag(raw)?;
        let mut store = self.open_store()?;
        let tags = store.detach_tag(owner, id, &tag)?;
        self.sweep_after(&mut store, owner)?;
        Ok(tags)
    }

    pub fn list_tags(&self, owner: UserId) -> AppResult<Vec<TagWithCount>> {
        let store = self.open_store()?;
        Ok(store.list_tags(owner)?)
    }

    pub fn trash(&self, owner: UserId, id: NoteId) -> AppResult<Vec<TagName>> {
        self.add_tag(owner, id, TRASH_TAG)
    }

    /// Takes a note out of the trash. NotFound if it is not trashed.
    pub fn restore(&self, owner: UserId, id: NoteId) -> AppResult<Vec<TagName>> {
        let mut store = self.open_store()?;
        if !store.get_note(owner, id)?.is_trashed() {
            return Err(StoreError::tag_not_found(TRASH_TAG).into());
        }
        let tags = store.detach_tag(owner, id, &TagName::trash())?;
        self.sweep_after(&mut store, owner)?;
        Ok(tags)
    }

    /// Deletes every trashed note of `owner`. Returns how many were removed.
    pub fn empty_trash(&self, owner: UserId) -> AppResult<usize> {
        let mut store = self.open_store()?;
        let ids = store.trashed_note_ids(owner)?;
        let deleted = store.delete_notes(owner, &ids)?;
        release_files(&self.files(), &deleted.stored_files);
        self.sweep_after(&mut store, owner)?;
        info!(count = deleted.count, "emptied trash");
        Ok(deleted.count)
    }

    // ===========================================
    // Attachments
    // ===========================================

    pub fn upload_attachment(
        &self,
        owner: UserId,
        note: NoteId,
        original_name: &str,
        bytes: &[u8],
    ) -> AppResult<FileRef> {
        let mut store = self.open_store()?;
        store.get_note(owner, note)?;

        let files = self.files();
        let stored = files.put(original_name, bytes)?;
        match store.add_attachment(owner, note, original_name, &stored, Utc::now()) {
            Ok(attachment) => Ok(FileRef::from(&attachment)),
            Err(err) => {
                release_files(&files, &[stored]);
                Err(err.into())
            }
        }
    }

    /// Removes the row first, then the file on a best-effort basis.
    pub fn delete_attachment(&self, owner: UserId, id: AttachmentId) -> AppResult<Attachment> {
        let mut store = self.open_store()?;
        let attachment = store.delete_attachment(owner, id)?;
        release_files(&self.files(), &[attachment.stored_name.clone()]);
        Ok(attachment)
    }

    /// Reads the bytes behind a stored name.
    pub fn read_attachment(&self, stored_name: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.files().get(stored_name)?)
    }

    // ===========================================
    // Archive
    // ===========================================

    /// Builds the export archive. Returns the download name and the bytes.
    pub fn export(&self, owner: UserId) -> AppResult<(String, Vec<u8>)> {
        let store = self.open_store()?;
        let bytes = archive::export_archive(&store, &self.files(), owner, Utc::now())?;
        Ok((archive::export::export_filename_today(), bytes))
    }

    /// Imports an uploaded archive, reading entry times in the local zone.
    ///
    /// The sweep runs even when the import fails partway, since the notes
    /// committed before the failure stay.
    pub fn import(&self, owner: UserId, upload_name: &str, bytes: &[u8]) -> AppResult<ImportReport> {
        let mut store = self.open_store()?;
        let imported =
            archive::import_archive(&mut store, &self.files(), owner, upload_name, bytes, &Local);
        let swept = self.sweep_after(&mut store, owner);
        let report = imported?;
        swept?;
        Ok(report)
    }

    // ===========================================
    // Maintenance
    // ===========================================

    /// Runs the sweep on its own; `None` purges trash of every user.
    pub fn sweep(&self, owner: Option<UserId>) -> AppResult<SweepReport> {
        let mut store = self.open_store()?;
        let report = run_sweep(&mut store, self.settings.trash, owner, Utc::now())?;
        release_files(&self.files(), &report.released_files);
        Ok(report)
    }
}
