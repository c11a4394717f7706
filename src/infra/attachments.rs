//! On-disk storage for attachment bytes.
//!
//! Attachments are stored flat in one upload directory under an opaque name
//! (`<32 hex chars><original extension>`). The mapping from original file
//! name to stored name lives in the database; this module only knows about
//! bytes and names.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors raised by an attachment store.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("file exceeds {}MB limit ({size} bytes)", .limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },

    #[error("invalid stored file name: {0}")]
    InvalidName(String),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Byte storage for attachments, addressed by stored name.
pub trait AttachmentStore {
    /// Persists `bytes` under a freshly generated stored name and returns it.
    ///
    /// The size limit is checked before anything touches the disk.
    fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String, AttachmentError>;

    /// Reads stored bytes; `None` if the file is missing.
    fn get(&self, stored_name: &str) -> Result<Option<Vec<u8>>, AttachmentError>;

    /// Removes stored bytes. Returns `false` if there was nothing to remove.
    fn delete(&self, stored_name: &str) -> Result<bool, AttachmentError>;
}

/// Generates an unused-looking stored name that keeps the original extension.
///
/// Extensions that are not plain ASCII alphanumerics are dropped.
pub fn new_stored_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));
    match ext {
        Some(ext) => format!("{token}.{ext}"),
        None => token,
    }
}

/// Filesystem-backed attachment store rooted at the upload directory.
#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
    dir: PathBuf,
    max_size: u64,
}

impl FsAttachmentStore {
    pub fn new(dir: impl Into<PathBuf>, max_size: u64) -> Self {
        Self {
            dir: dir.into(),
            max_size,
        }
    }

    /// Returns the upload directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, stored_name: &str) -> Result<PathBuf, AttachmentError> {
        let valid = !stored_name.is_empty()
            && stored_name != "."
            && stored_name != ".."
            && !stored_name.contains(['/', '\\']);
        if !valid {
            return Err(AttachmentError::InvalidName(stored_name.to_string()));
        }
        Ok(self.dir.join(stored_name))
    }
}

impl AttachmentStore for FsAttachmentStore {
    fn put(&self, original_name: &str, bytes: &[u8]) -> Result<String, AttachmentError> {
        let size = bytes.len() as u64;
        if size > self.max_size {
            return Err(AttachmentError::TooLarge {
                size,
                limit: self.max_size,
            });
        }

        fs::create_dir_all(&self.dir).map_err(|e| AttachmentError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let stored_name = new_stored_name(original_name);
        let path = self.path_for(&stored_name)?;

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| AttachmentError::Io {
            path: path.clone(),
            source: e,
        })?;
        temp.write_all(bytes).map_err(|e| AttachmentError::Io {
            path: path.clone(),
            source: e,
        })?;
        temp.persist_noclobber(&path)
            .map_err(|e| AttachmentError::Io {
                path: path.clone(),
                source: e.error,
            })?;

        debug!(stored_name = %stored_name, original_name, size, "attachment stored");
        Ok(stored_name)
    }

    fn get(&self, stored_name: &str) -> Result<Option<Vec<u8>>, AttachmentError> {
        let path = self.path_for(stored_name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AttachmentError::Io { path, source: e }),
        }
    }

    fn delete(&self, stored_name: &str) -> Result<bool, AttachmentError> {
        let path = self.path_for(stored_name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(stored_name, "attachment removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AttachmentError::Io { path, source: e }),
        }
    }
}

/// Removes stored files after their rows are gone.
///
/// Failures are logged and swallowed: the database is already consistent and
/// an orphan file on disk is acceptable. Returns the number of files removed.
pub fn release_files<S>(store: &S, stored_names: &[String]) -> usize
where
    S: AttachmentStore + ?Sized,
{
    let mut removed = 0;
    for name in stored_names {
        match store.delete(name) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => warn!(stored_name = %name, error = %e, "failed to remove attachment file"),
        }
    }
    removed
}
