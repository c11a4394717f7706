//! File names and attachment byte storage

mod attachments;
mod filename;

pub use attachments::{
    AttachmentError, AttachmentStore, FsAttachmentStore, new_stored_name, release_files,
};
pub use filename::{UNTITLED, dedup_name, sanitize_filename, split_extension};
