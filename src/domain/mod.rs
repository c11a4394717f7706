//! Core types: Note, TagName, Attachment, User

mod attachment;
mod note;
mod tag;
mod user;

pub use attachment::{Attachment, AttachmentId, FILES_URL_PREFIX};
pub use note::{FileRef, NewNote, Note, NoteId, NoteView, normalize_newlines};
pub use tag::{ParseTagError, TRASH_TAG, TagName, normalize_tag_name};
pub use user::{ParseRoleError, Role, User, UserId, hash_credential, verify_credential};
