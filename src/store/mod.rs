//! Relational note store, schema and integrity sweep

pub mod maintenance;
mod repository;
mod schema;
pub mod sqlite;

pub use maintenance::{SweepReport, TrashPolicy, run_sweep};
pub use repository::{DeletedNotes, NoteRepository, StoreError, StoreResult, TagWithCount};
pub use schema::{SCHEMA_VERSION, create_schema, get_schema_version};
pub use sqlite::SqliteStore;
