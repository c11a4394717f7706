//! Command handlers for the CLI.

mod files;
mod maintenance;
mod notes;
mod tags;
mod transfer;
mod users;

use anyhow::{Context, Result};

use crate::app::App;
use crate::domain::UserId;

// Re-export public items
pub use files::{handle_attach, handle_detach};
pub use maintenance::{handle_completions, handle_sweep};
pub use notes::{
    handle_edit, handle_important, handle_list, handle_new, handle_remove, handle_search,
    handle_show,
};
pub use tags::{handle_empty_trash, handle_restore, handle_tag, handle_tags, handle_trash, handle_untag};
pub use transfer::{handle_export, handle_import};
pub use users::handle_user_add;

// ===========================================
// Shared Utilities
// ===========================================

/// Resolves the `--user` flag to the acting user.
pub(crate) fn acting_user(app: &App, user: Option<&str>) -> Result<UserId> {
    app.resolve_user(user)
        .context("pass --user <name> of an existing user (create one with `simplynote user add`)")
}
