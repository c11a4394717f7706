//! User account handlers.

use anyhow::{Context, Result};

use crate::app::App;
use crate::cli::UserAddArgs;

pub fn handle_user_add(args: &UserAddArgs, app: &App) -> Result<()> {
    let user = app
        .create_user(&args.username, &args.password, args.role)
        .with_context(|| format!("failed to create user '{}'", args.username))?;
    println!("Created user '{}' ({})", user.username, user.role);
    Ok(())
}
