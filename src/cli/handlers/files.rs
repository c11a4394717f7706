//! Attachment command handlers (attach, detach).

use anyhow::{Context, Result, bail};

use super::acting_user;
use crate::app::App;
use crate::cli::output::{OutputFormat, print_json};
use crate::cli::{AttachArgs, DetachArgs};

pub fn handle_attach(args: &AttachArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;

    let Some(name) = args.file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        bail!("not a file: {}", args.file.display());
    };
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let file = app
        .upload_attachment(owner, args.id, &name, &bytes)
        .with_context(|| format!("failed to attach {} to note {}", name, args.id))?;

    match args.format {
        OutputFormat::Human => println!("Attached [{}] {} -> {}", file.id, file.filename, file.url),
        OutputFormat::Json => print_json(&file)?,
    }
    Ok(())
}

pub fn handle_detach(args: &DetachArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let removed = app
        .delete_attachment(owner, args.id)
        .with_context(|| format!("failed to delete attachment {}", args.id))?;
    println!("Deleted attachment [{}] {}", removed.id, removed.original_name);
    Ok(())
}
