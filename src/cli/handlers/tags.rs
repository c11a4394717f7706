//! Tag and trash command handlers (tag, untag, tags, trash, restore, empty-trash).

use anyhow::{Context, Result};
use serde::Serialize;

use super::acting_user;
use crate::app::App;
use crate::cli::output::{OutputFormat, print_json};
use crate::cli::{FormatArgs, NoteArgs, TagArgs};
use crate::domain::{NoteId, TagName};

#[derive(Debug, Serialize)]
struct NoteTags {
    id: NoteId,
    tags: Vec<TagName>,
}

#[derive(Debug, Serialize)]
struct EmptyTrashResult {
    deleted: usize,
}

fn print_note_tags(id: NoteId, tags: Vec<TagName>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            let names: Vec<&str> = tags.iter().map(TagName::as_str).collect();
            if names.is_empty() {
                println!("Note {id} has no tags");
            } else {
                println!("Note {id} tags: {}", names.join(", "));
            }
        }
        OutputFormat::Json => print_json(NoteTags { id, tags })?,
    }
    Ok(())
}

pub fn handle_tag(args: &TagArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let tags = app
        .add_tag(owner, args.id, &args.tag)
        .with_context(|| format!("failed to add tag '{}' to note {}", args.tag, args.id))?;
    print_note_tags(args.id, tags, args.format)
}

pub fn handle_untag(args: &TagArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let tags = app
        .remove_tag(owner, args.id, &args.tag)
        .with_context(|| format!("failed to remove tag '{}' from note {}", args.tag, args.id))?;
    print_note_tags(args.id, tags, args.format)
}

pub fn handle_tags(args: &FormatArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let tags = app.list_tags(owner).context("failed to list tags")?;

    match args.format {
        OutputFormat::Human => {
            if tags.is_empty() {
                println!("No tags found.");
            } else {
                for tag in &tags {
                    println!("{} ({})", tag.name, tag.note_count);
                }
            }
        }
        OutputFormat::Json => print_json(&tags)?,
    }
    Ok(())
}

pub fn handle_trash(args: &NoteArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let tags = app
        .trash(owner, args.id)
        .with_context(|| format!("failed to trash note {}", args.id))?;
    print_note_tags(args.id, tags, args.format)
}

pub fn handle_restore(args: &NoteArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let tags = app
        .restore(owner, args.id)
        .with_context(|| format!("note {} is not in the trash", args.id))?;
    print_note_tags(args.id, tags, args.format)
}

pub fn handle_empty_trash(args: &FormatArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let deleted = app.empty_trash(owner).context("failed to empty trash")?;

    match args.format {
        OutputFormat::Human => println!("Deleted {deleted} trashed notes"),
        OutputFormat::Json => print_json(EmptyTrashResult { deleted })?,
    }
    Ok(())
}
