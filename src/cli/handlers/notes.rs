//! Note command handlers (new, ls, show, edit, rm, important, search).

use anyhow::{Context, Result};
use serde::Serialize;

use super::acting_user;
use crate::app::App;
use crate::cli::output::{OutputFormat, print_json, print_note, print_note_table};
use crate::cli::{EditArgs, ListArgs, NewArgs, NoteArgs, SearchArgs, ShowArgs};
use crate::domain::NoteId;

#[derive(Debug, Serialize)]
struct ImportanceResult {
    id: NoteId,
    is_important: bool,
}

#[derive(Debug, Serialize)]
struct DeleteResult {
    id: NoteId,
    deleted: bool,
}

pub fn handle_new(args: &NewArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;

    let created = app
        .create_note(owner, &args.title, &args.content)
        .context("failed to create note")?;
    for tag in &args.tags {
        app.add_tag(owner, created.id, tag)
            .with_context(|| format!("failed to tag note with '{tag}'"))?;
    }
    if args.important {
        app.toggle_important(owner, created.id)?;
    }
    let note = app.get_note(owner, created.id)?;

    match args.format {
        OutputFormat::Human => println!("Created note {} '{}'", note.id, note.title),
        OutputFormat::Json => print_json(&note)?,
    }
    Ok(())
}

pub fn handle_list(args: &ListArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let notes = app
        .list_notes(owner, args.tag.as_deref())
        .context("failed to list notes")?;

    match args.format {
        OutputFormat::Human => print_note_table(&notes),
        OutputFormat::Json => print_json(&notes)?,
    }
    Ok(())
}

pub fn handle_search(args: &SearchArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let notes = app
        .search(owner, &args.query)
        .with_context(|| format!("search failed for '{}'", args.query))?;

    match args.format {
        OutputFormat::Human => print_note_table(&notes),
        OutputFormat::Json => print_json(&notes)?,
    }
    Ok(())
}

pub fn handle_show(args: &ShowArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let note = app.get_note(owner, args.id)?;

    match args.format {
        OutputFormat::Human => print_note(&note),
        OutputFormat::Json => print_json(&note)?,
    }
    Ok(())
}

pub fn handle_edit(args: &EditArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let note = app
        .update_note(owner, args.id, args.title.as_deref(), args.content.as_deref())
        .with_context(|| format!("failed to update note {}", args.id))?;

    match args.format {
        OutputFormat::Human => println!("Updated note {} '{}'", note.id, note.title),
        OutputFormat::Json => print_json(&note)?,
    }
    Ok(())
}

pub fn handle_remove(args: &NoteArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    app.delete_note(owner, args.id)
        .with_context(|| format!("failed to delete note {}", args.id))?;

    match args.format {
        OutputFormat::Human => println!("Deleted note {}", args.id),
        OutputFormat::Json => print_json(DeleteResult {
            id: args.id,
            deleted: true,
        })?,
    }
    Ok(())
}

pub fn handle_important(args: &NoteArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let flag = app.toggle_important(owner, args.id)?;

    match args.format {
        OutputFormat::Human => {
            if flag {
                println!("Marked note {} important", args.id);
            } else {
                println!("Note {} is no longer important", args.id);
            }
        }
        OutputFormat::Json => print_json(ImportanceResult {
            id: args.id,
            is_important: flag,
        })?,
    }
    Ok(())
}
