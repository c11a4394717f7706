//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::domain::{AttachmentId, NoteId, Role};
use output::OutputFormat;

/// simplynote - short text notes with tags, attachments and zip backups
#[derive(Parser, Debug)]
#[command(name = "simplynote", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/simplynote/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the database and files (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Act as this user
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Create a new note
    New(NewArgs),

    /// List notes, most important and most recent first
    #[command(name = "ls")]
    List(ListArgs),

    /// Show a note
    Show(ShowArgs),

    /// Change a note's title or content
    Edit(EditArgs),

    /// Delete a note and its attachments
    #[command(name = "rm")]
    Remove(NoteArgs),

    /// Toggle a note's importance flag
    Important(NoteArgs),

    /// Add a tag to a note
    Tag(TagArgs),

    /// Remove a tag from a note
    Untag(TagArgs),

    /// List tags with note counts (trashed notes excluded)
    Tags(FormatArgs),

    /// Move a note to the trash
    Trash(NoteArgs),

    /// Take a note back out of the trash
    Restore(NoteArgs),

    /// Permanently delete every trashed note
    EmptyTrash(FormatArgs),

    /// Attach a file to a note
    Attach(AttachArgs),

    /// Delete an attachment
    Detach(DetachArgs),

    /// Full-text search across notes
    Search(SearchArgs),

    /// Write all notes into a zip archive
    Export(ExportArgs),

    /// Read notes from a zip archive
    Import(ImportArgs),

    /// Run the maintenance sweep
    Sweep(SweepArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user account
    Add(UserAddArgs),
}

/// Arguments for `user add`
#[derive(Parser, Debug)]
pub struct UserAddArgs {
    /// Username (unique, cannot be changed later)
    pub username: String,

    /// Password
    #[arg(short, long)]
    pub password: String,

    /// Role: admin or user
    #[arg(short, long, default_value_t = Role::User)]
    pub role: Role,
}

/// Output format only
#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// A single note
#[derive(Parser, Debug)]
pub struct NoteArgs {
    /// Note ID
    pub id: NoteId,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `new` command
#[derive(Parser, Debug)]
pub struct NewArgs {
    /// Note title
    pub title: String,

    /// Note body
    #[arg(short = 'C', long, default_value = "")]
    pub content: String,

    /// Tag for the note (can be specified multiple times)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Mark the note important
    #[arg(short, long)]
    pub important: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `ls` (list) command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Filter by tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `show` command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Note ID
    pub id: NoteId,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `edit` command
#[derive(Parser, Debug)]
pub struct EditArgs {
    /// Note ID
    pub id: NoteId,

    /// New title
    #[arg(short = 'T', long)]
    pub title: Option<String>,

    /// New body
    #[arg(short = 'C', long)]
    pub content: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `tag` and `untag` commands
#[derive(Parser, Debug)]
pub struct TagArgs {
    /// Note ID
    pub id: NoteId,

    /// Tag name
    pub tag: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `attach` command
#[derive(Parser, Debug)]
pub struct AttachArgs {
    /// Note ID
    pub id: NoteId,

    /// File to attach
    pub file: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `detach` command
#[derive(Parser, Debug)]
pub struct DetachArgs {
    /// Attachment ID
    pub id: AttachmentId,
}

/// Arguments for the `search` command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query (FTS5 syntax)
    pub query: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `export` command
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Output file or directory (default: simplynote_export_<date>.zip here)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `import` command
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Zip archive to import
    pub file: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `sweep` command
#[derive(Parser, Debug)]
pub struct SweepArgs {
    /// Purge expired trash of every user (no --user needed)
    #[arg(long)]
    pub all: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
