//! Output format types for CLI commands.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use crate::domain::NoteView;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Prints `data` wrapped in [`Output`] as pretty JSON.
pub fn print_json<T: Serialize>(data: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&Output::new(data))?);
    Ok(())
}

/// Truncates a string to a maximum display width, adding ellipsis if needed.
pub(crate) fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// Prints a table of notes, one line each.
pub fn print_note_table(notes: &[NoteView]) {
    if notes.is_empty() {
        println!("No notes found.");
        return;
    }

    println!("{:>6}  {:<1}  {:<40}  {:<24}  {:>10}", "ID", "!", "Title", "Tags", "Updated");
    println!(
        "{:>6}  {:<1}  {:<40}  {:<24}  {:>10}",
        "------",
        "-",
        "----------------------------------------",
        "------------------------",
        "----------"
    );
    for note in notes {
        let updated = note
            .updated_at
            .unwrap_or(note.created_at)
            .format("%Y-%m-%d")
            .to_string();
        println!(
            "{:>6}  {:<1}  {:<40}  {:<24}  {:>10}",
            note.id,
            if note.is_important { "*" } else { "" },
            truncate_str(&note.title, 40),
            truncate_str(&note.tags.join(", "), 24),
            updated
        );
    }
}

/// Prints one note with its metadata header.
pub fn print_note(note: &NoteView) {
    println!("# {}", note.title);
    println!("id: {}", note.id);
    if note.is_important {
        println!("important: yes");
    }
    if !note.tags.is_empty() {
        println!("tags: {}", note.tags.join(", "));
    }
    println!("created: {}", note.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(updated) = note.updated_at {
        println!("updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    for file in &note.files {
        println!("file: [{}] {} ({})", file.id, file.filename, file.url);
    }
    println!();
    println!("{}", note.content);
}
