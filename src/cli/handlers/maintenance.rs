//! Maintenance handlers (sweep, completions).

use anyhow::{Context, Result};
use clap::CommandFactory;
use serde::Serialize;

use super::acting_user;
use crate::app::App;
use crate::cli::output::{OutputFormat, print_json};
use crate::cli::{Cli, CompletionsArgs, SweepArgs};

#[derive(Debug, Serialize)]
struct SweepResult {
    purged_notes: usize,
    orphan_links: usize,
    unused_tags: usize,
    released_files: usize,
}

pub fn handle_sweep(args: &SweepArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = if args.all {
        None
    } else {
        Some(acting_user(app, user)?)
    };
    let report = app.sweep(owner).context("sweep failed")?;

    match args.format {
        OutputFormat::Human => {
            if report.is_clean() {
                println!("Nothing to clean up");
            } else {
                println!(
                    "Purged {} trashed notes, {} orphaned links, {} unused tags",
                    report.purged_notes, report.orphan_links, report.unused_tags
                );
            }
        }
        OutputFormat::Json => print_json(SweepResult {
            purged_notes: report.purged_notes,
            orphan_links: report.orphan_links,
            unused_tags: report.unused_tags,
            released_files: report.released_files.len(),
        })?,
    }
    Ok(())
}

pub fn handle_completions(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
