//! Archive command handlers (export, import).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::acting_user;
use crate::app::App;
use crate::cli::output::{OutputFormat, print_json};
use crate::cli::{ExportArgs, ImportArgs};

/// Where to write the archive: the given file, or the default name inside a
/// given directory or the current one.
fn export_target(output: Option<&Path>, default_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_name),
    }
}

pub fn handle_export(args: &ExportArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let (name, bytes) = app.export(owner).context("export failed")?;

    let target = export_target(args.output.as_deref(), &name);
    std::fs::write(&target, &bytes)
        .with_context(|| format!("failed to write {}", target.display()))?;

    println!("Exported to {} ({} bytes)", target.display(), bytes.len());
    Ok(())
}

pub fn handle_import(args: &ImportArgs, app: &App, user: Option<&str>) -> Result<()> {
    let owner = acting_user(app, user)?;
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let upload_name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let report = app
        .import(owner, &upload_name, &bytes)
        .with_context(|| format!("failed to import {}", args.file.display()))?;

    match args.format {
        OutputFormat::Human => println!("{}", report.message),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}
