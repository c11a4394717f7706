//! simplynote - short text notes with tags, attachments and portable zip archives

pub mod app;
pub mod archive;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod store;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::App;
use cli::{
    Cli, Command, UserCommand,
    config::Config,
    handlers::{
        handle_attach, handle_completions, handle_detach, handle_edit, handle_empty_trash,
        handle_export, handle_import, handle_important, handle_list, handle_new, handle_remove,
        handle_restore, handle_search, handle_show, handle_sweep, handle_tag, handle_tags,
        handle_trash, handle_untag, handle_user_add,
    },
};

/// Installs the stderr log subscriber. `RUST_LOG` wins over `level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Completions(args) = &cli.command {
        return handle_completions(args);
    }

    let config = Config::load(cli.config.as_deref())?;
    init_logging(config.log_level(cli.verbose));

    let app = App::new(config.settings(cli.data_dir.as_deref()));
    let user = cli.user.as_deref();

    match &cli.command {
        Command::User(UserCommand::Add(args)) => handle_user_add(args, &app),
        Command::New(args) => handle_new(args, &app, user),
        Command::List(args) => handle_list(args, &app, user),
        Command::Show(args) => handle_show(args, &app, user),
        Command::Edit(args) => handle_edit(args, &app, user),
        Command::Remove(args) => handle_remove(args, &app, user),
        Command::Important(args) => handle_important(args, &app, user),
        Command::Tag(args) => handle_tag(args, &app, user),
        Command::Untag(args) => handle_untag(args, &app, user),
        Command::Tags(args) => handle_tags(args, &app, user),
        Command::Trash(args) => handle_trash(args, &app, user),
        Command::Restore(args) => handle_restore(args, &app, user),
        Command::EmptyTrash(args) => handle_empty_trash(args, &app, user),
        Command::Attach(args) => handle_attach(args, &app, user),
        Command::Detach(args) => handle_detach(args, &app, user),
        Command::Search(args) => handle_search(args, &app, user),
        Command::Export(args) => handle_export(args, &app, user),
        Command::Import(args) => handle_import(args, &app, user),
        Command::Sweep(args) => handle_sweep(args, &app, user),
        Command::Completions(args) => handle_completions(args),
    }
}
