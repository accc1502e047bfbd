//! flomo-sync - Import Flomo notes into a local daily journal
//!
//! Reads a Flomo export directory and reconciles its notes into the
//! day-partitioned block store kept in a local `SQLite` database.

mod cli;
mod commands;
mod error;
mod notifier;

use clap::Parser;

use crate::cli::{Cli, Commands, CursorCommand, JournalCommand, SettingsCommand};
use crate::commands::common::Context;
use crate::commands::completions::run_completions;
use crate::commands::cursor::{run_cursor_reset, run_cursor_show};
use crate::commands::journal::{run_journal_create, run_journal_show};
use crate::commands::settings::{run_settings_set, run_settings_show, SettingsUpdate};
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive: tracing_subscriber::filter::Directive = "flomo=info"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let context = Context::resolve(cli.db_path, cli.export_dir, cli.config)?;

    match cli.command {
        Commands::Sync { full } => run_sync(&context, full).await?,
        Commands::Settings { action } => match action {
            SettingsCommand::Show { json } => run_settings_show(&context, json).await?,
            SettingsCommand::Set {
                inbox_name,
                note_tag,
                after_date,
                clear_after_date,
            } => {
                let update = SettingsUpdate {
                    inbox_name,
                    note_tag,
                    after_date,
                    clear_after_date,
                };
                run_settings_set(&context, update).await?;
            }
        },
        Commands::Journal { action } => match action {
            JournalCommand::Create { date } => run_journal_create(&context, date)?,
            JournalCommand::Show { date } => run_journal_show(&context, date).await?,
        },
        Commands::Cursor { action } => match action {
            CursorCommand::Show => run_cursor_show(&context).await?,
            CursorCommand::Reset => run_cursor_reset(&context).await?,
        },
        Commands::Completions { .. } => {}
    }

    Ok(())
}
