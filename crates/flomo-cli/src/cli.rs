use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "flomo-sync")]
#[command(about = "Import Flomo notes into your daily journal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Directory holding the Flomo export (memos.json and attached files)
    #[arg(long, global = true, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import notes changed since the last sync
    Sync {
        /// Ignore the saved cursor and re-import everything after the date floor
        #[arg(long)]
        full: bool,
    },
    /// Show or change sync settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Manage day journals
    Journal {
        #[command(subcommand)]
        action: JournalCommand,
    },
    /// Inspect or reset the sync cursor
    Cursor {
        #[command(subcommand)]
        action: CursorCommand,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update one or more settings
    Set {
        /// Text of the inbox block created under each day
        #[arg(long)]
        inbox_name: Option<String>,
        /// Tag applied to every imported note
        #[arg(long)]
        note_tag: Option<String>,
        /// Never import notes from before this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        after_date: Option<NaiveDate>,
        /// Remove the date floor
        #[arg(long, conflicts_with = "after_date")]
        clear_after_date: bool,
    },
}

#[derive(Subcommand)]
pub enum JournalCommand {
    /// Create the journal for a day
    Create {
        /// Day to create (YYYY-MM-DD)
        date: NaiveDate,
    },
    /// Print a day's journal tree
    Show {
        /// Day to show (YYYY-MM-DD)
        date: NaiveDate,
    },
}

#[derive(Subcommand)]
pub enum CursorCommand {
    /// Print the saved cursor
    Show,
    /// Forget the saved cursor so the next sync starts from the date floor
    Reset,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
