use std::io;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] flomo_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No journal exists for {0}; create it with `flomo-sync journal create {0}`")]
    JournalNotFound(NaiveDate),
    #[error("Nothing to update; pass at least one setting")]
    NoSettingsChange,
}
