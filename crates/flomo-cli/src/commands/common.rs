use std::env;
use std::path::{Path, PathBuf};

use flomo_core::db::Database;
use flomo_core::{AppConfig, SyncOptions};

use crate::error::CliError;

const APP_DIR: &str = "flomo-sync";
const CONFIG_FILE: &str = "config.json";

/// Paths and options every command runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
    pub options: SyncOptions,
}

impl Context {
    /// Resolve from flags, then environment, then the config file, then platform defaults
    pub fn resolve(
        cli_db_path: Option<PathBuf>,
        cli_export_dir: Option<PathBuf>,
        cli_config: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let config = load_config(&resolve_config_path(cli_config))?;
        Ok(Self {
            db_path: resolve_db_path(cli_db_path, &config),
            export_dir: resolve_export_dir(cli_export_dir, &config),
            options: config.sync_options(),
        })
    }

    pub fn open_database(&self) -> Result<Database, CliError> {
        open_database(&self.db_path)
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, CliError> {
    AppConfig::load(path)
        .map_err(|error| CliError::Config(format!("{}: {error}", path.display())))
}

pub fn resolve_config_path(cli_config: Option<PathBuf>) -> PathBuf {
    cli_config
        .or_else(|| env::var_os("FLOMO_SYNC_CONFIG").map(PathBuf::from))
        .unwrap_or_else(default_config_path)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("FLOMO_SYNC_DB_PATH").map(PathBuf::from))
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(default_db_path)
}

pub fn resolve_export_dir(cli_export_dir: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    cli_export_dir
        .or_else(|| env::var_os("FLOMO_EXPORT_DIR").map(PathBuf::from))
        .or_else(|| config.export_dir.clone())
        .unwrap_or_else(default_export_dir)
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

pub fn default_db_path() -> PathBuf {
    data_dir().join("flomo-sync.db")
}

pub fn default_export_dir() -> PathBuf {
    data_dir().join("export")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn open_database(path: &Path) -> Result<Database, CliError> {
    Ok(Database::open(path)?)
}
