use flomo_core::db::SqliteStateStore;
use flomo_core::state::{StateStore, SYNC_KEY};

use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_cursor_show(context: &Context) -> Result<(), CliError> {
    let db = context.open_database()?;
    let state = SqliteStateStore::new(db.connection());
    let cursor = state.get_value(&context.options.plugin, SYNC_KEY).await?;
    println!("{}", format_cursor(cursor));
    Ok(())
}

pub async fn run_cursor_reset(context: &Context) -> Result<(), CliError> {
    let db = context.open_database()?;
    let state = SqliteStateStore::new(db.connection());
    state.remove_value(&context.options.plugin, SYNC_KEY).await?;
    println!("Cursor reset; the next sync imports everything after the date floor");
    Ok(())
}

pub fn format_cursor(cursor: Option<i64>) -> String {
    cursor.map_or_else(
        || "No cursor saved (next sync reads the full history)".to_string(),
        |cursor| cursor.to_string(),
    )
}
