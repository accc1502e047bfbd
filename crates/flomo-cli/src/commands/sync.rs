use flomo_core::db::{SettingsRepository, SqliteSettingsRepository, SqliteStateStore};
use flomo_core::source::ExportDirSource;
use flomo_core::store::SqliteBlockStore;
use flomo_core::{SyncOutcome, SyncReport, Synchronizer};

use crate::commands::common::Context;
use crate::error::CliError;
use crate::notifier::ConsoleNotifier;

pub async fn run_sync(context: &Context, full: bool) -> Result<(), CliError> {
    tracing::debug!(
        "Syncing {} into {}",
        context.export_dir.display(),
        context.db_path.display()
    );
    let db = context.open_database()?;
    let conn = db.connection();
    let settings = SqliteSettingsRepository::new(conn).load().await?;

    let store = SqliteBlockStore::new(conn);
    let state = SqliteStateStore::new(conn);
    let source = ExportDirSource::new(&context.export_dir);
    let notifier = ConsoleNotifier;

    let outcome = Synchronizer::new(&store, &source, &state, &notifier)
        .with_settings(settings)
        .with_options(context.options.clone())
        .sync(full)
        .await?;

    if let SyncOutcome::Synced(report) = outcome {
        for line in format_report_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn format_report_lines(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Created {}, updated {}, skipped {} (cursor {})",
        report.created, report.updated, report.skipped, report.cursor
    )];
    if !report.skipped_days.is_empty() {
        let days = report
            .skipped_days
            .iter()
            .map(|day| day.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("No journal for: {days}"));
    }
    lines
}
