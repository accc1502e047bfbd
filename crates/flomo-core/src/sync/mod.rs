//! Sync engine.
//!
//! `Synchronizer::sync` drives one run: it resolves the effective cursor,
//! pulls newer notes from the source, groups them by calendar day and
//! reconciles each group into that day's inbox inside one grouped store
//! batch. The cursor is written only after the whole batch committed.

mod asset;
mod inbox;
mod notify;
mod reconcile;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::SyncOptions;
use crate::error::Result;
use crate::models::{Note, SyncSettings};
use crate::source::NoteSource;
use crate::state::{StateStore, SYNC_KEY};
use crate::store::BlockStore;

pub use asset::import_asset;
pub use inbox::ensure_inbox;
pub use notify::{Notifier, NotifyLevel, TracingNotifier};
pub use reconcile::{reconcile_note, ReconcileOutcome, ID_PROPERTY};

/// How a sync run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The source has no logged-in user; a login was requested
    NotLoggedIn,
    /// No note is newer than the effective cursor
    NothingToSync,
    Synced(SyncReport),
}

/// Counters of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    /// Notes whose indexed record no longer resolved
    pub skipped: usize,
    /// Days that had notes but no day-root in the store
    pub skipped_days: Vec<NaiveDate>,
    /// Cursor persisted at the end of the run
    pub cursor: i64,
}

/// Combine the persisted cursor with the configured date floor.
///
/// A full sync ignores the persisted cursor but still honors the floor.
///
/// ```
/// use flomo_core::sync::effective_cursor;
///
/// assert_eq!(effective_cursor(Some(500), Some(300), false), Some(500));
/// assert_eq!(effective_cursor(Some(500), Some(300), true), Some(300));
/// assert_eq!(effective_cursor(Some(500), None, true), None);
/// ```
#[must_use]
pub fn effective_cursor(persisted: Option<i64>, floor: Option<i64>, full_sync: bool) -> Option<i64> {
    let persisted = if full_sync { None } else { persisted };
    match (persisted, floor) {
        (Some(persisted), Some(floor)) => Some(persisted.max(floor)),
        (persisted, floor) => persisted.or(floor),
    }
}

/// Group notes by their calendar day; days ascend, notes keep source order
#[must_use]
pub fn partition_by_day(notes: &[Note]) -> BTreeMap<NaiveDate, Vec<&Note>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Note>> = BTreeMap::new();
    for note in notes {
        days.entry(note.day()).or_default().push(note);
    }
    days
}

/// Drives sync runs against one store, source and state store
pub struct Synchronizer<'a, B, S, T, N> {
    store: &'a B,
    source: &'a S,
    state: &'a T,
    notifier: &'a N,
    settings: SyncSettings,
    options: SyncOptions,
}

impl<'a, B, S, T, N> Synchronizer<'a, B, S, T, N>
where
    B: BlockStore,
    S: NoteSource,
    T: StateStore,
    N: Notifier,
{
    pub fn new(store: &'a B, source: &'a S, state: &'a T, notifier: &'a N) -> Self {
        Self {
            store,
            source,
            state,
            notifier,
            settings: SyncSettings::default(),
            options: SyncOptions::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings.normalized();
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run one sync.
    ///
    /// `full_sync` ignores the persisted cursor. Not being logged in and having
    /// nothing to sync are outcomes, not errors. On error the store batch is
    /// rolled back and the cursor is left untouched. The source session is
    /// released on every path.
    pub async fn sync(&self, full_sync: bool) -> Result<SyncOutcome> {
        self.notifier
            .notify(NotifyLevel::Info, notify::STARTING);

        let result = self.run(full_sync).await;

        if let Err(error) = self.source.close_session().await {
            tracing::warn!(%error, "Failed to close the source session");
        }

        result.inspect_err(|error| {
            tracing::error!(target: "flomo_sync", %error, "Sync run failed");
            self.notifier.notify(NotifyLevel::Error, notify::FAILED);
        })
    }

    async fn run(&self, full_sync: bool) -> Result<SyncOutcome> {
        let plugin = self.options.plugin.as_str();
        let persisted = self.state.get_value(plugin, SYNC_KEY).await?;
        let cursor = effective_cursor(persisted, self.settings.date_floor(), full_sync);
        tracing::info!(?persisted, ?cursor, full_sync, "Starting sync run");

        self.source.open_session().await?;
        tokio::time::sleep(self.options.ready_delay).await;

        if !self.source.is_authenticated().await? {
            self.notifier
                .notify(NotifyLevel::Warn, notify::LOGIN_REQUIRED);
            self.source.request_login().await?;
            return Ok(SyncOutcome::NotLoggedIn);
        }

        let notes = self.source.fetch_notes_since(cursor).await?;
        let Some(tail) = notes.iter().map(|note| note.updated_at_long).max() else {
            self.notifier
                .notify(NotifyLevel::Info, notify::NOTHING_TO_SYNC);
            return Ok(SyncOutcome::NothingToSync);
        };

        self.store.begin_group().await?;
        let mut report = match self.apply(&partition_by_day(&notes)).await {
            Ok(report) => report,
            Err(error) => {
                if let Err(rollback) = self.store.rollback_group().await {
                    tracing::warn!(error = %rollback, "Failed to roll back the sync batch");
                }
                return Err(error);
            }
        };
        self.store.commit_group().await?;

        report.cursor = persisted.map_or(tail, |persisted| persisted.max(tail));
        self.state.set_value(plugin, SYNC_KEY, report.cursor).await?;

        tracing::info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            cursor = report.cursor,
            "Sync run finished"
        );
        self.notifier.notify(NotifyLevel::Success, notify::SYNCED);
        Ok(SyncOutcome::Synced(report))
    }

    async fn apply(&self, days: &BTreeMap<NaiveDate, Vec<&Note>>) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        for (day, notes) in days {
            let Some(day_root) = self.store.get_journal_block(*day).await? else {
                tracing::info!(%day, notes = notes.len(), "No journal for day, skipping");
                report.skipped_days.push(*day);
                continue;
            };
            let inbox = ensure_inbox(self.store, &day_root, &self.settings.inbox_name).await?;

            for note in notes {
                let outcome =
                    reconcile_note(self.store, self.source, note, &inbox, &self.settings.note_tag)
                        .await?;
                match outcome {
                    ReconcileOutcome::Created(_) => report.created += 1,
                    ReconcileOutcome::Updated(_) => report.updated += 1,
                    ReconcileOutcome::Skipped => report.skipped += 1,
                }
            }
        }

        Ok(report)
    }
}
