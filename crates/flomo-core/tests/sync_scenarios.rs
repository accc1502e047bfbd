//! End-to-end sync runs against the in-memory and `SQLite` stores.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use flomo_core::db::{Database, SqliteStateStore};
use flomo_core::models::{FileKind, NoteFile};
use flomo_core::source::MemorySource;
use flomo_core::state::{MemoryStateStore, StateStore, SYNC_KEY};
use flomo_core::store::{BlockStore, MemoryBlockStore, SqliteBlockStore, TagQuery};
use flomo_core::sync::ID_PROPERTY;
use flomo_core::{
    Block, Error, Note, NoteId, Notifier, NotifyLevel, SyncOptions, SyncOutcome, SyncSettings,
    Synchronizer,
};

const INBOX: &str = "Flomo Inbox";
const TAG: &str = "Flomo Note";

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(NotifyLevel, String)>>,
}

impl RecordingNotifier {
    fn levels(&self) -> Vec<NotifyLevel> {
        self.messages.lock().unwrap().iter().map(|(level, _)| *level).collect()
    }

    fn last(&self) -> (NotifyLevel, String) {
        self.messages.lock().unwrap().last().cloned().unwrap()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        self.messages.lock().unwrap().push((level, message.to_string()));
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn note(id: i64, updated_at_long: i64, content: &str, tags: &[&str]) -> Note {
    let instant = DateTime::parse_from_rfc3339("2024-06-01T10:00:00+08:00").unwrap();
    Note {
        id: NoteId::from(id),
        slug: format!("note {id}"),
        content: content.to_string(),
        created_at: instant,
        updated_at: instant,
        updated_at_long,
        tags: tags.iter().map(ToString::to_string).collect(),
        files: Vec::new(),
    }
}

fn options() -> SyncOptions {
    SyncOptions::default().with_ready_delay(Duration::ZERO)
}

async fn run<B: BlockStore, T: StateStore>(
    store: &B,
    source: &MemorySource,
    state: &T,
    full_sync: bool,
) -> (flomo_core::Result<SyncOutcome>, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let outcome = Synchronizer::new(store, source, state, &notifier)
        .with_options(options())
        .sync(full_sync)
        .await;
    (outcome, notifier)
}

async fn cursor<T: StateStore>(state: &T) -> Option<i64> {
    state.get_value("flomo", SYNC_KEY).await.unwrap()
}

async fn records_for<B: BlockStore>(store: &B, id: &str) -> Vec<Block> {
    let query = TagQuery {
        limit: 10,
        ..TagQuery::single(TAG, ID_PROPERTY, id)
    };
    let ids = store.query(&query).await.unwrap();
    store.get_blocks(&ids).await.unwrap()
}

async fn inbox_children<B: BlockStore>(store: &B) -> Vec<Block> {
    let root = store.get_journal_block(day()).await.unwrap().unwrap();
    let inbox = root
        .children
        .iter()
        .copied()
        .find(|id| {
            store
                .cached_block(*id)
                .is_some_and(|block| block.text() == Some(INBOX))
        });
    let inbox = match inbox {
        Some(id) => store.get_block(id).await.unwrap().unwrap(),
        None => {
            let children = store.get_blocks(&root.children).await.unwrap();
            children
                .into_iter()
                .find(|block| block.text() == Some(INBOX))
                .unwrap()
        }
    };
    store.get_blocks(&inbox.children).await.unwrap()
}

async fn child_texts<B: BlockStore>(store: &B, block: &Block) -> Vec<String> {
    store
        .get_blocks(&block.children)
        .await
        .unwrap()
        .iter()
        .map(|child| child.content.value().to_string())
        .collect()
}

#[tokio::test]
async fn fresh_import_creates_inbox_and_advances_cursor() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.set_notes(vec![
        note(1, 100, "<p>first</p>", &["a", "b"]),
        note(2, 200, "<p>second</p>", &[]),
    ]);
    let state = MemoryStateStore::new();

    let (outcome, notifier) = run(&store, &source, &state, false).await;

    let SyncOutcome::Synced(report) = outcome.unwrap() else {
        panic!("expected a synced outcome");
    };
    assert_eq!(report.created, 2);
    assert_eq!(report.cursor, 200);
    assert_eq!(cursor(&state).await, Some(200));

    let records = inbox_children(&store).await;
    let slugs: Vec<&str> = records.iter().filter_map(Block::text).collect();
    assert_eq!(slugs, vec!["note 1", "note 2"]);
    assert_eq!(records[0].tag(TAG).unwrap().value_of(ID_PROPERTY), Some("1"));
    assert!(records[0].tag("a").is_some() && records[0].tag("b").is_some());

    assert_eq!(
        notifier.levels(),
        vec![NotifyLevel::Info, NotifyLevel::Success]
    );
    assert!(!source.is_session_open());
}

#[tokio::test]
async fn second_run_has_nothing_to_sync() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.set_notes(vec![note(1, 100, "a", &[]), note(2, 200, "b", &[])]);
    let state = MemoryStateStore::new();
    run(&store, &source, &state, false).await.0.unwrap();
    let mutations = store.mutation_count();

    let (outcome, notifier) = run(&store, &source, &state, false).await;

    assert_eq!(outcome.unwrap(), SyncOutcome::NothingToSync);
    assert_eq!(store.mutation_count(), mutations);
    assert_eq!(cursor(&state).await, Some(200));
    assert_eq!(notifier.last().1, "Nothing to sync.");
}

#[tokio::test]
async fn edited_note_replaces_children_and_tags() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.set_notes(vec![note(1, 100, "<p>draft</p><p>tail</p>", &["x", "y"])]);
    let state = MemoryStateStore::new();
    run(&store, &source, &state, false).await.0.unwrap();

    source.set_notes(vec![note(1, 300, "<p>final</p>", &["x"])]);
    let (outcome, _) = run(&store, &source, &state, false).await;

    let SyncOutcome::Synced(report) = outcome.unwrap() else {
        panic!("expected a synced outcome");
    };
    assert_eq!((report.created, report.updated), (0, 1));

    let records = records_for(&store, "1").await;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(child_texts(&store, record).await, vec!["final"]);
    assert!(record.tag("x").is_some());
    assert!(record.tag("y").is_none());
    assert_eq!(record.tag(TAG).unwrap().value_of(ID_PROPERTY), Some("1"));
    assert_eq!(cursor(&state).await, Some(300));
}

#[tokio::test]
async fn failing_asset_is_omitted() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.add_binary("file/ok.png", "image/png", vec![1, 2, 3]);
    let mut with_files = note(5, 100, "<p>body</p>", &[]);
    with_files.files = vec![
        NoteFile {
            url: "file/ok.png".to_string(),
            kind: FileKind::Image,
        },
        NoteFile {
            url: "file/broken.m4a".to_string(),
            kind: FileKind::Audio,
        },
    ];
    source.set_notes(vec![with_files]);
    let state = MemoryStateStore::new();

    let (outcome, _) = run(&store, &source, &state, false).await;

    assert!(matches!(outcome.unwrap(), SyncOutcome::Synced(_)));
    let record = records_for(&store, "5").await.remove(0);
    let children = store.get_blocks(&record.children).await.unwrap();
    let kinds: Vec<&str> = children.iter().map(|child| child.content.kind()).collect();
    assert_eq!(kinds, vec!["text", "image"]);
    assert_eq!(cursor(&state).await, Some(100));
}

#[tokio::test]
async fn not_logged_in_requests_login_and_keeps_cursor() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.set_notes(vec![note(1, 100, "a", &[])]);
    source.set_authenticated(false);
    let state = MemoryStateStore::new();
    state.set_value("flomo", SYNC_KEY, 50).await.unwrap();

    let (outcome, notifier) = run(&store, &source, &state, false).await;

    assert_eq!(outcome.unwrap(), SyncOutcome::NotLoggedIn);
    assert_eq!(source.login_requests(), 1);
    assert_eq!(source.sessions_opened(), 1);
    assert!(!source.is_session_open());
    assert_eq!(cursor(&state).await, Some(50));
    assert_eq!(store.mutation_count(), 0);
    assert_eq!(
        notifier.last(),
        (NotifyLevel::Warn, "Please log in to Flomo first.".to_string())
    );
}

#[tokio::test]
async fn unavailable_source_fails_the_run() {
    let store = MemoryBlockStore::new();
    let source = MemorySource::new();
    source.set_unavailable(true);
    let state = MemoryStateStore::new();

    let (outcome, notifier) = run(&store, &source, &state, false).await;

    assert!(matches!(outcome, Err(Error::SourceUnavailable(_))));
    assert!(!source.is_session_open());
    assert_eq!(cursor(&state).await, None);
    assert_eq!(
        notifier.last(),
        (NotifyLevel::Error, "Failed to sync Flomo notes.".to_string())
    );
}

#[tokio::test]
async fn failed_run_rolls_back_and_keeps_cursor() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.set_notes(vec![note(1, 100, "a", &[])]);
    let state = MemoryStateStore::new();
    run(&store, &source, &state, false).await.0.unwrap();
    let before = store.blocks();

    source.set_notes(vec![note(1, 150, "b", &[]), note(2, 160, "c", &[])]);
    store.fail_html_inserts(true);
    let (outcome, _) = run(&store, &source, &state, false).await;

    assert!(matches!(outcome, Err(Error::Store(_))));
    assert_eq!(store.blocks(), before);
    assert_eq!(cursor(&state).await, Some(100));

    store.fail_html_inserts(false);
    let (outcome, _) = run(&store, &source, &state, false).await;
    assert!(matches!(outcome.unwrap(), SyncOutcome::Synced(_)));
    assert_eq!(cursor(&state).await, Some(160));
}

#[tokio::test]
async fn days_without_journal_are_skipped() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    let mut orphan = note(9, 50, "orphan", &[]);
    orphan.created_at = DateTime::parse_from_rfc3339("2024-05-20T10:00:00+08:00").unwrap();
    source.set_notes(vec![orphan, note(1, 100, "kept", &[])]);
    let state = MemoryStateStore::new();

    let (outcome, _) = run(&store, &source, &state, false).await;

    let SyncOutcome::Synced(report) = outcome.unwrap() else {
        panic!("expected a synced outcome");
    };
    assert_eq!(
        report.skipped_days,
        vec![NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()]
    );
    assert_eq!(report.created, 1);
    assert!(store.get_journal_block(report.skipped_days[0]).await.unwrap().is_none());
    assert!(records_for(&store, "9").await.is_empty());
}

#[tokio::test]
async fn full_sync_is_idempotent() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.set_notes(vec![
        note(1, 100, "<p>a</p>", &["t"]),
        note(2, 200, "<p>b</p><p>c</p>", &[]),
    ]);
    let state = MemoryStateStore::new();
    run(&store, &source, &state, true).await.0.unwrap();
    let first = inbox_children(&store).await.len();
    let block_count = store.blocks().len();

    let (outcome, _) = run(&store, &source, &state, true).await;

    let SyncOutcome::Synced(report) = outcome.unwrap() else {
        panic!("expected a synced outcome");
    };
    assert_eq!((report.created, report.updated), (0, 2));
    assert_eq!(inbox_children(&store).await.len(), first);
    assert_eq!(store.blocks().len(), block_count);
    assert_eq!(records_for(&store, "2").await.len(), 1);
}

#[tokio::test]
async fn full_sync_never_lowers_cursor() {
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.set_notes(vec![note(1, 100, "a", &[])]);
    let state = MemoryStateStore::new();
    state.set_value("flomo", SYNC_KEY, 500).await.unwrap();

    let (outcome, _) = run(&store, &source, &state, true).await;

    assert!(matches!(outcome.unwrap(), SyncOutcome::Synced(_)));
    assert_eq!(cursor(&state).await, Some(500));
}

#[tokio::test]
async fn date_floor_applies_during_full_sync() {
    let settings = SyncSettings {
        after_date: Some(day()),
        ..SyncSettings::default()
    };
    let floor = settings.date_floor().unwrap();
    let store = MemoryBlockStore::new();
    store.create_journal(day());
    let source = MemorySource::new();
    source.set_notes(vec![note(1, floor - 1, "old", &[]), note(2, floor + 1, "new", &[])]);
    let state = MemoryStateStore::new();
    let notifier = RecordingNotifier::default();

    let outcome = Synchronizer::new(&store, &source, &state, &notifier)
        .with_settings(settings)
        .with_options(options())
        .sync(true)
        .await
        .unwrap();

    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected a synced outcome");
    };
    assert_eq!(report.created, 1);
    assert!(records_for(&store, "1").await.is_empty());
    assert_eq!(records_for(&store, "2").await.len(), 1);
}

#[tokio::test]
async fn sqlite_store_end_to_end() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("flomo.db");
    let source = MemorySource::new();
    source.set_notes(vec![
        note(1, 100, "<p>one</p>", &["a"]),
        note(2, 200, "<p>two</p>", &[]),
    ]);

    {
        let db = Database::open(&path).unwrap();
        let store = SqliteBlockStore::new(db.connection());
        store.create_journal_block(day()).unwrap();
        let state = SqliteStateStore::new(db.connection());

        let (outcome, _) = run(&store, &source, &state, false).await;
        let SyncOutcome::Synced(report) = outcome.unwrap() else {
            panic!("expected a synced outcome");
        };
        assert_eq!(report.created, 2);
    }

    let db = Database::open(&path).unwrap();
    let store = SqliteBlockStore::new(db.connection());
    let state = SqliteStateStore::new(db.connection());
    assert_eq!(cursor(&state).await, Some(200));

    let (outcome, _) = run(&store, &source, &state, false).await;
    assert_eq!(outcome.unwrap(), SyncOutcome::NothingToSync);

    source.set_notes(vec![note(1, 300, "<p>uno</p>", &[])]);
    let (outcome, _) = run(&store, &source, &state, true).await;
    let SyncOutcome::Synced(report) = outcome.unwrap() else {
        panic!("expected a synced outcome");
    };
    assert_eq!(report.updated, 1);

    let records = records_for(&store, "1").await;
    assert_eq!(records.len(), 1);
    assert_eq!(child_texts(&store, &records[0]).await, vec!["uno"]);
    assert!(records[0].tag("a").is_none());
    assert_eq!(inbox_children(&store).await.len(), 2);
    assert_eq!(cursor(&state).await, Some(300));
}
