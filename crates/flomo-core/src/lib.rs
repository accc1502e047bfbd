//! flomo-core - Core library for flomo-sync
//!
//! This crate contains the models, block store and note source contracts,
//! the `SQLite` persistence layer and the sync engine that imports notes from
//! the Flomo capture service into day-partitioned inboxes.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod source;
pub mod state;
pub mod store;
pub mod sync;
pub mod util;

pub use config::{AppConfig, SyncOptions};
pub use error::{Error, Result};
pub use models::{Block, BlockId, Note, NoteId, SyncSettings};
pub use sync::{Notifier, NotifyLevel, SyncOutcome, SyncReport, Synchronizer};
