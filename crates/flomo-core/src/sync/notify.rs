//! User-visible notifications raised during a sync run.

/// Severity of a notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Success,
    Warn,
    Error,
}

/// Receives messages meant for the user
pub trait Notifier {
    fn notify(&self, level: NotifyLevel, message: &str);
}

/// Notifier that only writes to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Info | NotifyLevel::Success => tracing::info!("{message}"),
            NotifyLevel::Warn => tracing::warn!("{message}"),
            NotifyLevel::Error => tracing::error!("{message}"),
        }
    }
}

pub(crate) const STARTING: &str = "Starting to sync, please wait...";
pub(crate) const LOGIN_REQUIRED: &str = "Please log in to Flomo first.";
pub(crate) const NOTHING_TO_SYNC: &str = "Nothing to sync.";
pub(crate) const SYNCED: &str = "Flomo notes synced successfully.";
pub(crate) const FAILED: &str = "Failed to sync Flomo notes.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_notifier_accepts_every_level() {
        for level in [
            NotifyLevel::Info,
            NotifyLevel::Success,
            NotifyLevel::Warn,
            NotifyLevel::Error,
        ] {
            TracingNotifier.notify(level, SYNCED);
        }
    }
}
