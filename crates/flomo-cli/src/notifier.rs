use flomo_core::{Notifier, NotifyLevel};

/// Prints sync notifications to stderr
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNotifier;

pub const fn level_prefix(level: NotifyLevel) -> &'static str {
    match level {
        NotifyLevel::Info => "info",
        NotifyLevel::Success => "done",
        NotifyLevel::Warn => "warning",
        NotifyLevel::Error => "error",
    }
}

pub fn format_notification(level: NotifyLevel, message: &str) -> String {
    format!("{}: {message}", level_prefix(level))
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        eprintln!("{}", format_notification(level, message));
    }
}
