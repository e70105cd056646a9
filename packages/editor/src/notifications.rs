//! Notification/dialog boundary.
//!
//! The engine only asks yes/no questions before destructive operations and
//! reports rejected ones; presentation belongs to the host.

/// Dialog capability the host provides
pub trait Notifier {
    /// Ask the user to confirm `message`
    fn confirm(&self, title: &str, message: &str) -> bool;

    /// Report a rejected operation
    fn alert(&self, title: &str, message: &str);
}

/// Notifier that only logs, answering every confirmation the same way
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    pub answer: bool,
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self { answer: true }
    }
}

impl Notifier for LogNotifier {
    fn confirm(&self, title: &str, message: &str) -> bool {
        tracing::info!(title, message, answer = self.answer, "confirm");
        self.answer
    }

    fn alert(&self, title: &str, message: &str) {
        tracing::warn!(title, message, "alert");
    }
}
