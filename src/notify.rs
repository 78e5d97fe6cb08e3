//! Transient user-facing notices.
//!
//! The core never renders toasts itself. Failures and confirmations are
//! collected here and handed to the host through
//! [`EditorCore::drain_notices`](crate::engine::EditorCore::drain_notices).

#[cfg(test)]
#[path = "notify_test.rs"]
mod notify_test;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Pending notices, oldest first.
#[derive(Debug, Default)]
pub struct Notices {
    pending: Vec<Notice>,
}

impl Notices {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error notice; errors are also logged.
    pub fn push_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "user notice");
        self.pending.push(Notice { level: NoticeLevel::Error, message });
    }

    pub fn push_info(&mut self, message: impl Into<String>) {
        self.pending.push(Notice { level: NoticeLevel::Info, message: message.into() });
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
