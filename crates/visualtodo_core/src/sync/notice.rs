//! Non-fatal user-visible notices.

use tokio::sync::mpsc;

pub const OFFLINE_NOTICE: &str = "Working offline - changes saved locally";
pub const IMAGE_FALLBACK_NOTICE: &str = "Failed to upload image to cloud, using local storage";
pub const ADDED_NOTICE: &str = "Todo added!";
pub const DELETED_NOTICE: &str = "Todo deleted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Sending half handed to the engine; clones share one channel.
#[derive(Debug, Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    /// Emits `notice`; silently dropped when nobody listens anymore.
    pub fn emit(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }
}

pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx }, rx)
}
