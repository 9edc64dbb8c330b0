//! User-facing notifications.
//!
//! The workflow never surfaces failures by crashing; it converts them into
//! transient notices handed to whatever notifier the host wired in (a
//! snackbar in a UI, stderr in a CLI).

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NoticeLevel::Success,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NoticeLevel::Info,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NoticeLevel::Error,
        }
    }
}

/// Sink for user-visible notices. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// A notifier that drops every notice. Useful for headless contexts and
/// tests that assert on other observable behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notice: Notice) {}
}
