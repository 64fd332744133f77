use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

/// What a component asks to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastRequest {
    pub message: String,
    pub kind: ToastKind,
    pub show_icon: bool,
    /// Toasts that can be closed manually are never auto-dismissed.
    pub can_close: bool,
    /// Custom display time; ignored for closable toasts.
    pub duration: Option<Duration>,
}

impl ToastRequest {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            show_icon: true,
            can_close: false,
            duration: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, message)
    }

    pub fn closable(mut self) -> Self {
        self.can_close = true;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(pub u64);

/// A toast on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub show_icon: bool,
    pub can_close: bool,
    /// Effective auto-dismiss delay, `None` for closable toasts.
    pub duration: Option<Duration>,
}

/// Fire-and-forget notification seam.
pub trait Notifier: Send + Sync {
    fn show_toast(&self, request: ToastRequest);

    fn success(&self, message: &str) {
        self.show_toast(ToastRequest::success(message));
    }

    fn warning(&self, message: &str) {
        self.show_toast(ToastRequest::warning(message));
    }

    fn error(&self, message: &str) {
        self.show_toast(ToastRequest::error(message));
    }
}

impl<N> Notifier for std::sync::Arc<N>
where
    N: Notifier + ?Sized,
{
    fn show_toast(&self, request: ToastRequest) {
        (**self).show_toast(request)
    }
}
