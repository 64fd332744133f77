//! Toast stack bookkeeping (pure, no timers).

use std::time::Duration;

use crate::toast::{Toast, ToastId, ToastRequest};

/// Display-time policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastTiming {
    /// Display time of a toast pushed onto an empty stack.
    pub base: Duration,
    /// Extra display time per toast already on screen.
    pub stagger: Duration,
}

impl Default for ToastTiming {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(2500),
            stagger: Duration::from_millis(500),
        }
    }
}

/// Visible toasts, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Put a toast on top of the stack and return it.
    ///
    /// The delay is `base (or the caller's duration) + depth × stagger`,
    /// where depth is the number of toasts already visible.
    pub fn push(&mut self, request: ToastRequest, timing: ToastTiming) -> Toast {
        self.next_id += 1;

        let duration = if request.can_close {
            None
        } else {
            let base = request.duration.unwrap_or(timing.base);
            let depth = u32::try_from(self.toasts.len()).unwrap_or(u32::MAX);
            Some(base + timing.stagger.saturating_mul(depth))
        };

        let toast = Toast {
            id: ToastId(self.next_id),
            message: request.message,
            kind: request.kind,
            show_icon: request.show_icon,
            can_close: request.can_close,
            duration,
        };

        self.toasts.insert(0, toast.clone());
        toast
    }

    /// Remove a toast. Returns `false` if it was already gone.
    pub fn close(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }
}
