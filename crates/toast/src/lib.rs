//! User notifications ("toasts").
//!
//! Components report outcomes through the [`Notifier`] seam. The
//! [`ToastService`] keeps the visible stack in a
//! [`StateCell`](optica_events::StateCell) and auto-dismisses each toast
//! after a delay that grows with the number already on screen.

pub mod queue;
pub mod service;
pub mod toast;

pub use queue::{ToastQueue, ToastTiming};
pub use service::ToastService;
pub use toast::{Notifier, Toast, ToastId, ToastKind, ToastRequest};
