//! Toast stack with timer-driven auto-dismiss.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use optica_events::{StateCell, Subscription, TeardownToken};

use crate::queue::{ToastQueue, ToastTiming};
use crate::toast::{Notifier, Toast, ToastId, ToastRequest};

#[derive(Debug)]
struct Inner {
    queue: Mutex<ToastQueue>,
    visible: StateCell<Vec<Toast>>,
    timers: Mutex<HashMap<ToastId, JoinHandle<()>>>,
    timing: ToastTiming,
}

impl Inner {
    fn publish(&self, queue: &ToastQueue) {
        if self.visible.set(queue.toasts().to_vec()).is_err() {
            tracing::warn!("toast state lock poisoned; stack not published");
        }
    }

    fn close(&self, id: ToastId, from_timer: bool) -> bool {
        let removed = match self.queue.lock() {
            Ok(mut queue) => {
                let removed = queue.close(id);
                if removed {
                    self.publish(&queue);
                }
                removed
            }
            Err(_) => false,
        };

        if let Ok(mut timers) = self.timers.lock() {
            if let Some(handle) = timers.remove(&id) {
                if !from_timer {
                    handle.abort();
                }
            }
        }

        removed
    }
}

/// Application-wide toast stack.
///
/// Cheap to clone; clones share the same stack.
#[derive(Debug, Clone)]
pub struct ToastService {
    inner: Arc<Inner>,
}

impl ToastService {
    pub fn new(timing: ToastTiming) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: Mutex::new(ToastQueue::new()),
                visible: StateCell::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
                timing,
            }),
        }
    }

    /// Toasts currently on screen, newest first.
    pub fn visible(&self) -> Vec<Toast> {
        self.inner.visible.get()
    }

    /// Observe the toast stack until `teardown` fires.
    pub fn subscribe_until(&self, teardown: &TeardownToken) -> Subscription<Vec<Toast>> {
        self.inner.visible.subscribe_until(teardown)
    }

    /// Close a toast before its timer runs out.
    pub fn close(&self, id: ToastId) -> bool {
        self.inner.close(id, false)
    }

    fn schedule_dismiss(&self, toast: &Toast) {
        let Some(delay) = toast.duration else {
            return;
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(toast_id = toast.id.0, "no async runtime; toast will not auto-dismiss");
            return;
        };

        let inner = Arc::clone(&self.inner);
        let id = toast.id;
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.close(id, true);
        });

        if let Ok(mut timers) = self.inner.timers.lock() {
            timers.insert(id, task);
        }
    }
}

impl Default for ToastService {
    fn default() -> Self {
        Self::new(ToastTiming::default())
    }
}

impl Notifier for ToastService {
    fn show_toast(&self, request: ToastRequest) {
        let toast = {
            let Ok(mut queue) = self.inner.queue.lock() else {
                tracing::warn!(message = %request.message, "toast queue lock poisoned; dropping toast");
                return;
            };
            let toast = queue.push(request, self.inner.timing);
            self.inner.publish(&queue);
            toast
        };

        tracing::debug!(toast_id = toast.id.0, kind = ?toast.kind, message = %toast.message, "toast shown");
        self.schedule_dismiss(&toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use optica_events::Teardown;

    #[tokio::test(start_paused = true)]
    async fn toast_is_dismissed_after_its_delay() {
        let service = ToastService::default();
        service.success("Orden creada con éxito");
        assert_eq!(service.visible().len(), 1);

        tokio::time::sleep(Duration::from_millis(2499)).await;
        assert_eq!(service.visible().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(service.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stacked_toasts_leave_in_stagger_order() {
        let service = ToastService::default();
        service.success("primero");
        service.warning("segundo");

        tokio::time::sleep(Duration::from_millis(2600)).await;
        let left: Vec<_> = service.visible().into_iter().map(|t| t.message).collect();
        assert_eq!(left, vec!["segundo".to_string()]);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(service.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn closable_toast_stays_until_closed() {
        let service = ToastService::default();
        service.show_toast(ToastRequest::error("sin conexión").closable());

        tokio::time::sleep(Duration::from_secs(60)).await;
        let visible = service.visible();
        assert_eq!(visible.len(), 1);

        assert!(service.close(visible[0].id));
        assert!(service.visible().is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_each_stack_change() {
        let service = ToastService::default();
        let teardown = Teardown::new();
        let sub = service.subscribe_until(&teardown.token());

        service.error("Error al crear orden");
        let id = service.visible()[0].id;
        service.close(id);

        let sizes: Vec<usize> = sub.drain().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![0, 1, 0]);
    }

    #[test]
    fn works_without_a_runtime() {
        let service = ToastService::default();
        service.warning("Debes de seleccionar un beneficio");
        assert_eq!(service.visible().len(), 1);
    }
}
