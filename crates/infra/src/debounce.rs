//! Cancel-and-reschedule debounce timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use optica_events::TeardownToken;

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Slot<T> {
    pending: Option<JoinHandle<()>>,
    last_emitted: Option<T>,
}

/// Emits the latest input once no new input arrived for `delay`.
///
/// Each [`Debouncer::push`] cancels the pending timer and starts a new one.
/// A value equal to the last emitted one is not emitted again. Nothing is
/// emitted after the bound teardown notifier fires.
pub struct Debouncer<T> {
    delay: Duration,
    slot: Arc<Mutex<Slot<T>>>,
    callback: Callback<T>,
    teardown: TeardownToken,
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    pub fn new<F>(delay: Duration, teardown: TeardownToken, callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            slot: Arc::new(Mutex::new(Slot {
                pending: None,
                last_emitted: None,
            })),
            callback: Arc::new(callback),
            teardown,
        }
    }

    /// Feed a new input. Must be called from within a tokio runtime.
    pub fn push(&self, value: T) {
        let Ok(mut slot) = self.slot.lock() else {
            tracing::warn!("debounce state lock poisoned; input dropped");
            return;
        };
        if let Some(pending) = slot.pending.take() {
            pending.abort();
        }
        if self.teardown.is_fired() {
            return;
        }

        let delay = self.delay;
        let shared = Arc::clone(&self.slot);
        let callback = Arc::clone(&self.callback);
        let teardown = self.teardown.clone();

        slot.pending = Some(tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = teardown.fired() => return,
            }

            {
                let Ok(mut slot) = shared.lock() else {
                    return;
                };
                if slot.last_emitted.as_ref() == Some(&value) {
                    return;
                }
                slot.last_emitted = Some(value.clone());
                slot.pending = None;
            }
            callback(value);
        }));
    }

    /// Drop any pending input without emitting it.
    pub fn cancel(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(pending) = slot.pending.take() {
                pending.abort();
            }
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(pending) = slot.pending.take() {
                pending.abort();
            }
        }
    }
}
