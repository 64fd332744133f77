//! In-process event bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, mpsc};

use crate::bus::{EventBus, Subscription, SubscriptionId};
use crate::teardown::TeardownToken;

#[derive(Debug)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    Poisoned,
}

#[derive(Debug)]
struct Subscriber<M> {
    id: SubscriptionId,
    sender: mpsc::Sender<M>,
    teardown: Option<TeardownToken>,
}

impl<M> Subscriber<M> {
    fn is_live(&self) -> bool {
        !self.teardown.as_ref().is_some_and(TeardownToken::is_fired)
    }
}

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - Fan-out to every live subscriber
/// - Dropped and torn-down subscribers are pruned on the next publish
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<Subscriber<M>>>,
    next_id: AtomicU64,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscribers currently registered (live or not yet pruned).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
    }

    /// Register a subscriber, optionally seeding its queue with one message.
    pub(crate) fn register(
        &self,
        seed: Option<M>,
        teardown: Option<TeardownToken>,
    ) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        if let Some(message) = seed {
            // The receiver is alive in this scope, so this cannot fail.
            let _ = tx.send(message);
        }

        // If the lock is poisoned we still return a subscription;
        // it just won't receive further messages.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(Subscriber {
                id,
                sender: tx,
                teardown: teardown.clone(),
            });
        } else {
            tracing::warn!("event bus lock poisoned; subscription will stay empty");
        }

        let subscription = Subscription::new(id, rx);
        match teardown {
            Some(token) => subscription.take_until(token),
            None => subscription,
        }
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| InMemoryBusError::Poisoned)?;

        subs.retain(|sub| sub.is_live() && sub.sender.send(message.clone()).is_ok());

        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        self.register(None, None)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut subs) = self.subscribers.lock() else {
            return false;
        };
        let before = subs.len();
        subs.retain(|sub| sub.id != id);
        subs.len() != before
    }

    fn subscribe_until(&self, teardown: &TeardownToken) -> Subscription<M> {
        self.register(None, Some(teardown.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teardown::Teardown;

    #[test]
    fn every_subscriber_receives_every_message() {
        let bus = InMemoryEventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(1u32).unwrap();
        bus.publish(2u32).unwrap();

        assert_eq!(a.drain(), vec![1, 2]);
        assert_eq!(b.drain(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = InMemoryEventBus::new();
        let sub = bus.subscribe();

        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));

        bus.publish("ignored").unwrap();
        assert!(sub.drain().is_empty());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_publish() {
        let bus = InMemoryEventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(7u8).unwrap();

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.drain(), vec![7]);
    }

    #[test]
    fn teardown_ends_every_bound_subscription() {
        let bus = InMemoryEventBus::new();
        let teardown = Teardown::new();
        let bound = bus.subscribe_until(&teardown.token());
        let free = bus.subscribe();

        bus.publish(1u8).unwrap();
        teardown.fire();
        bus.publish(2u8).unwrap();

        assert!(bound.drain().is_empty());
        assert!(bound.is_torn_down());
        assert_eq!(free.drain(), vec![1, 2]);
        assert_eq!(bus.subscriber_count(), 1);
    }
}
