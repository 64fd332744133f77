//! Observable application state.

use std::sync::Mutex;

use crate::bus::{EventBus, Subscription, SubscriptionId};
use crate::in_memory_bus::{InMemoryBusError, InMemoryEventBus};
use crate::teardown::TeardownToken;

/// A value with change notifications.
///
/// New subscribers immediately receive the current value, then every value
/// set afterwards. Used for state shared between components, such as the
/// signed-in user or the visible toast stack.
#[derive(Debug)]
pub struct StateCell<T> {
    value: Mutex<T>,
    bus: InMemoryEventBus<T>,
}

impl<T> StateCell<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            value: Mutex::new(initial),
            bus: InMemoryEventBus::new(),
        }
    }

    /// Current value (a clone).
    pub fn get(&self) -> T {
        match self.value.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) -> Result<(), InMemoryBusError> {
        let mut guard = self.value.lock().map_err(|_| InMemoryBusError::Poisoned)?;
        *guard = value.clone();
        // Publish under the lock so subscribers observe values in set order.
        self.bus.publish(value)
    }

    /// Update the value in place and notify subscribers with the result.
    pub fn update<F>(&self, f: F) -> Result<T, InMemoryBusError>
    where
        F: FnOnce(&mut T),
    {
        let mut guard = self.value.lock().map_err(|_| InMemoryBusError::Poisoned)?;
        f(&mut guard);
        let next = guard.clone();
        self.bus.publish(next.clone())?;
        Ok(next)
    }

    pub fn subscribe(&self) -> Subscription<T> {
        self.register(None)
    }

    pub fn subscribe_until(&self, teardown: &TeardownToken) -> Subscription<T> {
        self.register(Some(teardown.clone()))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn register(&self, teardown: Option<TeardownToken>) -> Subscription<T> {
        // Holding the value lock while registering guarantees the seed and
        // the following notifications are not interleaved with a `set`.
        match self.value.lock() {
            Ok(guard) => self.bus.register(Some(guard.clone()), teardown),
            Err(poisoned) => self.bus.register(Some(poisoned.into_inner().clone()), teardown),
        }
    }
}

impl<T> Default for StateCell<T>
where
    T: Clone + Default + Send + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}
