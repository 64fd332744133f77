//! Event publishing/subscription abstraction (mechanics only).
//!
//! This module provides the **event bus pattern**: a pub/sub mechanism that
//! distributes typed payloads (current user, toasts, board events) to every
//! component interested in them.
//!
//! ## Delivery
//!
//! - **Broadcast**: each subscriber receives a clone of every message
//!   published after it subscribed.
//! - **In order per publisher**: a single publisher's messages arrive in the
//!   order they were published.
//! - **No persistence**: the bus distributes, it does not store. Use a
//!   [`StateCell`](crate::StateCell) when late subscribers need the latest value.
//!
//! ## Lifetime
//!
//! A subscription ends when it is dropped, when it is explicitly
//! unsubscribed, or when the [`TeardownToken`] it was bound to fires.

use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use crate::teardown::TeardownToken;

/// Opaque handle identifying one subscription on one bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// A subscription to a message stream.
///
/// Subscriptions are designed for single-consumer use: the component that
/// subscribed drains it from its own event loop.
#[derive(Debug)]
pub struct Subscription<M> {
    id: SubscriptionId,
    receiver: Receiver<M>,
    teardown: Option<TeardownToken>,
}

impl<M> Subscription<M> {
    pub fn new(id: SubscriptionId, receiver: Receiver<M>) -> Self {
        Self {
            id,
            receiver,
            teardown: None,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Bind this subscription to a teardown notifier.
    ///
    /// Once the notifier fires, every receive call reports the stream as
    /// disconnected, even if messages are still buffered.
    pub fn take_until(mut self, teardown: TeardownToken) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Whether the bound teardown notifier has fired.
    pub fn is_torn_down(&self) -> bool {
        self.teardown
            .as_ref()
            .is_some_and(TeardownToken::is_fired)
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        if self.is_torn_down() {
            return Err(TryRecvError::Disconnected);
        }
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        if self.is_torn_down() {
            return Err(RecvTimeoutError::Disconnected);
        }
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every message currently buffered.
    pub fn drain(&self) -> Vec<M> {
        let mut out = Vec::new();
        while let Ok(message) = self.try_recv() {
            out.push(message);
        }
        out
    }
}

/// Typed publish/subscribe abstraction.
///
/// The trait requires `Send + Sync` so a single bus can be shared between the
/// UI event loop and background tasks (e.g. the task persisting a board move).
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;

    /// Remove a subscription. Returns `false` when it was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Subscribe for as long as `teardown` has not fired.
    fn subscribe_until(&self, teardown: &TeardownToken) -> Subscription<M> {
        self.subscribe().take_until(teardown.clone())
    }
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}
