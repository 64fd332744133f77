//! Typed publish/subscribe plumbing shared by Optica components.
//!
//! Components never reach for ambient singletons: the application-state
//! container hands them [`StateCell`]s and [`EventBus`]es, and every
//! long-lived subscription is keyed off a [`Teardown`] notifier owned by the
//! component that created it.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod state;
pub mod teardown;

pub use bus::{EventBus, Subscription, SubscriptionId};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use state::StateCell;
pub use teardown::{Teardown, TeardownToken};
