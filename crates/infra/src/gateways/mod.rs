//! Collaborator implementations for development and tests.

pub mod in_memory;

pub use in_memory::{InMemoryInventoryGateway, InMemoryOrdersGateway, OrdersCall, RecordingNotifier};
