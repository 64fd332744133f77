use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are facts about something that already happened (an order card
/// moved, a benefit was applied). They are cloned to every subscriber.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "orders.board.order_moved").
    fn event_type(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
