use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use optica_core::OrderId;
use optica_events::Event;

use crate::state::OrderState;

/// Facts about orders published by the board and the order workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated {
        order_id: OrderId,
        occurred_at: DateTime<Utc>,
    },
    OrderUpdated {
        order_id: OrderId,
        occurred_at: DateTime<Utc>,
    },
    OrderMoved {
        order_id: OrderId,
        from: OrderState,
        to: OrderState,
        occurred_at: DateTime<Utc>,
    },
    OrderDeleted {
        order_id: OrderId,
        occurred_at: DateTime<Utc>,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> &OrderId {
        match self {
            OrderEvent::OrderCreated { order_id, .. }
            | OrderEvent::OrderUpdated { order_id, .. }
            | OrderEvent::OrderMoved { order_id, .. }
            | OrderEvent::OrderDeleted { order_id, .. } => order_id,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated { .. } => "orders.order.created",
            OrderEvent::OrderUpdated { .. } => "orders.order.updated",
            OrderEvent::OrderMoved { .. } => "orders.board.order_moved",
            OrderEvent::OrderDeleted { .. } => "orders.order.deleted",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated { occurred_at, .. }
            | OrderEvent::OrderUpdated { occurred_at, .. }
            | OrderEvent::OrderMoved { occurred_at, .. }
            | OrderEvent::OrderDeleted { occurred_at, .. } => *occurred_at,
        }
    }
}
