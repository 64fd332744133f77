use serde::{Deserialize, Serialize};

/// Lifecycle state of an order as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderState {
    Registered,
    #[serde(rename = "INCOURSE")]
    InCourse,
    Finished,
    Delivered,
}

impl OrderState {
    pub const ALL: [OrderState; 4] = [
        OrderState::Registered,
        OrderState::InCourse,
        OrderState::Finished,
        OrderState::Delivered,
    ];

    /// Backend value ("REGISTERED", "INCOURSE", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Registered => "REGISTERED",
            OrderState::InCourse => "INCOURSE",
            OrderState::Finished => "FINISHED",
            OrderState::Delivered => "DELIVERED",
        }
    }

    /// Label shown to shop staff.
    pub fn display(&self) -> &'static str {
        match self {
            OrderState::Registered => "Registrado",
            OrderState::InCourse => "En curso",
            OrderState::Finished => "Finalizado",
            OrderState::Delivered => "Entregado",
        }
    }

    pub fn bucket(&self) -> Bucket {
        match self {
            OrderState::Registered => Bucket::Registered,
            OrderState::InCourse => Bucket::InCourse,
            OrderState::Finished => Bucket::Finalized,
            OrderState::Delivered => Bucket::Delivered,
        }
    }
}

impl core::fmt::Display for OrderState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of the order board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    Registered,
    InCourse,
    Finalized,
    Delivered,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Registered,
        Bucket::InCourse,
        Bucket::Finalized,
        Bucket::Delivered,
    ];

    /// Drop-container id of the column.
    pub fn container_id(&self) -> &'static str {
        match self {
            Bucket::Registered => "registered",
            Bucket::InCourse => "inCourse",
            Bucket::Finalized => "finalized",
            Bucket::Delivered => "delivered",
        }
    }

    /// Resolve a drop-container id. Unknown ids fall back to the registered column.
    pub fn from_container_id(id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|b| b.container_id() == id)
            .unwrap_or(Bucket::Registered)
    }

    pub fn state(&self) -> OrderState {
        match self {
            Bucket::Registered => OrderState::Registered,
            Bucket::InCourse => OrderState::InCourse,
            Bucket::Finalized => OrderState::Finished,
            Bucket::Delivered => OrderState::Delivered,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Bucket::Registered => 0,
            Bucket::InCourse => 1,
            Bucket::Finalized => 2,
            Bucket::Delivered => 3,
        }
    }
}

/// Forward single-step transitions the client is notified about.
pub fn is_notifiable_transition(from: OrderState, to: OrderState) -> bool {
    matches!(
        (from, to),
        (OrderState::Registered, OrderState::InCourse)
            | (OrderState::InCourse, OrderState::Finished)
            | (OrderState::Finished, OrderState::Delivered)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_ids_map_to_states() {
        assert_eq!(Bucket::from_container_id("registered").state(), OrderState::Registered);
        assert_eq!(Bucket::from_container_id("inCourse").state(), OrderState::InCourse);
        assert_eq!(Bucket::from_container_id("finalized").state(), OrderState::Finished);
        assert_eq!(Bucket::from_container_id("delivered").state(), OrderState::Delivered);
    }

    #[test]
    fn unknown_container_falls_back_to_registered() {
        assert_eq!(Bucket::from_container_id("cdk-drop-list-7"), Bucket::Registered);
    }

    #[test]
    fn state_round_trips_through_its_bucket() {
        for state in OrderState::ALL {
            assert_eq!(state.bucket().state(), state);
        }
    }

    #[test]
    fn backend_values_are_uppercase() {
        let json = serde_json::to_string(&OrderState::InCourse).unwrap();
        assert_eq!(json, "\"INCOURSE\"");
        assert_eq!(OrderState::InCourse.to_string(), "INCOURSE");
    }

    #[test]
    fn only_forward_single_steps_are_notifiable() {
        assert!(is_notifiable_transition(OrderState::Registered, OrderState::InCourse));
        assert!(is_notifiable_transition(OrderState::Finished, OrderState::Delivered));
        assert!(!is_notifiable_transition(OrderState::Registered, OrderState::Delivered));
        assert!(!is_notifiable_transition(OrderState::InCourse, OrderState::Registered));
    }
}
