//! Order cards shown on the board.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use optica_core::{Entity, OrderId};

use crate::payload::OrderRecord;
use crate::state::OrderState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCard {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub client_name: String,
    pub document: String,
    pub date: DateTime<Utc>,
    pub order_state: OrderState,
}

impl OrderCard {
    /// Whether an already-normalized search term hits this card.
    pub fn matches(&self, normalized_term: &str) -> bool {
        [
            Some(self.client_name.as_str()),
            Some(self.id.as_str()),
            Some(self.document.as_str()),
            self.order_number.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| normalize_text(field).contains(normalized_term))
    }
}

impl Entity for OrderCard {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl From<&OrderRecord> for OrderCard {
    fn from(record: &OrderRecord) -> Self {
        let (order_number, client_name, document) = match &record.client {
            Some(client) => (
                record.order_number.clone(),
                format!("{} {}", client.name, client.last_name),
                client.document.clone(),
            ),
            None => (
                None,
                record.client_name.clone().unwrap_or_default(),
                record.document.clone().unwrap_or_default(),
            ),
        };

        Self {
            id: record.id.clone(),
            order_number,
            client_name,
            document,
            date: record.created_at,
            order_state: record.state,
        }
    }
}

/// Lower-case and strip accents so "Gómez" matches "gomez".
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

/// Coarse age of an order for its card: days, hours, minutes or seconds.
pub fn elapsed_label(now: DateTime<Utc>, since: DateTime<Utc>) -> String {
    let seconds = (now - since).num_seconds().unsigned_abs();
    match seconds {
        s if s >= 86_400 => format!("{} días", s / 86_400),
        s if s >= 3_600 => format!("{} horas", s / 3_600),
        s if s >= 60 => format!("{} minutos", s / 60),
        s => format!("{s}seg"),
    }
}
