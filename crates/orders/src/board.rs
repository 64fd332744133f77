//! Order board: four state columns of order cards.
//!
//! The board is a synchronous, single-writer model. A cross-column move is
//! applied locally right away and reported as a [`Transition`]; persisting
//! it is the caller's concern and never rolls the board back.

use chrono::{DateTime, Utc};

use optica_core::{DomainError, Entity, OrderId};

use crate::card::{OrderCard, normalize_text};
use crate::payload::OrderRecord;
use crate::state::{Bucket, OrderState, is_notifiable_transition};

/// Date ordering of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    RecentFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::RecentFirst => SortOrder::OldestFirst,
            SortOrder::OldestFirst => SortOrder::RecentFirst,
        }
    }
}

/// A card that changed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub order_id: OrderId,
    pub from: OrderState,
    pub to: OrderState,
}

impl Transition {
    /// Success notification for the move.
    pub fn message(&self) -> String {
        format!(
            "Orden {} movida a {}",
            self.order_id,
            self.to.display().to_lowercase()
        )
    }

    /// Whether the client should hear about this move.
    pub fn is_notifiable(&self) -> bool {
        is_notifiable_transition(self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Reordered inside one column; nothing to persist.
    Reordered,
    /// Moved to another column; the new state must be persisted.
    Transferred(Transition),
}

pub fn delete_success_message(id: &OrderId) -> String {
    format!("Orden {id} eliminada con éxito")
}

pub fn delete_failure_message(id: &OrderId) -> String {
    format!("Error al eliminar orden con ID: {id}")
}

#[derive(Debug, Clone, Default)]
pub struct OrderBoard {
    all: Vec<OrderCard>,
    columns: [Vec<OrderCard>; 4],
    sort: [SortOrder; 4],
    search: String,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the board contents with the backend's orders.
    pub fn populate(&mut self, records: &[OrderRecord]) {
        self.all = records.iter().map(OrderCard::from).collect();
        tracing::debug!(orders = self.all.len(), "order board populated");
        self.apply_filters();
    }

    pub fn column(&self, bucket: Bucket) -> &[OrderCard] {
        &self.columns[bucket.index()]
    }

    pub fn sort_order(&self, bucket: Bucket) -> SortOrder {
        self.sort[bucket.index()]
    }

    pub fn search_term(&self) -> &str {
        &self.search
    }

    pub fn card(&self, id: &OrderId) -> Option<&OrderCard> {
        self.all.iter().find(|c| c.id() == id)
    }

    /// Filter every column by a free-text term (case and accent insensitive).
    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.apply_filters();
    }

    /// Flip a column between most recent first and oldest first.
    pub fn toggle_sort(&mut self, bucket: Bucket) -> SortOrder {
        let order = self.sort[bucket.index()].toggled();
        self.sort[bucket.index()] = order;
        self.apply_filters();
        order
    }

    /// Apply a drag-and-drop.
    ///
    /// Within one column the card is reordered. Across columns it is moved
    /// to `current_index` (clamped to the target length) and takes the
    /// target column's state.
    pub fn move_order(
        &mut self,
        from: Bucket,
        to: Bucket,
        previous_index: usize,
        current_index: usize,
    ) -> Result<MoveOutcome, DomainError> {
        let source_len = self.columns[from.index()].len();
        if previous_index >= source_len {
            return Err(DomainError::out_of_range(
                "previousIndex",
                previous_index,
                0,
                source_len.saturating_sub(1),
            ));
        }

        if from == to {
            let column = &mut self.columns[from.index()];
            let card = column.remove(previous_index);
            let index = current_index.min(column.len());
            column.insert(index, card);
            return Ok(MoveOutcome::Reordered);
        }

        let mut card = self.columns[from.index()].remove(previous_index);
        let previous_state = card.order_state;
        card.order_state = to.state();

        if let Some(stored) = self.all.iter_mut().find(|c| c.id == card.id) {
            stored.order_state = card.order_state;
        }

        let transition = Transition {
            order_id: card.id.clone(),
            from: previous_state,
            to: card.order_state,
        };

        let target = &mut self.columns[to.index()];
        let index = current_index.min(target.len());
        target.insert(index, card);

        tracing::info!(
            order_id = %transition.order_id,
            from = %transition.from,
            to = %transition.to,
            "order moved"
        );
        Ok(MoveOutcome::Transferred(transition))
    }

    /// Drop a deleted order from its column and from the board.
    pub fn remove(&mut self, bucket: Bucket, id: &OrderId) -> Option<OrderCard> {
        self.all.retain(|c| &c.id != id);
        let column = &mut self.columns[bucket.index()];
        let index = column.iter().position(|c| &c.id == id)?;
        Some(column.remove(index))
    }

    /// Add a freshly created order.
    pub fn insert(&mut self, card: OrderCard) {
        self.all.push(card);
        self.apply_filters();
    }

    /// Put a card back in the column of its backend-confirmed state after
    /// `failed` could not be persisted.
    ///
    /// A card moved again since `failed` is left where the operator put it.
    /// Returns whether the card was corrected; a corrected card goes to the
    /// top of its column.
    pub fn reconcile(&mut self, failed: &Transition, confirmed: OrderState) -> bool {
        let id = &failed.order_id;
        let Some(current) = self.card(id).map(|c| c.order_state) else {
            return false;
        };
        if current != failed.to || current == confirmed {
            return false;
        }

        if let Some(stored) = self.all.iter_mut().find(|c| &c.id == id) {
            stored.order_state = confirmed;
        }
        let column = &mut self.columns[current.bucket().index()];
        if let Some(index) = column.iter().position(|c| &c.id == id) {
            let mut card = column.remove(index);
            card.order_state = confirmed;
            self.columns[confirmed.bucket().index()].insert(0, card);
        }

        tracing::info!(order_id = %id, from = %current, to = %confirmed, "order card reconciled");
        true
    }

    fn apply_filters(&mut self) {
        let term = normalize_text(&self.search);
        for bucket in Bucket::ALL {
            let state = bucket.state();
            let mut cards: Vec<OrderCard> = self
                .all
                .iter()
                .filter(|c| c.order_state == state)
                .filter(|c| term.is_empty() || c.matches(&term))
                .cloned()
                .collect();
            sort_cards(&mut cards, self.sort[bucket.index()]);
            self.columns[bucket.index()] = cards;
        }
    }
}

fn sort_cards(cards: &mut [OrderCard], order: SortOrder) {
    let key = |c: &OrderCard| -> DateTime<Utc> { c.date };
    match order {
        SortOrder::RecentFirst => cards.sort_by(|a, b| key(b).cmp(&key(a))),
        SortOrder::OldestFirst => cards.sort_by_key(key),
    }
}
