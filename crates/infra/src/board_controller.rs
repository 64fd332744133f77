//! Order board wiring: backend loading, drag-and-drop persistence, deletion
//! and debounced search.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use chrono::Utc;
use tokio::task::JoinHandle;

use optica_auth::PrivilegedAction;
use optica_core::{DomainError, OrderId};
use optica_events::Teardown;
use optica_orders::{
    Bucket, MoveOutcome, OrderBoard, OrderEvent, SortOrder, delete_failure_message,
    delete_success_message,
};

use crate::app_state::AppState;
use crate::debounce::Debouncer;

fn lock(board: &Mutex<OrderBoard>) -> MutexGuard<'_, OrderBoard> {
    match board.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct BoardController {
    app: Arc<AppState>,
    board: Arc<Mutex<OrderBoard>>,
    search: Debouncer<String>,
    teardown: Teardown,
}

impl std::fmt::Debug for BoardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardController")
            .field("search", &self.search)
            .field("torn_down", &self.teardown.is_fired())
            .finish_non_exhaustive()
    }
}

impl BoardController {
    pub fn new(app: Arc<AppState>) -> Self {
        let board = Arc::new(Mutex::new(OrderBoard::new()));
        let teardown = Teardown::new();

        let searched = Arc::clone(&board);
        let search = Debouncer::new(
            app.config.search_debounce,
            teardown.token(),
            move |term: String| lock(&searched).set_search(&term),
        );

        Self {
            app,
            board,
            search,
            teardown,
        }
    }

    /// Fill the board from the backend.
    pub async fn load(&self) -> anyhow::Result<()> {
        let records = self
            .app
            .orders
            .get_orders()
            .await
            .context("loading orders for the board")?;
        lock(&self.board).populate(&records);
        Ok(())
    }

    /// Read the board.
    pub fn with_board<R>(&self, f: impl FnOnce(&OrderBoard) -> R) -> R {
        f(&lock(&self.board))
    }

    /// Handle a card dropped from container `from` onto container `to`.
    ///
    /// The board is updated right away. A cross-column drop persists the
    /// new state on a spawned task, never retried. When persisting fails the
    /// order is re-fetched and its card returned to the confirmed column.
    /// The handle of the persistence task is returned for callers that want
    /// to await it.
    pub fn drop_card(
        &self,
        from: &str,
        to: &str,
        previous_index: usize,
        current_index: usize,
    ) -> Result<Option<JoinHandle<()>>, DomainError> {
        let from = Bucket::from_container_id(from);
        let to = Bucket::from_container_id(to);

        let outcome = lock(&self.board).move_order(from, to, previous_index, current_index)?;
        let MoveOutcome::Transferred(transition) = outcome else {
            return Ok(None);
        };

        let orders = Arc::clone(&self.app.orders);
        let notifier = Arc::clone(&self.app.notifier);
        let board = Arc::clone(&self.board);
        let failed = transition.clone();
        let id = transition.order_id.clone();
        let state = transition.to;
        let persist = tokio::spawn(async move {
            let Err(err) = orders.update_order_state(&id, state).await else {
                return;
            };
            tracing::warn!(order_id = %id, %state, error = %err, "order state not persisted");
            notifier.error(&format!("Error al actualizar el estado de la orden {id}"));

            match orders.get_order_by_id(&id).await {
                Ok(record) => {
                    if lock(&board).reconcile(&failed, record.state) {
                        notifier.warning(&format!(
                            "Orden {id} devuelta a {}",
                            record.state.display().to_lowercase()
                        ));
                    }
                }
                Err(err) => {
                    tracing::warn!(order_id = %id, error = %err, "order state not reconciled");
                }
            }
        });

        if transition.is_notifiable() {
            tracing::debug!(order_id = %transition.order_id, "transition is client-notifiable");
        }
        self.app.publish(OrderEvent::OrderMoved {
            order_id: transition.order_id.clone(),
            from: transition.from,
            to: transition.to,
            occurred_at: Utc::now(),
        });
        self.app.notifier.success(&transition.message());

        Ok(Some(persist))
    }

    /// Delete an order on the backend, then from its column.
    ///
    /// Requires the administrator privilege. Returns whether the order was
    /// deleted.
    pub async fn delete_order(&self, bucket: Bucket, id: &OrderId) -> bool {
        if !self.app.require(PrivilegedAction::DeleteOrder) {
            return false;
        }

        match self.app.orders.delete_order(id).await {
            Ok(()) => {
                lock(&self.board).remove(bucket, id);
                tracing::info!(order_id = %id, "order deleted");
                self.app.publish(OrderEvent::OrderDeleted {
                    order_id: id.clone(),
                    occurred_at: Utc::now(),
                });
                self.app.notifier.success(&delete_success_message(id));
                true
            }
            Err(err) => {
                tracing::warn!(order_id = %id, error = %err, "order delete failed");
                self.app.notifier.error(&delete_failure_message(id));
                false
            }
        }
    }

    /// Feed the search box; the board is filtered once typing pauses.
    pub fn search(&self, term: impl Into<String>) {
        self.search.push(term.into());
    }

    pub fn toggle_sort(&self, bucket: Bucket) -> SortOrder {
        lock(&self.board).toggle_sort(bucket)
    }

    /// End pending searches; called when the board goes away.
    pub fn teardown(&self) {
        self.search.cancel();
        self.teardown.fire();
    }
}

impl Drop for BoardController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{DateTime, TimeZone};
    use optica_auth::Privilege;
    use optica_orders::{Billing, EmbeddedClient, OrderRecord, OrderState};
    use optica_toast::ToastKind;

    use crate::app_state::tests::{Harness, harness};
    use crate::gateways::{InMemoryInventoryGateway, InMemoryOrdersGateway, OrdersCall};

    fn created(hours_ago: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() - chrono::Duration::hours(hours_ago)
    }

    fn record(id: &str, name: &str, state: OrderState, hours_ago: i64) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(id).unwrap(),
            order_number: Some(format!("A{id}")),
            client: Some(EmbeddedClient {
                id: None,
                name: name.to_string(),
                last_name: "Suárez".to_string(),
                document: format!("doc-{id}"),
            }),
            client_name: None,
            document: None,
            created_at: created(hours_ago),
            state,
            billing: Billing::default(),
            articles: Vec::new(),
            sub_orders: Vec::new(),
            owner: Some("caja".to_string()),
            details: None,
        }
    }

    async fn loaded(privilege: Privilege) -> (Harness, BoardController) {
        let orders = InMemoryOrdersGateway::new().with_orders(vec![
            record("o1", "Ana", OrderState::Registered, 2),
            record("o2", "Martín", OrderState::Registered, 1),
            record("o3", "Lucía", OrderState::InCourse, 3),
        ]);
        let h = harness(Some(privilege), orders, InMemoryInventoryGateway::default());
        let controller = BoardController::new(h.app.clone());
        controller.load().await.unwrap();
        (h, controller)
    }

    fn ids(controller: &BoardController, bucket: Bucket) -> Vec<String> {
        controller.with_board(|b| {
            b.column(bucket)
                .iter()
                .map(|c| c.id.as_str().to_string())
                .collect()
        })
    }

    #[tokio::test]
    async fn cross_column_drop_persists_once_and_notifies() {
        let (h, controller) = loaded(Privilege::User).await;

        let persist = controller
            .drop_card("registered", "inCourse", 0, 0)
            .unwrap()
            .expect("cross-column drop persists");
        persist.await.unwrap();

        let state_calls: Vec<_> = h
            .orders
            .calls()
            .into_iter()
            .filter(|c| matches!(c, OrdersCall::UpdateOrderState(..)))
            .collect();
        assert_eq!(
            state_calls,
            vec![OrdersCall::UpdateOrderState(OrderId::new("o2").unwrap(), OrderState::InCourse)]
        );
        assert_eq!(ids(&controller, Bucket::InCourse), vec!["o2", "o3"]);
        assert_eq!(
            h.notifier.messages(ToastKind::Success),
            vec!["Orden o2 movida a en curso".to_string()]
        );
    }

    #[tokio::test]
    async fn same_column_drop_does_not_call_the_backend() {
        let (h, controller) = loaded(Privilege::User).await;

        let persist = controller.drop_card("registered", "registered", 0, 1).unwrap();

        assert!(persist.is_none());
        assert_eq!(h.orders.calls(), vec![OrdersCall::GetOrders]);
        assert_eq!(ids(&controller, Bucket::Registered), vec!["o1", "o2"]);
    }

    #[tokio::test]
    async fn failed_persistence_reconciles_with_the_backend() {
        let (h, controller) = loaded(Privilege::User).await;
        h.orders.fail_on("update_order_state");

        let persist = controller
            .drop_card("inCourse", "finalized", 0, 0)
            .unwrap()
            .unwrap();
        assert_eq!(ids(&controller, Bucket::Finalized), vec!["o3"]);
        persist.await.unwrap();

        assert!(ids(&controller, Bucket::Finalized).is_empty());
        assert_eq!(ids(&controller, Bucket::InCourse), vec!["o3"]);
        assert_eq!(
            h.notifier.messages(ToastKind::Error),
            vec!["Error al actualizar el estado de la orden o3".to_string()]
        );
        assert_eq!(
            h.notifier.messages(ToastKind::Warning),
            vec!["Orden o3 devuelta a en curso".to_string()]
        );
    }

    #[tokio::test]
    async fn stale_failure_does_not_undo_a_later_move() {
        let (h, controller) = loaded(Privilege::User).await;
        h.orders.fail_once("update_order_state");

        let first = controller
            .drop_card("inCourse", "finalized", 0, 0)
            .unwrap()
            .unwrap();
        let second = controller
            .drop_card("finalized", "delivered", 0, 0)
            .unwrap()
            .unwrap();
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(ids(&controller, Bucket::Delivered), vec!["o3"]);
        assert!(ids(&controller, Bucket::InCourse).is_empty());
        assert_eq!(h.notifier.messages(ToastKind::Error).len(), 1);
        assert!(h.notifier.messages(ToastKind::Warning).is_empty());
        let stored = h.orders.orders().into_iter().find(|o| o.id.as_str() == "o3").unwrap();
        assert_eq!(stored.state, OrderState::Delivered);
    }

    #[tokio::test]
    async fn unreachable_backend_leaves_the_optimistic_move() {
        let (h, controller) = loaded(Privilege::User).await;
        h.orders.fail_on("update_order_state");
        h.orders.fail_on("get_order_by_id");

        controller
            .drop_card("inCourse", "finalized", 0, 0)
            .unwrap()
            .unwrap()
            .await
            .unwrap();

        assert_eq!(ids(&controller, Bucket::Finalized), vec!["o3"]);
        assert_eq!(h.notifier.messages(ToastKind::Error).len(), 1);
    }

    #[tokio::test]
    async fn unknown_container_moves_to_registered() {
        let (_h, controller) = loaded(Privilege::User).await;

        controller
            .drop_card("inCourse", "somewhere", 0, 0)
            .unwrap()
            .unwrap()
            .await
            .unwrap();

        assert_eq!(ids(&controller, Bucket::Registered), vec!["o3", "o2", "o1"]);
    }

    #[tokio::test]
    async fn admin_delete_removes_card_and_notifies() {
        let (h, controller) = loaded(Privilege::Administrator).await;
        let id = OrderId::new("o1").unwrap();

        assert!(controller.delete_order(Bucket::Registered, &id).await);

        assert_eq!(ids(&controller, Bucket::Registered), vec!["o2"]);
        assert_eq!(
            h.notifier.messages(ToastKind::Success),
            vec!["Orden o1 eliminada con éxito".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_delete_leaves_board_untouched() {
        let (h, controller) = loaded(Privilege::Administrator).await;
        h.orders.fail_on("delete_order");
        let id = OrderId::new("o1").unwrap();

        assert!(!controller.delete_order(Bucket::Registered, &id).await);

        assert_eq!(ids(&controller, Bucket::Registered), vec!["o2", "o1"]);
        assert_eq!(
            h.notifier.messages(ToastKind::Error),
            vec!["Error al eliminar orden con ID: o1".to_string()]
        );
    }

    #[tokio::test]
    async fn clerk_cannot_delete() {
        let (h, controller) = loaded(Privilege::User).await;
        let id = OrderId::new("o1").unwrap();

        assert!(!controller.delete_order(Bucket::Registered, &id).await);

        assert!(!h.orders.calls().contains(&OrdersCall::DeleteOrder(id)));
        assert_eq!(h.notifier.messages(ToastKind::Warning).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn search_applies_after_the_debounce_delay() {
        let (_h, controller) = loaded(Privilege::User).await;

        controller.search("lu");
        controller.search("lucia");
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(ids(&controller, Bucket::Registered).len(), 2);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(ids(&controller, Bucket::Registered).is_empty());
        assert_eq!(ids(&controller, Bucket::InCourse), vec!["o3"]);
    }
}
