//! Application-state container handed to every controller.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use optica_auth::{AuthSession, CurrentUser, PrivilegedAction, TokenStore, authorize};
use optica_events::{EventBus, InMemoryEventBus, Subscription, TeardownToken};
use optica_inventory::InventoryGateway;
use optica_orders::{OrderEvent, OrdersGateway};
use optica_toast::{Notifier, ToastService, ToastTiming};

use crate::config::Config;

pub type SharedTokenStore = Arc<dyn TokenStore>;

/// Shared services: configuration, session, notifications, collaborators
/// and the order event stream.
pub struct AppState {
    pub config: Config,
    pub session: AuthSession<SharedTokenStore>,
    pub notifier: Arc<dyn Notifier>,
    pub orders: Arc<dyn OrdersGateway>,
    pub inventory: Arc<dyn InventoryGateway>,
    events: InMemoryEventBus<OrderEvent>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("current_user", &self.session.current_user())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the container, restoring any stored session at `now`.
    pub fn new(
        config: Config,
        tokens: SharedTokenStore,
        notifier: Arc<dyn Notifier>,
        orders: Arc<dyn OrdersGateway>,
        inventory: Arc<dyn InventoryGateway>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session: AuthSession::restore(tokens, now),
            config,
            notifier,
            orders,
            inventory,
            events: InMemoryEventBus::new(),
        }
    }

    /// Toast stack configured from `config`.
    pub fn toast_service(config: &Config) -> ToastService {
        ToastService::new(ToastTiming {
            base: config.toast_duration,
            stagger: config.toast_stagger,
        })
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.session.current_user()
    }

    /// Privilege gate: warns the operator and returns `false` when the
    /// current user may not perform `action`.
    pub fn require(&self, action: PrivilegedAction) -> bool {
        match authorize(self.current_user().as_ref(), action) {
            Ok(()) => true,
            Err(err) => {
                tracing::info!(?action, error = %err, "privileged action denied");
                self.notifier.warning(err.user_message());
                false
            }
        }
    }

    /// Log out when the stored session has expired. Returns `true` if it did.
    pub fn enforce_session(&self, now: DateTime<Utc>) -> bool {
        let expired = self.session.logout_if_expired(now);
        if expired {
            self.notifier.warning("Tu sesión ha expirado");
        }
        expired
    }

    pub fn publish(&self, event: OrderEvent) {
        if let Err(err) = self.events.publish(event) {
            tracing::warn!(?err, "order event not published");
        }
    }

    /// Observe order events until `teardown` fires.
    pub fn order_events(&self, teardown: &TeardownToken) -> Subscription<OrderEvent> {
        self.events.subscribe_until(teardown)
    }
}
