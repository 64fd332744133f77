//! Component teardown notifier.
//!
//! A component owns one [`Teardown`]; everything it subscribes to or spawns
//! is keyed off a [`TeardownToken`] cloned from it. Firing the notifier when
//! the component goes away ends all of those at once.

use tokio_util::sync::CancellationToken;

/// Teardown notifier owned by a component instance.
#[derive(Debug, Clone, Default)]
pub struct Teardown {
    token: CancellationToken,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for subscriptions and tasks that must end with this component.
    pub fn token(&self) -> TeardownToken {
        TeardownToken(self.token.clone())
    }

    /// Fire the notifier. Idempotent.
    pub fn fire(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("component teardown fired");
        }
        self.token.cancel();
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Cheap, cloneable view of a [`Teardown`] notifier.
#[derive(Debug, Clone)]
pub struct TeardownToken(CancellationToken);

impl TeardownToken {
    pub fn is_fired(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Resolves once the owning component has been torn down.
    pub async fn fired(&self) {
        self.0.cancelled().await;
    }
}
