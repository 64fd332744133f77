//! Signed-in session state.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use optica_core::UserId;
use optica_events::{StateCell, Subscription, TeardownToken};

use crate::claims::{SessionClaims, TokenError, decode_claims, validate_claims};
use crate::Privilege;

/// The user currently signed in, as components see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub privilege: Option<Privilege>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.privilege.is_some_and(|p| p.is_admin())
    }
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.user_id,
            username: claims.username,
            email: claims.email,
            privilege: claims.privilege,
        }
    }
}

/// Durable storage for the raw session token (browser storage, keyring, file).
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

impl<T> TokenStore for std::sync::Arc<T>
where
    T: TokenStore + ?Sized,
{
    fn load(&self) -> Option<String> {
        (**self).load()
    }

    fn save(&self, token: &str) {
        (**self).save(token)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// Process-local token store for tests and headless runs.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
    }
}

/// Session container: token persistence plus the observable current user.
///
/// The current user is published through a [`StateCell`], so every
/// component subscribing (keyed off its own teardown) sees sign-in and
/// logout as they happen.
#[derive(Debug)]
pub struct AuthSession<S> {
    store: S,
    user: StateCell<Option<CurrentUser>>,
}

impl<S: TokenStore> AuthSession<S> {
    /// Restore the session from `store`.
    ///
    /// A stored token that is malformed or already expired forces a logout.
    pub fn restore(store: S, now: DateTime<Utc>) -> Self {
        let session = Self {
            store,
            user: StateCell::new(None),
        };

        if let Some(token) = session.store.load() {
            match Self::read_token(&token, now) {
                Ok(claims) => session.publish(Some(claims.into())),
                Err(err) => {
                    tracing::info!(error = %err, "stored session rejected; logging out");
                    session.logout();
                }
            }
        }

        session
    }

    /// Accept a freshly issued token from the login flow.
    pub fn sign_in(&self, token: &str, now: DateTime<Utc>) -> Result<CurrentUser, TokenError> {
        let claims = Self::read_token(token, now)?;
        let user = CurrentUser::from(claims);

        self.store.save(token);
        self.publish(Some(user.clone()));
        tracing::info!(username = %user.username, "signed in");

        Ok(user)
    }

    /// Drop the token and publish the signed-out state.
    pub fn logout(&self) {
        self.store.clear();
        self.publish(None);
        tracing::info!("signed out");
    }

    /// Whether a stored, unexpired token exists at `now`.
    pub fn is_authenticated(&self, now: DateTime<Utc>) -> bool {
        self.store
            .load()
            .is_some_and(|token| Self::read_token(&token, now).is_ok())
    }

    /// Expired-session detection: logs out and returns `true` when the
    /// stored token is no longer valid.
    pub fn logout_if_expired(&self, now: DateTime<Utc>) -> bool {
        match self.store.load() {
            Some(token) if Self::read_token(&token, now).is_err() => {
                self.logout();
                true
            }
            _ => false,
        }
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.user.get()
    }

    /// Observe the current user until `teardown` fires.
    pub fn subscribe_until(&self, teardown: &TeardownToken) -> Subscription<Option<CurrentUser>> {
        self.user.subscribe_until(teardown)
    }

    fn publish(&self, user: Option<CurrentUser>) {
        if let Err(err) = self.user.set(user) {
            tracing::warn!(error = ?err, "current user not published");
        }
    }

    fn read_token(token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let claims = decode_claims(token)?;
        validate_claims(&claims, now)?;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::tests::{at, token_for};
    use optica_events::Teardown;

    #[test]
    fn restore_with_valid_token_publishes_user() {
        let token = token_for("marta", Some(Privilege::Administrator), 10_000);
        let session = AuthSession::restore(InMemoryTokenStore::with_token(token), at(5_000));

        let user = session.current_user().unwrap();
        assert_eq!(user.username, "marta");
        assert!(user.is_admin());
        assert!(session.is_authenticated(at(5_000)));
    }

    #[test]
    fn restored_user_and_logout_reach_subscribers() {
        let token = token_for("marta", None, 10_000);
        let session = AuthSession::restore(InMemoryTokenStore::with_token(token), at(5_000));
        let teardown = Teardown::new();
        let sub = session.subscribe_until(&teardown.token());

        session.logout();

        let seen: Vec<Option<String>> = sub
            .drain()
            .into_iter()
            .map(|u| u.map(|u| u.username))
            .collect();
        assert_eq!(seen, vec![Some("marta".to_string()), None]);
    }

    #[test]
    fn restore_with_expired_token_logs_out() {
        let token = token_for("marta", None, 2_000);
        let session = AuthSession::restore(InMemoryTokenStore::with_token(token), at(5_000));

        assert!(session.current_user().is_none());
        assert!(!session.is_authenticated(at(5_000)));
    }

    #[test]
    fn sign_in_then_logout_is_observed_by_subscribers() {
        let session = AuthSession::restore(InMemoryTokenStore::new(), at(1_500));
        let teardown = Teardown::new();
        let sub = session.subscribe_until(&teardown.token());

        session
            .sign_in(&token_for("luis", Some(Privilege::User), 9_000), at(1_500))
            .unwrap();
        session.logout();

        let seen: Vec<Option<String>> = sub
            .drain()
            .into_iter()
            .map(|u| u.map(|u| u.username))
            .collect();
        assert_eq!(seen, vec![None, Some("luis".to_string()), None]);
    }

    #[test]
    fn expired_session_detection_forces_logout() {
        let session = AuthSession::restore(InMemoryTokenStore::new(), at(1_500));
        session
            .sign_in(&token_for("luis", None, 3_000), at(1_500))
            .unwrap();

        assert!(!session.logout_if_expired(at(2_999)));
        assert!(session.logout_if_expired(at(3_000)));
        assert!(session.current_user().is_none());
    }

    #[test]
    fn rejected_sign_in_keeps_previous_state() {
        let session = AuthSession::restore(InMemoryTokenStore::new(), at(1_500));
        let err = session
            .sign_in(&token_for("luis", None, 1_200), at(1_500))
            .unwrap_err();

        assert_eq!(err, TokenError::Expired);
        assert!(session.current_user().is_none());
    }
}
