//! `optica-auth`: signed-in session and privilege checks.
//!
//! This crate is decoupled from HTTP and browser storage: tokens are handed
//! in by the login flow and persisted through a [`TokenStore`].

pub mod authorize;
pub mod claims;
pub mod privilege;
pub mod session;

pub use authorize::{AuthzError, PrivilegedAction, authorize};
pub use claims::{SessionClaims, TokenError, decode_claims, validate_claims};
pub use privilege::Privilege;
pub use session::{AuthSession, CurrentUser, InMemoryTokenStore, TokenStore};
