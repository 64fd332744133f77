use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use optica_core::UserId;

use crate::Privilege;

/// Claims carried by the backend-issued session token.
///
/// The backend signs the token; the client only reads it to learn who is
/// signed in and until when, so signature verification is not done here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Backend user id.
    #[serde(rename = "_id", alias = "id", alias = "sub")]
    pub user_id: UserId,

    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Users created before privileges existed carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege: Option<Privilege>,

    /// Issued-at, seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration, seconds since the Unix epoch.
    pub exp: i64,
}

impl SessionClaims {
    /// Whether the token is expired at `now` (expiry second included).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed session token: {0}")]
    Malformed(String),

    #[error("session token has expired")]
    Expired,

    #[error("session token not yet valid (iat is in the future)")]
    NotYetValid,
}

/// Decode the claims of a session token without verifying its signature.
pub fn decode_claims(token: &str) -> Result<SessionClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| TokenError::Malformed(e.to_string()))
}

/// Deterministically validate the claims' time window against `now`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if let Some(iat) = claims.iat {
        if now.timestamp() < iat {
            return Err(TokenError::NotYetValid);
        }
    }
    if claims.is_expired(now) {
        return Err(TokenError::Expired);
    }
    Ok(())
}
