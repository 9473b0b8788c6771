use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::UserId;

use crate::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims model.
///
/// `iat`/`exp` are unix seconds, as registered JWT claims require.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject: the authenticated user.
    pub sub: UserId,
    pub username: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Deterministically validate the claim time window against `now`.
///
/// Signature verification happens before this, in [`crate::JwtValidator`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), AuthError> {
    if claims.exp <= claims.iat {
        return Err(AuthError::InvalidToken);
    }
    if now.timestamp() >= claims.exp {
        return Err(AuthError::Expired);
    }
    Ok(())
}
