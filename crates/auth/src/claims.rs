use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::UserId;

use crate::UserRole;

/// Access-token claims. Times are Unix seconds, as JWT requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by the e-mail confirmation link of a pending registration.
///
/// The account is only created once the link is followed, so everything needed
/// to create it travels inside the signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationClaims {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate a token's time window against `now` (Unix seconds).
pub fn validate_window(iat: i64, exp: i64, now: i64) -> Result<(), TokenValidationError> {
    if exp <= iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
