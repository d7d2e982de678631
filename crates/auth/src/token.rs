//! HS256 token issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use stockroom_core::UserId;

use crate::claims::{AccessClaims, RegistrationClaims, TokenValidationError, validate_window};
use crate::UserRole;

/// Lifetime of an e-mail confirmation link.
pub const REGISTRATION_TTL_MINUTES: i64 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed or unsigned token")]
    Invalid,

    #[error(transparent)]
    Window(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
}

impl core::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
        }
    }

    pub fn issue_access(&self, user: UserId, role: UserRole, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = AccessClaims {
            sub: user,
            role,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn verify_access(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode(token)?;
        validate_window(claims.iat, claims.exp, now.timestamp())?;
        Ok(claims)
    }

    /// Sign a pending registration. `iat`/`exp` on the input are overwritten.
    pub fn issue_registration(
        &self,
        mut claims: RegistrationClaims,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        claims.iat = now.timestamp();
        claims.exp = (now + Duration::minutes(REGISTRATION_TTL_MINUTES)).timestamp();
        self.sign(&claims)
    }

    pub fn verify_registration(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RegistrationClaims, TokenError> {
        let claims: RegistrationClaims = self.decode(token)?;
        validate_window(claims.iat, claims.exp, now.timestamp())?;
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Window(TokenValidationError::Expired),
                _ => TokenError::Invalid,
            })
    }
}
