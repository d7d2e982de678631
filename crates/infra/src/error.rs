//! Service-level error model shared by the engine and the services.

use thiserror::Error;

use stockroom_auth::TokenError;
use stockroom_core::{DomainError, VariantId};

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything an engine or service call can fail with.
///
/// Flat on purpose: the API layer maps each variant to exactly one HTTP status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("insufficient stock for variant {variant}: available {available}, requested {requested}")]
    InsufficientStock {
        variant: VariantId,
        available: i64,
        requested: i64,
    },

    #[error("invalid change type: {0}")]
    InvalidChangeType(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (database, decoding, mail transport).
    #[error("store error: {0}")]
    Store(String),
}

impl ServiceError {
    pub fn not_found(what: impl core::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(what) => Self::NotFound(what),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::InsufficientStock {
                variant,
                available,
                requested,
            } => Self::InsufficientStock {
                variant,
                available,
                requested,
            },
            DomainError::InvalidChangeType(kind) => Self::InvalidChangeType(kind),
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::Unauthorized => Self::Unauthorized,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(target) => Self::Conflict(format!("duplicate value ({target})")),
            StoreError::ForeignKeyViolation(target) => {
                Self::Validation(format!("referenced record does not exist ({target})"))
            }
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::OutOfRange(msg) => Self::Validation(msg),
            StoreError::InsufficientStock {
                variant,
                available,
                requested,
            } => Self::InsufficientStock {
                variant,
                available,
                requested,
            },
            other @ (StoreError::Backend(_) | StoreError::Decode { .. }) => Self::Store(other.to_string()),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(_: TokenError) -> Self {
        Self::Unauthorized
    }
}
