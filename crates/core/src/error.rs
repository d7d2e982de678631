//! Domain error model.

use thiserror::Error;

use crate::id::VariantId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing references, conflicts, stock rules). Infrastructure concerns belong
/// elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced record (variant, purchase, ledger entry, ...) does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness rule was violated (duplicate SKU, e-mail, name, ...) or the
    /// record is still referenced elsewhere.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A `sale` change would drive the variant's stock below zero.
    #[error("insufficient stock for variant {variant}: available {available}, requested {requested}")]
    InsufficientStock {
        variant: VariantId,
        available: i64,
        requested: i64,
    },

    /// Unrecognized inventory change type.
    #[error("invalid change type: {0}")]
    InvalidChangeType(String),

    /// A value failed validation (missing reference, malformed input, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Authentication failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn not_found(what: impl core::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn insufficient_stock(variant: VariantId, available: i64, requested: i64) -> Self {
        Self::InsufficientStock {
            variant,
            available,
            requested,
        }
    }
}
