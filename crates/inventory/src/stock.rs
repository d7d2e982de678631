//! Pure stock arithmetic shared by every projection backend.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, VariantId};

/// What to do when a delta would drive stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Underflow {
    /// Negative stock is stored as-is.
    Allow,
    /// Fail with `InsufficientStock`; stock is left unchanged.
    Reject,
    /// Floor the result at zero.
    ClampToZero,
}

/// Apply `delta` to `current` under the given underflow policy.
pub fn apply_delta(
    variant: VariantId,
    current: i64,
    delta: i64,
    underflow: Underflow,
) -> DomainResult<i64> {
    let next = current
        .checked_add(delta)
        .ok_or_else(|| DomainError::validation("stock overflow"))?;

    if next >= 0 {
        return Ok(next);
    }

    match underflow {
        Underflow::Allow => Ok(next),
        Underflow::ClampToZero => Ok(0),
        Underflow::Reject => Err(DomainError::insufficient_stock(
            variant,
            current,
            delta.saturating_neg(),
        )),
    }
}
