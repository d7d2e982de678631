//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Common interface of every typed identifier.
///
/// Persistence code works with raw UUIDs; this trait lets it convert in both
/// directions without knowing the concrete id type.
pub trait EntityId:
    Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync + 'static
{
    fn uuid(&self) -> Uuid;

    fn from_uuid(uuid: Uuid) -> Self;
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl EntityId for $t {
            fn uuid(&self) -> Uuid {
                self.0
            }

            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s.trim())
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a product category.
    CategoryId, "CategoryId"
);
uuid_id!(
    /// Identifier of a catalog product.
    ProductId, "ProductId"
);
uuid_id!(
    /// Identifier of a product variant (the unit stock applies to).
    VariantId, "VariantId"
);
uuid_id!(SupplierId, "SupplierId");
uuid_id!(PurchaseId, "PurchaseId");
uuid_id!(
    /// Identifier of an inventory ledger entry.
    InventoryLogId, "InventoryLogId"
);
uuid_id!(OrderId, "OrderId");
uuid_id!(OrderItemId, "OrderItemId");
uuid_id!(
    /// Identifier of a user account (staff, admin, or customer).
    UserId, "UserId"
);
uuid_id!(LoginLogId, "LoginLogId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_round_trip_through_display() {
        let id = VariantId::new();
        let parsed: VariantId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn invalid_uuid_is_reported_with_type_name() {
        let err = "not-a-uuid".parse::<PurchaseId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("PurchaseId")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }
}
