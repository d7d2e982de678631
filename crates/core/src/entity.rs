//! Entity trait: identity + continuity across state changes.

use crate::id::EntityId;

/// Entity marker + minimal interface.
///
/// Every persisted record in the back office (variants, purchases, ledger
/// entries, ...) is an entity: two records with the same id are the same
/// record, whatever their other fields say.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: EntityId;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
