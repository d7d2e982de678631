//! `stockroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the entity trait, and the shared domain error model.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{
    CategoryId, EntityId, InventoryLogId, LoginLogId, OrderId, OrderItemId, ProductId, PurchaseId,
    SupplierId, UserId, VariantId,
};
