//! Catalog domain module: categories, products, and their sellable variants.
//!
//! This crate contains business rules for the catalog, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Stock on a variant
//! is owned by the inventory ledger; catalog edits never touch it.

pub mod category;
pub mod product;
pub mod variant;

pub use category::{Category, CategoryDraft, CategoryGroup};
pub use product::{Product, ProductDetail, ProductDraft};
pub use variant::{Variant, VariantChanges, VariantDraft, normalize_sku};
