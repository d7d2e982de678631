//! Parties domain module (suppliers).
//!
//! Pure master-data rules: no IO, no HTTP, no storage.

pub mod supplier;

pub use supplier::{Supplier, SupplierDraft};
