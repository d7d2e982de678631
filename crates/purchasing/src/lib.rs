//! Purchasing domain module (supplier procurement).
//!
//! This crate contains business rules for purchases, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). The stock side
//! effects of a purchase are applied by the reconciliation engine in
//! `stockroom-infra`.

pub mod purchase;

pub use purchase::{Purchase, PurchaseChanges, PurchaseDraft, line_total};
