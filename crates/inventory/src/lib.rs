//! Inventory domain module: the stock ledger and its change-type policy.
//!
//! This crate contains the stock arithmetic and ledger rules, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). Persisting entries
//! and the per-variant stock projection is the job of `stockroom-infra`.

pub mod change_type;
pub mod log;
pub mod replay;
pub mod stock;

pub use change_type::{ChangeType, StockEffect};
pub use log::{InventoryLogDraft, InventoryLogEntry};
pub use replay::{StockAudit, replay, total_imported};
pub use stock::{Underflow, apply_delta};
