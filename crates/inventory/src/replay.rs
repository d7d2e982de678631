//! Ledger replay: recompute what a variant's stock *should* be from its
//! history, and compare it with the recorded projection.

use serde::{Deserialize, Serialize};

use stockroom_core::VariantId;

use crate::change_type::{ChangeType, StockEffect};
use crate::log::InventoryLogEntry;
use crate::stock::{Underflow, apply_delta};

/// Fold entries in chronological order and return the implied stock.
///
/// Input order does not matter. Replay never fails: a `sale` that would have
/// been rejected live is replayed with `Underflow::Allow`.
pub fn replay(variant: VariantId, entries: &[InventoryLogEntry]) -> i64 {
    let mut ordered: Vec<&InventoryLogEntry> =
        entries.iter().filter(|e| e.variant_id == variant).collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    ordered.into_iter().fold(0i64, |stock, entry| {
        match entry.change_type.effect(entry.quantity) {
            StockEffect::Set(value) => value,
            StockEffect::Delta { delta, .. } => {
                apply_delta(variant, stock, delta, Underflow::Allow).unwrap_or(stock)
            }
        }
    })
}

/// Result of comparing the stock projection with its ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAudit {
    pub variant_id: VariantId,
    pub recorded_stock: i64,
    pub replayed_stock: i64,
    /// `recorded_stock - replayed_stock`.
    pub drift: i64,
    pub entries: usize,
}

impl StockAudit {
    pub fn new(variant: VariantId, recorded_stock: i64, entries: &[InventoryLogEntry]) -> Self {
        let replayed_stock = replay(variant, entries);
        Self {
            variant_id: variant,
            recorded_stock,
            replayed_stock,
            drift: recorded_stock.saturating_sub(replayed_stock),
            entries: entries.iter().filter(|e| e.variant_id == variant).count(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.drift == 0
    }
}

/// Sum of `import` quantities for one variant.
pub fn total_imported(variant: VariantId, entries: &[InventoryLogEntry]) -> i64 {
    entries
        .iter()
        .filter(|e| e.variant_id == variant && e.change_type == ChangeType::Import)
        .map(|e| e.quantity)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn entry_at(variant: VariantId, change: ChangeType, quantity: i64, minute: i64) -> InventoryLogEntry {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        InventoryLogEntry::new(variant, change, quantity, "", at)
    }

    #[test]
    fn adjust_resets_the_running_total() {
        let v = VariantId::new();
        let entries = vec![
            entry_at(v, ChangeType::Import, 10, 0),
            entry_at(v, ChangeType::Sale, 3, 1),
            entry_at(v, ChangeType::Adjust, 4, 2),
            entry_at(v, ChangeType::Return, 1, 3),
        ];
        assert_eq!(replay(v, &entries), 5);
    }

    #[test]
    fn replay_sorts_by_time_and_ignores_other_variants() {
        let v = VariantId::new();
        let other = VariantId::new();
        let entries = vec![
            entry_at(v, ChangeType::Import, 2, 5),
            entry_at(other, ChangeType::Import, 100, 0),
            entry_at(v, ChangeType::Adjust, 10, 1),
        ];
        assert_eq!(replay(v, &entries), 12);
    }

    #[test]
    fn audit_reports_drift() {
        let v = VariantId::new();
        let entries = vec![entry_at(v, ChangeType::Import, 8, 0)];
        let audit = StockAudit::new(v, 5, &entries);
        assert_eq!(audit.replayed_stock, 8);
        assert_eq!(audit.drift, -3);
        assert_eq!(audit.entries, 1);
        assert!(!audit.is_consistent());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn imports_only_replay_to_their_sum(quantities in prop::collection::vec(1i64..1_000, 0..30)) {
            let v = VariantId::new();
            let entries: Vec<_> = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| entry_at(v, ChangeType::Import, *q, i as i64))
                .collect();
            prop_assert_eq!(replay(v, &entries), quantities.iter().sum::<i64>());
            prop_assert_eq!(total_imported(v, &entries), quantities.iter().sum::<i64>());
        }

        #[test]
        fn only_entries_after_last_adjust_matter(
            before in prop::collection::vec(1i64..100, 0..10),
            level in 0i64..500,
            after in prop::collection::vec(1i64..100, 0..10),
        ) {
            let v = VariantId::new();
            let mut entries = Vec::new();
            let mut minute = 0;
            for q in &before {
                entries.push(entry_at(v, ChangeType::Import, *q, minute));
                minute += 1;
            }
            entries.push(entry_at(v, ChangeType::Adjust, level, minute));
            minute += 1;
            for q in &after {
                entries.push(entry_at(v, ChangeType::Return, *q, minute));
                minute += 1;
            }
            prop_assert_eq!(replay(v, &entries), level + after.iter().sum::<i64>());
        }
    }
}
