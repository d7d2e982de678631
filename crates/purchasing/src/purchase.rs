use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, PurchaseId, SupplierId, UserId, VariantId};

/// Goods bought from a supplier for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub supplier_id: SupplierId,
    pub staff_id: Option<UserId>,
    pub variant_id: VariantId,
    pub quantity: i64,
    /// Unit cost in minor currency units.
    pub cost_price: i64,
    /// `quantity * cost_price`; always computed, never taken from callers.
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when recording a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDraft {
    #[serde(default)]
    pub supplier_id: Option<SupplierId>,
    #[serde(default)]
    pub staff_id: Option<UserId>,
    pub variant_id: VariantId,
    pub quantity: i64,
    pub cost_price: i64,
}

/// Partial update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseChanges {
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub cost_price: Option<i64>,
    #[serde(default)]
    pub staff_id: Option<UserId>,
}

/// Checked `quantity * cost_price`.
pub fn line_total(quantity: i64, cost_price: i64) -> DomainResult<i64> {
    quantity
        .checked_mul(cost_price)
        .ok_or_else(|| DomainError::validation("purchase total overflows"))
}

fn validate(quantity: i64, cost_price: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be greater than zero"));
    }
    if cost_price < 0 {
        return Err(DomainError::validation("cost price cannot be negative"));
    }
    Ok(())
}

impl Purchase {
    pub fn create(id: PurchaseId, draft: PurchaseDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        let supplier_id = draft
            .supplier_id
            .ok_or_else(|| DomainError::validation("supplier_id is required"))?;
        validate(draft.quantity, draft.cost_price)?;

        Ok(Self {
            id,
            supplier_id,
            staff_id: draft.staff_id,
            variant_id: draft.variant_id,
            quantity: draft.quantity,
            cost_price: draft.cost_price,
            total: line_total(draft.quantity, draft.cost_price)?,
            created_at: now,
        })
    }

    /// Apply `changes` and recompute the total. On error `self` is unchanged.
    pub fn revise(&mut self, changes: PurchaseChanges) -> DomainResult<()> {
        let quantity = changes.quantity.unwrap_or(self.quantity);
        let cost_price = changes.cost_price.unwrap_or(self.cost_price);
        validate(quantity, cost_price)?;
        let total = line_total(quantity, cost_price)?;

        self.quantity = quantity;
        self.cost_price = cost_price;
        self.total = total;
        if let Some(variant) = changes.variant_id {
            self.variant_id = variant;
        }
        if changes.staff_id.is_some() {
            self.staff_id = changes.staff_id;
        }
        Ok(())
    }

    pub fn label(&self) -> String {
        format!("Purchase #{}", self.id)
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> PurchaseId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_draft(quantity: i64, cost_price: i64) -> PurchaseDraft {
        PurchaseDraft {
            supplier_id: Some(SupplierId::new()),
            staff_id: None,
            variant_id: VariantId::new(),
            quantity,
            cost_price,
        }
    }

    #[test]
    fn total_is_computed() {
        let purchase = Purchase::create(PurchaseId::new(), test_draft(4, 250), Utc::now()).unwrap();
        assert_eq!(purchase.total, 1_000);
    }

    #[test]
    fn missing_supplier_is_a_validation_error() {
        let mut draft = test_draft(1, 1);
        draft.supplier_id = None;
        let err = Purchase::create(PurchaseId::new(), draft, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("supplier_id is required"));
    }

    #[test]
    fn zero_quantity_and_negative_cost_are_rejected() {
        assert!(Purchase::create(PurchaseId::new(), test_draft(0, 1), Utc::now()).is_err());
        assert!(Purchase::create(PurchaseId::new(), test_draft(1, -1), Utc::now()).is_err());
    }

    #[test]
    fn revise_keeps_unspecified_fields_and_recomputes_total() {
        let mut purchase = Purchase::create(PurchaseId::new(), test_draft(2, 100), Utc::now()).unwrap();
        let variant = purchase.variant_id;
        purchase
            .revise(PurchaseChanges {
                quantity: Some(5),
                ..PurchaseChanges::default()
            })
            .unwrap();
        assert_eq!(purchase.variant_id, variant);
        assert_eq!(purchase.total, 500);
    }

    #[test]
    fn invalid_revise_is_atomic() {
        let mut purchase = Purchase::create(PurchaseId::new(), test_draft(2, 100), Utc::now()).unwrap();
        let before = purchase.clone();
        let result = purchase.revise(PurchaseChanges {
            variant_id: Some(VariantId::new()),
            quantity: Some(-1),
            ..PurchaseChanges::default()
        });
        assert!(result.is_err());
        assert_eq!(purchase, before);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        assert!(line_total(i64::MAX, 2).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn total_always_matches_quantity_times_cost(q in 1i64..100_000, c in 0i64..100_000) {
            let purchase = Purchase::create(PurchaseId::new(), test_draft(q, c), Utc::now()).unwrap();
            prop_assert_eq!(purchase.total, q * c);
        }
    }
}
