use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ProductId, VariantId};

/// One purchasable SKU of a product.
///
/// `stock` is the denormalized projection of the inventory ledger. Catalog
/// operations set it only once, at creation; afterwards it moves exclusively
/// through inventory/purchase reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
    pub price: i64,
    pub stock: i64,
    pub sku: String,
    pub image: String,
}

/// Caller-supplied fields for a new variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDraft {
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub price: i64,
    pub sku: String,
    #[serde(default)]
    pub image: String,
    /// Opening stock, recorded in the ledger as an `adjust` entry.
    #[serde(default)]
    pub initial_stock: i64,
}

/// Caller-supplied fields for a variant update (stock is not editable here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantChanges {
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub price: i64,
    pub sku: String,
    #[serde(default)]
    pub image: String,
}

impl Variant {
    pub fn create(id: VariantId, product_id: ProductId, draft: VariantDraft) -> DomainResult<Self> {
        if draft.initial_stock < 0 {
            return Err(DomainError::validation("initial stock cannot be negative"));
        }
        let mut variant = Self {
            id,
            product_id,
            size: String::new(),
            color: String::new(),
            price: 0,
            stock: draft.initial_stock,
            sku: String::new(),
            image: String::new(),
        };
        variant.revise(VariantChanges {
            size: draft.size,
            color: draft.color,
            price: draft.price,
            sku: draft.sku,
            image: draft.image,
        })?;
        Ok(variant)
    }

    pub fn revise(&mut self, changes: VariantChanges) -> DomainResult<()> {
        if changes.price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        self.sku = normalize_sku(&changes.sku)?;
        self.size = changes.size.trim().to_string();
        self.color = changes.color.trim().to_string();
        self.price = changes.price;
        self.image = changes.image;
        Ok(())
    }
}

impl Entity for Variant {
    type Id = VariantId;

    fn id(&self) -> VariantId {
        self.id
    }
}

/// Canonical SKU form: trimmed, non-empty, no inner whitespace.
///
/// Uniqueness across variants needs the store and is enforced there.
pub fn normalize_sku(raw: &str) -> DomainResult<String> {
    let sku = raw.trim();
    if sku.is_empty() {
        return Err(DomainError::validation("SKU cannot be empty"));
    }
    if sku.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("SKU cannot contain whitespace"));
    }
    Ok(sku.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(sku: &str, initial_stock: i64) -> VariantDraft {
        VariantDraft {
            size: "M".to_string(),
            color: "red".to_string(),
            price: 2_500,
            sku: sku.to_string(),
            image: String::new(),
            initial_stock,
        }
    }

    #[test]
    fn create_sets_opening_stock_and_trims_sku() {
        let variant = Variant::create(VariantId::new(), ProductId::new(), draft(" TS-RED-M ", 4)).unwrap();
        assert_eq!(variant.sku, "TS-RED-M");
        assert_eq!(variant.stock, 4);
    }

    #[test]
    fn negative_opening_stock_is_rejected() {
        let err = Variant::create(VariantId::new(), ProductId::new(), draft("TS-1", -1)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn revise_never_touches_stock() {
        let mut variant = Variant::create(VariantId::new(), ProductId::new(), draft("TS-1", 7)).unwrap();
        variant
            .revise(VariantChanges {
                size: "L".to_string(),
                color: "blue".to_string(),
                price: 3_000,
                sku: "TS-2".to_string(),
                image: String::new(),
            })
            .unwrap();
        assert_eq!(variant.stock, 7);
        assert_eq!(variant.sku, "TS-2");
        assert_eq!((variant.size.as_str(), variant.color.as_str()), ("L", "blue"));
    }

    #[test]
    fn sku_with_inner_whitespace_is_rejected() {
        assert!(normalize_sku("TS RED").is_err());
        assert!(normalize_sku("").is_err());
    }
}
