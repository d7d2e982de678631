use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity, ProductId};

use crate::variant::Variant;

/// Catalog product. Prices are in the smallest currency unit (e.g. cents).
///
/// `discounted_price` is derived from `price` and `discount` and is never
/// accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub image: String,
    pub price: i64,
    /// Discount in percent (0..=100).
    pub discount: i64,
    pub discounted_price: i64,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied product fields (create and full update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub image: String,
    pub price: i64,
    #[serde(default)]
    pub discount: i64,
}

/// Product together with all of its variants (detail view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<Variant>,
}

impl Product {
    pub fn create(id: ProductId, draft: ProductDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut product = Self {
            id,
            name: String::new(),
            description: String::new(),
            category_id: draft.category_id,
            image: String::new(),
            price: 0,
            discount: 0,
            discounted_price: 0,
            created_at: now,
        };
        product.revise(draft)?;
        Ok(product)
    }

    pub fn revise(&mut self, draft: ProductDraft) -> DomainResult<()> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if draft.price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if !(0..=100).contains(&draft.discount) {
            return Err(DomainError::validation("discount must be between 0 and 100"));
        }

        self.name = name.to_string();
        self.description = draft.description;
        self.category_id = draft.category_id;
        self.image = draft.image;
        self.price = draft.price;
        self.discount = draft.discount;
        self.discounted_price = discounted_price(draft.price, draft.discount);
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// `price * (100 - discount) / 100`, rounded down.
pub fn discounted_price(price: i64, discount: i64) -> i64 {
    let discount = discount.clamp(0, 100);
    // i128 keeps the intermediate product from overflowing for large prices.
    ((price as i128) * (100 - discount) as i128 / 100) as i64
}
