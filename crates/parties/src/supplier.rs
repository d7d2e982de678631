use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, SupplierId};

/// A vendor the shop buys stock from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied supplier fields (create and full update).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierDraft {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

impl Supplier {
    pub fn create(id: SupplierId, draft: SupplierDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut supplier = Self {
            id,
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            created_at: now,
        };
        supplier.revise(draft)?;
        Ok(supplier)
    }

    pub fn revise(&mut self, draft: SupplierDraft) -> DomainResult<()> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("supplier name cannot be empty"));
        }
        let email = draft.email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(DomainError::validation("supplier email is malformed"));
        }

        self.name = name.to_string();
        self.phone = draft.phone.trim().to_string();
        self.email = email.to_string();
        self.address = draft.address.trim().to_string();
        Ok(())
    }
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> SupplierId {
        self.id
    }
}
