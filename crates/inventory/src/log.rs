use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, InventoryLogId, PurchaseId, VariantId};

use crate::change_type::ChangeType;

/// One ledger record. Only `note` may change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLogEntry {
    pub id: InventoryLogId,
    pub variant_id: VariantId,
    pub change_type: ChangeType,
    pub quantity: i64,
    pub note: String,
    /// Set on entries written on behalf of a purchase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_id: Option<PurchaseId>,
    pub created_at: DateTime<Utc>,
}

/// Request to append an entry through the inventory-log path.
///
/// `change_type` stays a string so unknown kinds surface as
/// `InvalidChangeType` instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLogDraft {
    pub variant_id: VariantId,
    pub change_type: String,
    pub quantity: i64,
    #[serde(default)]
    pub note: String,
}

impl InventoryLogEntry {
    pub fn new(
        variant_id: VariantId,
        change_type: ChangeType,
        quantity: i64,
        note: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InventoryLogId::new(),
            variant_id,
            change_type,
            quantity,
            note: note.into(),
            purchase_id: None,
            created_at: now,
        }
    }

    pub fn for_purchase(mut self, purchase: PurchaseId) -> Self {
        self.purchase_id = Some(purchase);
        self
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }
}

impl Entity for InventoryLogEntry {
    type Id = InventoryLogId;

    fn id(&self) -> InventoryLogId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_tag_is_omitted_when_absent() {
        let entry = InventoryLogEntry::new(VariantId::new(), ChangeType::Return, 2, "", Utc::now());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("purchase_id").is_none());
        assert_eq!(json["change_type"], "return");

        let purchase = PurchaseId::new();
        let tagged = entry.for_purchase(purchase);
        let json = serde_json::to_value(&tagged).unwrap();
        assert_eq!(json["purchase_id"], purchase.to_string());
    }

    #[test]
    fn draft_accepts_unknown_change_type_strings() {
        let draft: InventoryLogDraft = serde_json::from_value(serde_json::json!({
            "variant_id": VariantId::new(),
            "change_type": "teleport",
            "quantity": 1
        }))
        .unwrap();
        assert_eq!(draft.change_type, "teleport");
        assert!(draft.note.is_empty());
    }
}
