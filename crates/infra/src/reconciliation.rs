//! Reconciliation engine.
//!
//! Keeps the denormalized `stock` counter of every variant consistent with the
//! inventory ledger. Each public operation runs in exactly one unit of work:
//! the stock update and the ledger append(s) are committed together or not at
//! all.
//!
//! ## Change-type policy
//!
//! | change type | effect on stock |
//! |---|---|
//! | `import` | `stock += quantity` |
//! | `return` | `stock += quantity` |
//! | `sale` | `stock -= quantity`, rejected if it would go negative |
//! | `adjust` | `stock = quantity` |
//!
//! ## Known drift
//!
//! - Same-variant purchase updates apply the delta without clamping, while
//!   purchase deletion clamps at zero.
//! - Deleting a purchase (default [`DeleteMode::Retain`]) appends an `adjust`
//!   entry carrying `-quantity`, which replays as an absolute value.
//! - Deleting a ledger entry never touches stock.
//!
//! [`ReconciliationEngine::audit_variant`] reports the resulting drift.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use stockroom_auth::User;
use stockroom_core::{
    InventoryLogId, OrderId, ProductId, PurchaseId, SupplierId, VariantId,
};
use stockroom_inventory::{ChangeType, InventoryLogDraft, InventoryLogEntry, StockAudit, StockEffect, Underflow};
use stockroom_parties::Supplier;
use stockroom_products::{Product, Variant, VariantChanges, VariantDraft};
use stockroom_purchasing::{Purchase, PurchaseChanges, PurchaseDraft};
use stockroom_sales::{Order, OrderDetail, OrderDraft, OrderItem};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Filter, Store, UnitOfWork, Value};

/// What happens to a purchase's ledger entries when the purchase is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Keep the original entries and append a compensating `adjust` entry.
    #[default]
    Retain,
    /// Remove every entry tagged with the purchase; append nothing.
    Cascade,
}

/// Engine-wide ledger settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Used when a delete call does not name a mode.
    pub purchase_delete: DeleteMode,
}

impl LedgerPolicy {
    pub fn cascading() -> Self {
        Self {
            purchase_delete: DeleteMode::Cascade,
        }
    }
}

#[derive(Clone)]
pub struct ReconciliationEngine<S: Store> {
    store: S,
    policy: LedgerPolicy,
}

fn purchase_note(prefix: &str, purchase: PurchaseId) -> String {
    format!("{prefix} #{purchase}")
}

/// Log a rejected stock operation and pass the error through.
fn rejected(operation: &'static str, err: ServiceError) -> ServiceError {
    if let ServiceError::InsufficientStock {
        variant,
        available,
        requested,
    } = &err
    {
        warn!(operation, variant_id = %variant, available, requested, "stock operation rejected");
    }
    err
}

async fn append<U: UnitOfWork>(tx: &mut U, entry: InventoryLogEntry) -> ServiceResult<InventoryLogEntry> {
    tx.create(&entry).await?;
    Ok(entry)
}

/// Purchases reached through a supplier are invisible to other suppliers.
fn ensure_scope(purchase: &Purchase, scope: Option<SupplierId>) -> ServiceResult<()> {
    match scope {
        Some(supplier) if purchase.supplier_id != supplier => {
            Err(ServiceError::not_found(format!("purchase {}", purchase.id)))
        }
        _ => Ok(()),
    }
}

impl<S: Store> ReconciliationEngine<S> {
    pub fn new(store: S, policy: LedgerPolicy) -> Self {
        Self { store, policy }
    }

    // ── Purchases ────────────────────────────────────────────────────────────

    /// Record a purchase and receive its quantity into stock.
    #[instrument(skip(self, draft), fields(variant_id = %draft.variant_id, quantity = draft.quantity), err)]
    pub async fn create_purchase(&self, draft: PurchaseDraft) -> ServiceResult<Purchase> {
        let supplier_id = draft
            .supplier_id
            .ok_or_else(|| ServiceError::validation("supplier_id is required"))?;

        let mut tx = self.store.begin().await?;
        tx.require::<Supplier>(supplier_id).await?;
        if let Some(staff) = draft.staff_id {
            tx.require::<User>(staff).await?;
        }
        tx.require_for_update::<Variant>(draft.variant_id).await?;

        let now = Utc::now();
        let purchase = Purchase::create(PurchaseId::new(), draft, now)?;
        tx.create(&purchase).await?;

        let stock = tx
            .adjust_stock_atomic(purchase.variant_id, purchase.quantity, Underflow::Allow)
            .await?;
        append(
            &mut tx,
            InventoryLogEntry::new(
                purchase.variant_id,
                ChangeType::Import,
                purchase.quantity,
                purchase_note("Auto created from purchase", purchase.id),
                now,
            )
            .for_purchase(purchase.id),
        )
        .await?;
        tx.commit().await?;

        info!(purchase_id = %purchase.id, variant_id = %purchase.variant_id, stock, "purchase recorded");
        Ok(purchase)
    }

    /// Record a purchase for the supplier named in the path; any supplier in
    /// the payload is ignored.
    pub async fn create_supplier_purchase(
        &self,
        supplier: SupplierId,
        mut draft: PurchaseDraft,
    ) -> ServiceResult<Purchase> {
        draft.supplier_id = Some(supplier);
        self.create_purchase(draft).await
    }

    pub async fn update_purchase(&self, id: PurchaseId, changes: PurchaseChanges) -> ServiceResult<Purchase> {
        self.update_purchase_scoped(None, id, changes).await
    }

    pub async fn update_supplier_purchase(
        &self,
        supplier: SupplierId,
        id: PurchaseId,
        changes: PurchaseChanges,
    ) -> ServiceResult<Purchase> {
        self.update_purchase_scoped(Some(supplier), id, changes).await
    }

    #[instrument(skip(self, changes), fields(purchase_id = %id), err)]
    async fn update_purchase_scoped(
        &self,
        scope: Option<SupplierId>,
        id: PurchaseId,
        changes: PurchaseChanges,
    ) -> ServiceResult<Purchase> {
        let mut tx = self.store.begin().await?;
        let mut purchase = tx.require_for_update::<Purchase>(id).await?;
        ensure_scope(&purchase, scope)?;
        if let Some(staff) = changes.staff_id {
            tx.require::<User>(staff).await?;
        }

        let old_variant = purchase.variant_id;
        let old_quantity = purchase.quantity;
        purchase.revise(changes)?;
        let new_variant = purchase.variant_id;
        let now = Utc::now();

        if new_variant == old_variant {
            tx.require_for_update::<Variant>(old_variant).await?;
            // No clamping here, unlike delete.
            let stock = tx
                .adjust_stock_atomic(old_variant, purchase.quantity - old_quantity, Underflow::Allow)
                .await?;
            append(
                &mut tx,
                InventoryLogEntry::new(
                    old_variant,
                    ChangeType::Adjust,
                    stock,
                    purchase_note("Update purchase", id),
                    now,
                )
                .for_purchase(id),
            )
            .await?;
        } else {
            // Lock both rows in id order so concurrent reassignments cannot deadlock.
            let (first, second) = if old_variant < new_variant {
                (old_variant, new_variant)
            } else {
                (new_variant, old_variant)
            };
            tx.require_for_update::<Variant>(first).await?;
            tx.require_for_update::<Variant>(second).await?;

            let old_stock = tx
                .adjust_stock_atomic(old_variant, -old_quantity, Underflow::Allow)
                .await?;
            append(
                &mut tx,
                InventoryLogEntry::new(
                    old_variant,
                    ChangeType::Adjust,
                    old_stock,
                    purchase_note("Rollback stock from purchase update", id),
                    now,
                )
                .for_purchase(id),
            )
            .await?;

            tx.adjust_stock_atomic(new_variant, purchase.quantity, Underflow::Allow)
                .await?;
            append(
                &mut tx,
                InventoryLogEntry::new(
                    new_variant,
                    ChangeType::Import,
                    purchase.quantity,
                    purchase_note("Update purchase", id),
                    now,
                )
                .for_purchase(id),
            )
            .await?;
        }

        tx.save(&purchase).await?;
        tx.commit().await?;

        info!(
            purchase_id = %id,
            old_variant = %old_variant,
            new_variant = %new_variant,
            old_quantity,
            new_quantity = purchase.quantity,
            "purchase updated"
        );
        Ok(purchase)
    }

    pub async fn delete_purchase(&self, id: PurchaseId, mode: Option<DeleteMode>) -> ServiceResult<Purchase> {
        self.delete_purchase_scoped(None, id, mode).await
    }

    pub async fn delete_supplier_purchase(
        &self,
        supplier: SupplierId,
        id: PurchaseId,
        mode: Option<DeleteMode>,
    ) -> ServiceResult<Purchase> {
        self.delete_purchase_scoped(Some(supplier), id, mode).await
    }

    /// Remove a purchase and take its quantity back out of stock (floored at
    /// zero). Returns the deleted purchase.
    #[instrument(skip(self), fields(purchase_id = %id), err)]
    async fn delete_purchase_scoped(
        &self,
        scope: Option<SupplierId>,
        id: PurchaseId,
        mode: Option<DeleteMode>,
    ) -> ServiceResult<Purchase> {
        let mode = mode.unwrap_or(self.policy.purchase_delete);

        let mut tx = self.store.begin().await?;
        let purchase = tx.require_for_update::<Purchase>(id).await?;
        ensure_scope(&purchase, scope)?;
        tx.require_for_update::<Variant>(purchase.variant_id).await?;

        let stock = tx
            .adjust_stock_atomic(purchase.variant_id, -purchase.quantity, Underflow::ClampToZero)
            .await?;

        let removed_entries = match mode {
            DeleteMode::Retain => {
                append(
                    &mut tx,
                    InventoryLogEntry::new(
                        purchase.variant_id,
                        ChangeType::Adjust,
                        -purchase.quantity,
                        purchase_note("Deleted purchase", id),
                        Utc::now(),
                    )
                    .for_purchase(id),
                )
                .await?;
                0
            }
            DeleteMode::Cascade => {
                tx.delete_where::<InventoryLogEntry>(Filter::eq("purchase_id", Value::id(id)))
                    .await?
            }
        };

        tx.delete::<Purchase>(id).await?;
        tx.commit().await?;

        info!(purchase_id = %id, variant_id = %purchase.variant_id, stock, ?mode, removed_entries, "purchase deleted");
        Ok(purchase)
    }

    pub async fn get_purchase(&self, id: PurchaseId) -> ServiceResult<Purchase> {
        let mut tx = self.store.begin().await?;
        Ok(tx.require::<Purchase>(id).await?)
    }

    pub async fn get_supplier_purchase(&self, supplier: SupplierId, id: PurchaseId) -> ServiceResult<Purchase> {
        let purchase = self.get_purchase(id).await?;
        ensure_scope(&purchase, Some(supplier))?;
        Ok(purchase)
    }

    /// Most recent first. Scoped to one supplier when given (which must exist).
    pub async fn list_purchases(&self, supplier: Option<SupplierId>) -> ServiceResult<Vec<Purchase>> {
        let mut tx = self.store.begin().await?;
        let filter = match supplier {
            Some(supplier) => {
                tx.require::<Supplier>(supplier).await?;
                Filter::eq("supplier_id", Value::id(supplier))
            }
            None => Filter::All,
        };
        Ok(tx.find(filter).await?)
    }

    // ── Inventory ledger ─────────────────────────────────────────────────────

    /// Apply a direct stock movement and append it to the ledger.
    #[instrument(skip(self, draft), fields(variant_id = %draft.variant_id, change_type = %draft.change_type), err)]
    pub async fn create_inventory_log(&self, draft: InventoryLogDraft) -> ServiceResult<InventoryLogEntry> {
        let mut tx = self.store.begin().await?;
        let variant = tx.require_for_update::<Variant>(draft.variant_id).await?;

        let change: ChangeType = draft.change_type.parse()?;
        change.validate_quantity(draft.quantity)?;

        let stock = match change.effect(draft.quantity) {
            StockEffect::Delta { delta, underflow } => tx
                .adjust_stock_atomic(variant.id, delta, underflow)
                .await
                .map_err(|e| rejected("create_inventory_log", e.into()))?,
            StockEffect::Set(value) => tx.set_stock(variant.id, value).await?,
        };

        let entry = append(
            &mut tx,
            InventoryLogEntry::new(variant.id, change, draft.quantity, draft.note, Utc::now()),
        )
        .await?;
        tx.commit().await?;

        info!(entry_id = %entry.id, variant_id = %variant.id, %change, quantity = entry.quantity, stock, "inventory log recorded");
        Ok(entry)
    }

    /// Only the note is editable; stock is never recomputed.
    pub async fn update_inventory_log_note(
        &self,
        id: InventoryLogId,
        note: impl Into<String>,
    ) -> ServiceResult<InventoryLogEntry> {
        let mut tx = self.store.begin().await?;
        let mut entry = tx.require_for_update::<InventoryLogEntry>(id).await?;
        entry.set_note(note);
        tx.save(&entry).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Removes the ledger row only; stock is not rolled back.
    pub async fn delete_inventory_log(&self, id: InventoryLogId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete::<InventoryLogEntry>(id).await? {
            return Err(ServiceError::not_found(format!("inventory log {id}")));
        }
        tx.commit().await?;
        info!(entry_id = %id, "inventory log deleted");
        Ok(())
    }

    pub async fn get_inventory_log(&self, id: InventoryLogId) -> ServiceResult<InventoryLogEntry> {
        let mut tx = self.store.begin().await?;
        Ok(tx.require::<InventoryLogEntry>(id).await?)
    }

    /// Most recent first.
    pub async fn list_inventory_logs(&self) -> ServiceResult<Vec<InventoryLogEntry>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find(Filter::All).await?)
    }

    /// One variant's ledger, most recent first.
    pub async fn ledger_for_variant(&self, variant: VariantId) -> ServiceResult<Vec<InventoryLogEntry>> {
        let mut tx = self.store.begin().await?;
        tx.require::<Variant>(variant).await?;
        Ok(tx.find(Filter::eq("variant_id", Value::id(variant))).await?)
    }

    /// Compare a variant's recorded stock with a replay of its ledger.
    pub async fn audit_variant(&self, variant: VariantId) -> ServiceResult<StockAudit> {
        let mut tx = self.store.begin().await?;
        let recorded = tx.require::<Variant>(variant).await?;
        let entries: Vec<InventoryLogEntry> =
            tx.find(Filter::eq("variant_id", Value::id(variant))).await?;
        let audit = StockAudit::new(variant, recorded.stock, &entries);
        if !audit.is_consistent() {
            warn!(variant_id = %variant, drift = audit.drift, "stock drift detected");
        }
        Ok(audit)
    }

    // ── Variants ─────────────────────────────────────────────────────────────

    /// Create a variant; opening stock is recorded as an `adjust` entry.
    #[instrument(skip(self, draft), fields(product_id = %product, sku = %draft.sku), err)]
    pub async fn create_variant(&self, product: ProductId, draft: VariantDraft) -> ServiceResult<Variant> {
        let mut tx = self.store.begin().await?;
        tx.require::<Product>(product).await?;

        let variant = Variant::create(VariantId::new(), product, draft)?;
        if tx.exists::<Variant>(Filter::eq("sku", variant.sku.as_str())).await? {
            return Err(ServiceError::conflict(format!("SKU '{}' already exists", variant.sku)));
        }
        tx.create(&variant).await?;

        if variant.stock > 0 {
            append(
                &mut tx,
                InventoryLogEntry::new(variant.id, ChangeType::Adjust, variant.stock, "Initial stock", Utc::now()),
            )
            .await?;
        }
        tx.commit().await?;

        info!(variant_id = %variant.id, stock = variant.stock, "variant created");
        Ok(variant)
    }

    /// Update catalog fields of a variant; stock is left alone.
    pub async fn update_variant(
        &self,
        product: ProductId,
        id: VariantId,
        changes: VariantChanges,
    ) -> ServiceResult<Variant> {
        let mut tx = self.store.begin().await?;
        let mut variant = tx.require_for_update::<Variant>(id).await?;
        if variant.product_id != product {
            return Err(ServiceError::not_found(format!("variant {id}")));
        }

        variant.revise(changes)?;
        let taken = Filter::eq("sku", variant.sku.as_str()).and(Filter::ne("id", Value::id(id)));
        if tx.exists::<Variant>(taken).await? {
            return Err(ServiceError::conflict(format!("SKU '{}' already exists", variant.sku)));
        }
        tx.save(&variant).await?;
        tx.commit().await?;
        Ok(variant)
    }

    /// Delete a variant and its ledger. Refused while purchases or order
    /// items still point at it.
    pub async fn delete_variant(&self, product: ProductId, id: VariantId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let variant = tx.require_for_update::<Variant>(id).await?;
        if variant.product_id != product {
            return Err(ServiceError::not_found(format!("variant {id}")));
        }

        let referenced = Filter::eq("variant_id", Value::id(id));
        if tx.exists::<Purchase>(referenced.clone()).await? {
            return Err(ServiceError::conflict(format!("variant {id} is referenced by purchases")));
        }
        if tx.exists::<OrderItem>(referenced.clone()).await? {
            return Err(ServiceError::conflict(format!("variant {id} is referenced by orders")));
        }

        let removed_entries = tx.delete_where::<InventoryLogEntry>(referenced).await?;
        tx.delete::<Variant>(id).await?;
        tx.commit().await?;

        info!(variant_id = %id, removed_entries, "variant deleted");
        Ok(())
    }

    // ── Orders ───────────────────────────────────────────────────────────────

    /// Place an order: every line is a `sale` against stock. One line that
    /// cannot be served aborts the whole order.
    #[instrument(skip(self, draft), fields(customer_id = %draft.customer_id, lines = draft.items.len()), err)]
    pub async fn place_order(&self, draft: OrderDraft) -> ServiceResult<OrderDetail> {
        draft.validate()?;

        let mut tx = self.store.begin().await?;
        tx.require::<User>(draft.customer_id).await?;

        let now = Utc::now();
        let mut order = Order::new(OrderId::new(), &draft, now)?;
        tx.create(&order).await?;

        let mut lines = draft.items.clone();
        lines.sort_by_key(|line| line.variant_id);

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let variant = tx.require_for_update::<Variant>(line.variant_id).await?;
            tx.adjust_stock_atomic(variant.id, -line.quantity, Underflow::Reject)
                .await
                .map_err(|e| rejected("place_order", e.into()))?;

            let item = OrderItem::new(order.id, variant.id, line.quantity, variant.price);
            tx.create(&item).await?;
            append(
                &mut tx,
                InventoryLogEntry::new(variant.id, ChangeType::Sale, line.quantity, order.label(), now),
            )
            .await?;
            items.push(item);
        }

        order.set_items_total(&items)?;
        tx.save(&order).await?;
        tx.commit().await?;

        info!(order_id = %order.id, total = order.total, "order placed");
        Ok(OrderDetail { order, items })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use stockroom_core::UserId;
    use stockroom_sales::{OrderLineDraft, PaymentMethod};

    use super::*;
    use crate::test_support::Fixture;

    fn purchase(fx: &Fixture, variant: VariantId, quantity: i64) -> PurchaseDraft {
        PurchaseDraft {
            supplier_id: Some(fx.supplier),
            staff_id: Some(fx.staff),
            variant_id: variant,
            quantity,
            cost_price: 400,
        }
    }

    fn log(variant: VariantId, change_type: &str, quantity: i64) -> InventoryLogDraft {
        InventoryLogDraft {
            variant_id: variant,
            change_type: change_type.into(),
            quantity,
            note: String::new(),
        }
    }

    fn order(fx: &Fixture, lines: &[(VariantId, i64)]) -> OrderDraft {
        OrderDraft {
            customer_id: fx.customer,
            payment_method: PaymentMethod::Cod,
            items: lines
                .iter()
                .map(|&(variant_id, quantity)| OrderLineDraft { variant_id, quantity })
                .collect(),
        }
    }

    #[tokio::test]
    async fn purchase_adds_stock_and_one_import_entry() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 10).await;

        let p = fx.engine.create_purchase(purchase(&fx, variant, 5)).await.unwrap();

        assert_eq!(p.total, 2_000);
        assert_eq!(fx.stock(variant).await, 15);
        let ledger = fx.ledger(variant).await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].change_type, ChangeType::Import);
        assert_eq!(ledger[0].quantity, 5);
        assert_eq!(ledger[0].purchase_id, Some(p.id));
        assert_eq!(ledger[0].note, format!("Auto created from purchase #{}", p.id));
    }

    #[tokio::test]
    async fn purchase_requires_an_existing_supplier_and_variant() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 0).await;

        let mut draft = purchase(&fx, variant, 5);
        draft.supplier_id = None;
        assert!(matches!(
            fx.engine.create_purchase(draft).await,
            Err(ServiceError::Validation(_))
        ));

        let mut draft = purchase(&fx, variant, 5);
        draft.supplier_id = Some(SupplierId::new());
        assert!(matches!(
            fx.engine.create_purchase(draft).await,
            Err(ServiceError::NotFound(_))
        ));

        let draft = purchase(&fx, VariantId::new(), 5);
        assert!(matches!(
            fx.engine.create_purchase(draft).await,
            Err(ServiceError::NotFound(_))
        ));

        assert!(matches!(
            fx.engine.create_purchase(purchase(&fx, variant, 0)).await,
            Err(ServiceError::Validation(_))
        ));

        assert_eq!(fx.stock(variant).await, 0);
        assert!(fx.ledger(variant).await.is_empty());
        assert!(fx.engine.list_purchases(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn supplier_scoped_routes_take_the_supplier_from_the_path() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 0).await;

        let mut draft = purchase(&fx, variant, 2);
        draft.supplier_id = Some(SupplierId::new());
        let p = fx
            .engine
            .create_supplier_purchase(fx.supplier, draft)
            .await
            .unwrap();
        assert_eq!(p.supplier_id, fx.supplier);

        let stranger = SupplierId::new();
        assert!(matches!(
            fx.engine.get_supplier_purchase(stranger, p.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            fx.engine.delete_supplier_purchase(stranger, p.id, None).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(fx.stock(variant).await, 2);
        assert_eq!(fx.engine.list_purchases(Some(fx.supplier)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_variant_update_applies_the_delta_and_records_absolute_stock() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 3).await;
        let p = fx.engine.create_purchase(purchase(&fx, variant, 10)).await.unwrap();

        let updated = fx
            .engine
            .update_purchase(
                p.id,
                PurchaseChanges {
                    quantity: Some(4),
                    ..PurchaseChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.quantity, 4);
        assert_eq!(updated.total, 1_600);
        assert_eq!(fx.stock(variant).await, 7);
        let ledger = fx.ledger(variant).await;
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].change_type, ChangeType::Adjust);
        assert_eq!(ledger[0].quantity, 7);
        assert_eq!(ledger[0].note, format!("Update purchase #{}", p.id));
    }

    #[tokio::test]
    async fn same_variant_update_may_drive_stock_negative() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 0).await;
        let p = fx.engine.create_purchase(purchase(&fx, variant, 10)).await.unwrap();
        fx.engine
            .create_inventory_log(log(variant, "sale", 8))
            .await
            .unwrap();

        fx.engine
            .update_purchase(
                p.id,
                PurchaseChanges {
                    quantity: Some(1),
                    ..PurchaseChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(fx.stock(variant).await, -7);
    }

    #[tokio::test]
    async fn reassigning_a_purchase_moves_stock_between_variants() {
        let fx = Fixture::new().await;
        let a = fx.variant("SHIRT-M", 2).await;
        let b = fx.variant("SHIRT-L", 1).await;
        let p = fx.engine.create_purchase(purchase(&fx, a, 5)).await.unwrap();

        fx.engine
            .update_purchase(
                p.id,
                PurchaseChanges {
                    variant_id: Some(b),
                    quantity: Some(6),
                    ..PurchaseChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(fx.stock(a).await, 2);
        assert_eq!(fx.stock(b).await, 7);

        let ledger_a = fx.ledger(a).await;
        assert_eq!(ledger_a.len(), 2);
        assert_eq!(ledger_a[0].change_type, ChangeType::Adjust);
        assert_eq!(ledger_a[0].quantity, 2);
        assert_eq!(ledger_a[0].note, format!("Rollback stock from purchase update #{}", p.id));

        let ledger_b = fx.ledger(b).await;
        assert_eq!(ledger_b.len(), 1);
        assert_eq!(ledger_b[0].change_type, ChangeType::Import);
        assert_eq!(ledger_b[0].quantity, 6);
        assert_eq!(ledger_b[0].purchase_id, Some(p.id));
    }

    #[tokio::test]
    async fn reassigning_to_a_missing_variant_changes_nothing() {
        let fx = Fixture::new().await;
        let a = fx.variant("SHIRT-M", 0).await;
        let p = fx.engine.create_purchase(purchase(&fx, a, 5)).await.unwrap();

        let result = fx
            .engine
            .update_purchase(
                p.id,
                PurchaseChanges {
                    variant_id: Some(VariantId::new()),
                    ..PurchaseChanges::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert_eq!(fx.stock(a).await, 5);
        assert_eq!(fx.ledger(a).await.len(), 1);
        assert_eq!(fx.engine.get_purchase(p.id).await.unwrap().variant_id, a);
    }

    #[tokio::test]
    async fn delete_clamps_at_zero_and_keeps_original_entries() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 0).await;
        let p = fx.engine.create_purchase(purchase(&fx, variant, 5)).await.unwrap();
        fx.engine
            .create_inventory_log(log(variant, "sale", 3))
            .await
            .unwrap();

        let deleted = fx.engine.delete_purchase(p.id, None).await.unwrap();

        assert_eq!(deleted.id, p.id);
        assert_eq!(fx.stock(variant).await, 0);
        assert!(matches!(
            fx.engine.get_purchase(p.id).await,
            Err(ServiceError::NotFound(_))
        ));

        let ledger = fx.ledger(variant).await;
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger[0].change_type, ChangeType::Adjust);
        assert_eq!(ledger[0].quantity, -5);
        assert_eq!(ledger[0].note, format!("Deleted purchase #{}", p.id));
        assert!(ledger.iter().any(|e| e.change_type == ChangeType::Import));
    }

    #[tokio::test]
    async fn cascade_delete_removes_purchase_tagged_entries() {
        let fx = Fixture::with_policy(LedgerPolicy::cascading()).await;
        let variant = fx.variant("SHIRT-M", 4).await;
        let p = fx.engine.create_purchase(purchase(&fx, variant, 5)).await.unwrap();
        fx.engine
            .update_purchase(
                p.id,
                PurchaseChanges {
                    quantity: Some(6),
                    ..PurchaseChanges::default()
                },
            )
            .await
            .unwrap();
        fx.engine
            .create_inventory_log(log(variant, "return", 1))
            .await
            .unwrap();

        fx.engine.delete_purchase(p.id, None).await.unwrap();

        assert_eq!(fx.stock(variant).await, 5);
        let ledger = fx.ledger(variant).await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].change_type, ChangeType::Return);
    }

    #[tokio::test]
    async fn per_call_mode_overrides_the_policy() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 0).await;
        let p = fx.engine.create_purchase(purchase(&fx, variant, 5)).await.unwrap();

        fx.engine
            .delete_purchase(p.id, Some(DeleteMode::Cascade))
            .await
            .unwrap();

        assert!(fx.ledger(variant).await.is_empty());
        assert_eq!(fx.stock(variant).await, 0);
    }

    #[tokio::test]
    async fn inventory_log_policy_per_change_type() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 10).await;

        fx.engine.create_inventory_log(log(variant, "import", 5)).await.unwrap();
        assert_eq!(fx.stock(variant).await, 15);
        fx.engine.create_inventory_log(log(variant, "Return", 2)).await.unwrap();
        assert_eq!(fx.stock(variant).await, 17);
        fx.engine.create_inventory_log(log(variant, "sale", 7)).await.unwrap();
        assert_eq!(fx.stock(variant).await, 10);
        fx.engine.create_inventory_log(log(variant, "adjust", 0)).await.unwrap();
        assert_eq!(fx.stock(variant).await, 0);
        assert_eq!(fx.ledger(variant).await.len(), 4);
    }

    #[tokio::test]
    async fn oversized_sale_is_rejected_without_writes() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 3).await;

        let err = fx
            .engine
            .create_inventory_log(log(variant, "sale", 4))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::InsufficientStock {
                variant,
                available: 3,
                requested: 4
            }
        );
        assert_eq!(fx.stock(variant).await, 3);
        assert!(fx.ledger(variant).await.is_empty());
    }

    #[tokio::test]
    async fn inventory_log_input_errors() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 3).await;

        assert!(matches!(
            fx.engine.create_inventory_log(log(VariantId::new(), "import", 1)).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            fx.engine.create_inventory_log(log(variant, "restock", 1)).await,
            Err(ServiceError::InvalidChangeType(_))
        ));
        assert!(matches!(
            fx.engine.create_inventory_log(log(variant, "import", 0)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            fx.engine.create_inventory_log(log(variant, "adjust", -1)).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(fx.stock(variant).await, 3);
    }

    #[tokio::test]
    async fn editing_or_deleting_a_log_never_touches_stock() {
        let fx = Fixture::new().await;
        let variant = fx.variant("SHIRT-M", 0).await;
        let entry = fx
            .engine
            .create_inventory_log(log(variant, "import", 9))
            .await
            .unwrap();

        let edited = fx
            .engine
            .update_inventory_log_note(entry.id, "counted twice")
            .await
            .unwrap();
        assert_eq!(edited.note, "counted twice");
        assert_eq!(edited.quantity, 9);

        fx.engine.delete_inventory_log(entry.id).await.unwrap();
        assert_eq!(fx.stock(variant).await, 9);
        assert!(matches!(
            fx.engine.delete_inventory_log(entry.id).await,
            Err(ServiceError::NotFound(_))
        ));

        let audit = fx.engine.audit_variant(variant).await.unwrap();
        assert_eq!(audit.replayed_stock, 0);
        assert_eq!(audit.drift, 9);
    }

    #[tokio::test]
    async fn ledger_reads() {
        let fx = Fixture::new().await;
        let a = fx.variant("SHIRT-M", 0).await;
        let b = fx.variant("SHIRT-L", 0).await;
        let first = fx.engine.create_inventory_log(log(a, "import", 1)).await.unwrap();
        fx.engine.create_inventory_log(log(b, "import", 2)).await.unwrap();

        assert_eq!(fx.engine.list_inventory_logs().await.unwrap().len(), 2);
        assert_eq!(fx.engine.ledger_for_variant(a).await.unwrap().len(), 1);
        assert_eq!(fx.engine.get_inventory_log(first.id).await.unwrap(), first);
        assert!(matches!(
            fx.engine.ledger_for_variant(VariantId::new()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn variant_creation_checks_product_and_sku() {
        let fx = Fixture::new().await;
        let draft = VariantDraft {
            sku: "TEE-S".into(),
            price: 900,
            initial_stock: 4,
            ..VariantDraft::default()
        };

        let variant = fx.engine.create_variant(fx.product, draft.clone()).await.unwrap();
        assert_eq!(fx.stock(variant.id).await, 4);
        let ledger = fx.ledger(variant.id).await;
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].change_type, ChangeType::Adjust);
        assert_eq!(ledger[0].quantity, 4);

        let duplicate = VariantDraft {
            sku: " TEE-S ".into(),
            ..draft.clone()
        };
        assert!(matches!(
            fx.engine.create_variant(fx.product, duplicate).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            fx.engine.create_variant(ProductId::new(), draft).await,
            Err(ServiceError::NotFound(_))
        ));

        let mut tx = fx.store.begin().await.unwrap();
        let all: Vec<Variant> = tx.find(Filter::All).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn variant_update_keeps_stock_and_guards_sku() {
        let fx = Fixture::new().await;
        let a = fx.variant("TEE-S", 6).await;
        fx.variant("TEE-M", 0).await;

        let changes = |sku: &str| VariantChanges {
            size: "S".into(),
            color: "navy".into(),
            price: 1_200,
            sku: sku.into(),
            image: String::new(),
        };

        let updated = fx.engine.update_variant(fx.product, a, changes("TEE-S")).await.unwrap();
        assert_eq!(updated.color, "navy");
        assert_eq!(updated.stock, 6);

        assert!(matches!(
            fx.engine.update_variant(fx.product, a, changes("TEE-M")).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            fx.engine.update_variant(ProductId::new(), a, changes("TEE-X")).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn variant_delete_is_refused_while_referenced() {
        let fx = Fixture::new().await;
        let bought = fx.variant("TEE-S", 0).await;
        let loose = fx.variant("TEE-M", 0).await;
        fx.engine.create_purchase(purchase(&fx, bought, 1)).await.unwrap();
        fx.engine.create_inventory_log(log(loose, "import", 3)).await.unwrap();

        assert!(matches!(
            fx.engine.delete_variant(fx.product, bought).await,
            Err(ServiceError::Conflict(_))
        ));

        fx.engine.delete_variant(fx.product, loose).await.unwrap();
        assert!(fx.ledger(loose).await.is_empty());
        assert!(matches!(
            fx.engine.audit_variant(loose).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn order_placement_sells_every_line() {
        let fx = Fixture::new().await;
        let a = fx.variant("TEE-S", 5).await;
        let b = fx.variant("TEE-M", 2).await;

        let detail = fx.engine.place_order(order(&fx, &[(a, 2), (b, 1)])).await.unwrap();

        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.order.total, 3_000);
        assert_eq!(fx.stock(a).await, 3);
        assert_eq!(fx.stock(b).await, 1);
        let ledger = fx.ledger(a).await;
        assert_eq!(ledger[0].change_type, ChangeType::Sale);
        assert_eq!(ledger[0].note, detail.order.label());
    }

    #[tokio::test]
    async fn one_short_line_aborts_the_whole_order() {
        let fx = Fixture::new().await;
        let a = fx.variant("TEE-S", 5).await;
        let b = fx.variant("TEE-M", 0).await;

        let err = fx
            .engine
            .place_order(order(&fx, &[(a, 2), (b, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InsufficientStock { .. }));
        assert_eq!(fx.stock(a).await, 5);
        assert!(fx.ledger(a).await.is_empty());
        let mut tx = fx.store.begin().await.unwrap();
        let orders: Vec<Order> = tx.find(Filter::All).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn orders_need_a_known_customer_and_lines() {
        let fx = Fixture::new().await;
        let a = fx.variant("TEE-S", 5).await;

        let mut draft = order(&fx, &[(a, 1)]);
        draft.customer_id = UserId::new();
        assert!(matches!(
            fx.engine.place_order(draft).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            fx.engine.place_order(order(&fx, &[])).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(fx.stock(a).await, 5);
    }

    #[tokio::test]
    async fn stock_overflow_is_a_validation_error() {
        let fx = Fixture::new().await;
        let variant = fx.variant("BULK-1", i64::MAX - 1).await;

        assert!(matches!(
            fx.engine.create_inventory_log(log(variant, "import", 5)).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            fx.engine.create_purchase(purchase(&fx, variant, 5)).await,
            Err(ServiceError::Validation(_))
        ));

        assert_eq!(fx.stock(variant).await, i64::MAX - 1);
        assert!(fx.ledger(variant).await.is_empty());
        assert!(fx.engine.list_purchases(None).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_changes_to_one_variant_are_not_lost() {
        const PURCHASES: usize = 20;
        const SALES: usize = 30;

        let fx = Fixture::new().await;
        let variant = fx.variant("RUSH-1", 5).await;

        let mut purchases = Vec::new();
        for _ in 0..PURCHASES {
            let engine = fx.engine.clone();
            let draft = purchase(&fx, variant, 2);
            purchases.push(tokio::spawn(async move { engine.create_purchase(draft).await }));
        }
        let mut sales = Vec::new();
        for _ in 0..SALES {
            let engine = fx.engine.clone();
            sales.push(tokio::spawn(async move {
                engine.create_inventory_log(log(variant, "sale", 1)).await
            }));
        }

        for handle in purchases {
            handle.await.unwrap().unwrap();
        }
        let mut sold = 0;
        for handle in sales {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(ServiceError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let expected = 5 + 2 * PURCHASES as i64 - sold;
        assert!(expected >= 0);
        assert_eq!(fx.stock(variant).await, expected);

        let ledger = fx.ledger(variant).await;
        assert_eq!(ledger.len(), PURCHASES + sold as usize);
        assert_eq!(
            ledger.iter().filter(|e| e.change_type == ChangeType::Sale).count(),
            sold as usize
        );
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

        #[test]
        fn purchases_alone_keep_stock_equal_to_imports(quantities in prop::collection::vec(1i64..500, 1..12)) {
            let (stock, imported, consistent) = block_on(async {
                let fx = Fixture::new().await;
                let variant = fx.variant("PROP-1", 0).await;
                for q in &quantities {
                    fx.engine.create_purchase(purchase(&fx, variant, *q)).await.unwrap();
                }
                let ledger = fx.ledger(variant).await;
                let audit = fx.engine.audit_variant(variant).await.unwrap();
                (
                    fx.stock(variant).await,
                    stockroom_inventory::total_imported(variant, &ledger),
                    audit.is_consistent(),
                )
            });
            prop_assert_eq!(stock, quantities.iter().sum::<i64>());
            prop_assert_eq!(stock, imported);
            prop_assert!(consistent);
        }

        #[test]
        fn sales_never_push_stock_below_zero(start in 0i64..50, sales in prop::collection::vec(1i64..20, 1..10)) {
            let (stock, accepted) = block_on(async {
                let fx = Fixture::new().await;
                let variant = fx.variant("PROP-2", start).await;
                let mut accepted = 0i64;
                for q in &sales {
                    if fx.engine.create_inventory_log(log(variant, "sale", *q)).await.is_ok() {
                        accepted += q;
                    }
                }
                (fx.stock(variant).await, accepted)
            });
            prop_assert!(stock >= 0);
            prop_assert_eq!(stock, start - accepted);
        }

        #[test]
        fn delete_purchase_floors_at_zero(start in 0i64..50, q in 1i64..50, sold in 0i64..100) {
            let (stock, before_delete) = block_on(async {
                let fx = Fixture::new().await;
                let variant = fx.variant("PROP-3", start).await;
                let p = fx.engine.create_purchase(purchase(&fx, variant, q)).await.unwrap();
                let sold = sold.min(start + q);
                if sold > 0 {
                    fx.engine.create_inventory_log(log(variant, "sale", sold)).await.unwrap();
                }
                fx.engine.delete_purchase(p.id, None).await.unwrap();
                (fx.stock(variant).await, start + q - sold)
            });
            prop_assert_eq!(stock, (before_delete - q).max(0));
        }
    }
}
