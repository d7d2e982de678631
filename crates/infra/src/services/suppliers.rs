use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};

use stockroom_core::SupplierId;
use stockroom_parties::{Supplier, SupplierDraft};
use stockroom_purchasing::Purchase;

use crate::error::{ServiceError, ServiceResult};
use crate::store::{Filter, Store, UnitOfWork, Value};

/// Supplier together with every purchase recorded against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierDetail {
    #[serde(flatten)]
    pub supplier: Supplier,
    pub purchases: Vec<Purchase>,
}

#[derive(Clone)]
pub struct SupplierService<S: Store> {
    store: S,
}

impl<S: Store> SupplierService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> ServiceResult<Vec<Supplier>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find(Filter::All).await?)
    }

    pub async fn detail(&self, id: SupplierId) -> ServiceResult<SupplierDetail> {
        let mut tx = self.store.begin().await?;
        let supplier = tx.require::<Supplier>(id).await?;
        let purchases = tx
            .find::<Purchase>(Filter::eq("supplier_id", Value::id(id)))
            .await?;
        Ok(SupplierDetail { supplier, purchases })
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    pub async fn create(&self, draft: SupplierDraft) -> ServiceResult<Supplier> {
        let supplier = Supplier::create(SupplierId::new(), draft, Utc::now())?;
        let mut tx = self.store.begin().await?;
        tx.create(&supplier).await?;
        tx.commit().await?;
        info!(supplier_id = %supplier.id, "supplier created");
        Ok(supplier)
    }

    pub async fn update(&self, id: SupplierId, draft: SupplierDraft) -> ServiceResult<Supplier> {
        let mut tx = self.store.begin().await?;
        let mut supplier = tx.require_for_update::<Supplier>(id).await?;
        supplier.revise(draft)?;
        tx.save(&supplier).await?;
        tx.commit().await?;
        Ok(supplier)
    }

    pub async fn delete(&self, id: SupplierId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        tx.require_for_update::<Supplier>(id).await?;
        if tx
            .exists::<Purchase>(Filter::eq("supplier_id", Value::id(id)))
            .await?
        {
            return Err(ServiceError::conflict(format!("supplier {id} has purchases")));
        }
        tx.delete::<Supplier>(id).await?;
        tx.commit().await?;
        info!(supplier_id = %id, "supplier deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stockroom_purchasing::PurchaseDraft;

    use super::*;
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn detail_includes_purchases_and_delete_is_guarded() {
        let fx = Fixture::new().await;
        let svc = SupplierService::new(fx.store.clone());
        let variant = fx.variant("OX-M", 0).await;
        fx.engine
            .create_purchase(PurchaseDraft {
                supplier_id: Some(fx.supplier),
                staff_id: None,
                variant_id: variant,
                quantity: 3,
                cost_price: 100,
            })
            .await
            .unwrap();

        let detail = svc.detail(fx.supplier).await.unwrap();
        assert_eq!(detail.supplier.name, "Acme Textiles");
        assert_eq!(detail.purchases.len(), 1);

        assert!(matches!(
            svc.delete(fx.supplier).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn crud_round() {
        let fx = Fixture::new().await;
        let svc = SupplierService::new(fx.store.clone());

        let created = svc
            .create(SupplierDraft {
                name: "  Bolt & Co ".into(),
                email: "orders@bolt.example".into(),
                ..SupplierDraft::default()
            })
            .await
            .unwrap();
        assert_eq!(created.name, "Bolt & Co");

        assert!(matches!(
            svc.update(
                created.id,
                SupplierDraft {
                    name: String::new(),
                    ..SupplierDraft::default()
                }
            )
            .await,
            Err(ServiceError::Validation(_))
        ));

        let names: Vec<String> = svc.list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["Acme Textiles", "Bolt & Co"]);

        svc.delete(created.id).await.unwrap();
        assert!(matches!(
            svc.detail(created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
