use serde::Serialize;
use uuid::Uuid;

use stockroom_core::{Entity, EntityId};
use stockroom_parties::Supplier;
use stockroom_products::{Category, Product};
use stockroom_purchasing::Purchase;
use stockroom_sales::Order;

use crate::error::ServiceResult;
use crate::store::{Filter, Record, Store, UnitOfWork};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Product,
    Supplier,
    Category,
    Order,
    Purchase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub id: Uuid,
    pub label: String,
}

/// Case-insensitive keyword lookup across the admin entities. Results are
/// grouped by kind in a fixed order; there is no ranking.
#[derive(Clone)]
pub struct SearchService<S: Store> {
    store: S,
}

impl<S: Store> SearchService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn search(&self, keyword: &str) -> ServiceResult<Vec<SearchHit>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.store.begin().await?;
        let mut hits = Vec::new();
        collect::<Product, _>(&mut tx, &mut hits, SearchKind::Product, "name", keyword, |p| p.name.clone()).await?;
        collect::<Supplier, _>(&mut tx, &mut hits, SearchKind::Supplier, "name", keyword, |s| s.name.clone()).await?;
        collect::<Category, _>(&mut tx, &mut hits, SearchKind::Category, "name", keyword, |c| c.name.clone()).await?;
        collect::<Order, _>(&mut tx, &mut hits, SearchKind::Order, "id", keyword, Order::label).await?;
        collect::<Purchase, _>(&mut tx, &mut hits, SearchKind::Purchase, "id", keyword, Purchase::label).await?;
        Ok(hits)
    }
}

async fn collect<R: Record, U: UnitOfWork>(
    tx: &mut U,
    hits: &mut Vec<SearchHit>,
    kind: SearchKind,
    column: &'static str,
    keyword: &str,
    label: impl Fn(&R) -> String,
) -> ServiceResult<()> {
    let found = tx.find::<R>(Filter::contains(column, keyword)).await?;
    hits.extend(found.iter().map(|record| SearchHit {
        kind,
        id: record.id().uuid(),
        label: label(record),
    }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use stockroom_purchasing::PurchaseDraft;

    use super::*;
    use crate::test_support::Fixture;

    #[tokio::test]
    async fn hits_are_grouped_by_kind() {
        let fx = Fixture::new().await;
        let variant = fx.variant("OX-M", 0).await;
        let purchase = fx
            .engine
            .create_purchase(PurchaseDraft {
                supplier_id: Some(fx.supplier),
                staff_id: None,
                variant_id: variant,
                quantity: 1,
                cost_price: 100,
            })
            .await
            .unwrap();
        let svc = SearchService::new(fx.store.clone());

        let hits = svc.search("SHIRT").await.unwrap();
        let kinds: Vec<SearchKind> = hits.iter().map(|h| h.kind).collect();
        assert_eq!(kinds, [SearchKind::Product, SearchKind::Category]);
        assert_eq!(hits[0].label, "Oxford shirt");

        let prefix = &purchase.id.to_string()[..13];
        let hits = svc.search(prefix).await.unwrap();
        assert!(hits
            .iter()
            .any(|h| h.kind == SearchKind::Purchase && h.label == purchase.label()));

        let hits = svc.search("acme").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, SearchKind::Supplier);
        assert_eq!(hits[0].id, *fx.supplier.as_uuid());
    }

    #[tokio::test]
    async fn blank_keyword_finds_nothing() {
        let fx = Fixture::new().await;
        let svc = SearchService::new(fx.store.clone());
        assert!(svc.search("   ").await.unwrap().is_empty());
    }
}
