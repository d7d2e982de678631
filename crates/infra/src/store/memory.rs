//! In-memory store for tests and local development.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use stockroom_core::{DomainError, EntityId, VariantId};
use stockroom_inventory::{Underflow, apply_delta};
use stockroom_products::Variant;

use super::record::{Filter, Record, Row, SortOrder, Value};
use super::{Store, StoreError, StoreResult, UnitOfWork};

type Table = BTreeMap<Uuid, Row>;

#[derive(Debug, Clone, Default)]
struct Tables(HashMap<&'static str, Table>);

impl Tables {
    fn table(&self, name: &str) -> Option<&Table> {
        self.0.get(name)
    }

    fn table_mut(&mut self, name: &'static str) -> &mut Table {
        self.0.entry(name).or_default()
    }
}

/// Shared in-memory tables behind one async mutex.
///
/// A unit of work owns the lock until it is committed or dropped and works on
/// a private copy of the tables, so rollback is simply dropping the copy.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryUnitOfWork;

    async fn begin(&self) -> StoreResult<InMemoryUnitOfWork> {
        let guard = self.inner.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryUnitOfWork { guard, working })
    }
}

pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

impl InMemoryUnitOfWork {
    fn check_unique<R: Record>(&self, row: &Row, id: Uuid) -> StoreResult<()> {
        let Some(table) = self.working.table(R::TABLE) else {
            return Ok(());
        };
        for column in R::UNIQUE {
            let value = row.get(column);
            if value.is_null() {
                continue;
            }
            let taken = table
                .iter()
                .any(|(other_id, other)| *other_id != id && other.get(column) == value);
            if taken {
                return Err(StoreError::UniqueViolation(format!("{}.{column}", R::TABLE)));
            }
        }
        Ok(())
    }

    fn variant_row(&mut self, variant: VariantId) -> StoreResult<&mut Row> {
        self.working
            .table_mut(<Variant as Record>::TABLE)
            .get_mut(&variant.uuid())
            .ok_or_else(|| StoreError::NotFound(format!("variant {variant}")))
    }
}

fn sort_key<'a>(row: &'a Row, column: &str) -> (&'a Value, &'a Value) {
    (row.get(column), row.get("id"))
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn get<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>> {
        self.working
            .table(R::TABLE)
            .and_then(|table| table.get(&id.uuid()))
            .map(R::from_row)
            .transpose()
    }

    async fn get_for_update<R: Record>(&mut self, id: R::Id) -> StoreResult<Option<R>> {
        // The whole store is already locked by this unit of work.
        self.get::<R>(id).await
    }

    async fn find<R: Record>(&mut self, filter: Filter) -> StoreResult<Vec<R>> {
        let Some(table) = self.working.table(R::TABLE) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<&Row> = table.values().filter(|row| filter.matches(row)).collect();
        let (column, order) = R::ORDER_BY;
        rows.sort_by(|a, b| {
            let ordering = sort_key(a, column)
                .partial_cmp(&sort_key(b, column))
                .unwrap_or(core::cmp::Ordering::Equal);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        rows.into_iter().map(R::from_row).collect()
    }

    async fn create<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        let id = record.id().uuid();
        let row = record.to_row();
        if self
            .working
            .table(R::TABLE)
            .is_some_and(|table| table.contains_key(&id))
        {
            return Err(StoreError::UniqueViolation(format!("{}.id", R::TABLE)));
        }
        self.check_unique::<R>(&row, id)?;
        self.working.table_mut(R::TABLE).insert(id, row);
        Ok(())
    }

    async fn save<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        let id = record.id().uuid();
        let row = record.to_row();
        self.check_unique::<R>(&row, id)?;
        match self.working.table_mut(R::TABLE).get_mut(&id) {
            Some(existing) => {
                *existing = row;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("{} {id}", R::TABLE))),
        }
    }

    async fn delete<R: Record>(&mut self, id: R::Id) -> StoreResult<bool> {
        Ok(self.working.table_mut(R::TABLE).remove(&id.uuid()).is_some())
    }

    async fn delete_where<R: Record>(&mut self, filter: Filter) -> StoreResult<u64> {
        let table = self.working.table_mut(R::TABLE);
        let before = table.len();
        table.retain(|_, row| !filter.matches(row));
        Ok((before - table.len()) as u64)
    }

    async fn adjust_stock_atomic(
        &mut self,
        variant: VariantId,
        delta: i64,
        underflow: Underflow,
    ) -> StoreResult<i64> {
        let row = self.variant_row(variant)?;
        let current = row.int("stock")?;
        let next = apply_delta(variant, current, delta, underflow).map_err(|e| match e {
            DomainError::InsufficientStock {
                variant,
                available,
                requested,
            } => StoreError::InsufficientStock {
                variant,
                available,
                requested,
            },
            DomainError::Validation(msg) => StoreError::OutOfRange(msg),
            other => StoreError::Backend(other.to_string()),
        })?;
        row.set("stock", next);
        Ok(next)
    }

    async fn set_stock(&mut self, variant: VariantId, value: i64) -> StoreResult<i64> {
        let row = self.variant_row(variant)?;
        row.set("stock", value);
        Ok(value)
    }

    async fn commit(self) -> StoreResult<()> {
        let Self { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use stockroom_core::{CategoryId, ProductId};
    use stockroom_products::{Category, CategoryDraft, CategoryGroup, VariantDraft};

    use super::*;

    fn test_variant(sku: &str, stock: i64) -> Variant {
        Variant::create(
            VariantId::new(),
            ProductId::new(),
            VariantDraft {
                size: String::new(),
                color: String::new(),
                price: 100,
                sku: sku.to_string(),
                image: String::new(),
                initial_stock: stock,
            },
        )
        .unwrap()
    }

    fn test_category(name: &str) -> Category {
        Category::create(
            CategoryId::new(),
            CategoryDraft {
                name: name.to_string(),
                group: CategoryGroup::Kids,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dropped_unit_of_work_rolls_back() {
        let store = InMemoryStore::new();
        let variant = test_variant("A-1", 5);

        {
            let mut tx = store.begin().await.unwrap();
            tx.create(&variant).await.unwrap();
        }

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get::<Variant>(variant.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn committed_changes_are_visible() {
        let store = InMemoryStore::new();
        let variant = test_variant("A-1", 5);

        let mut tx = store.begin().await.unwrap();
        tx.create(&variant).await.unwrap();
        assert_eq!(tx.adjust_stock_atomic(variant.id, 3, Underflow::Allow).await.unwrap(), 8);
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let stored = tx.get::<Variant>(variant.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 8);
    }

    #[tokio::test]
    async fn unique_columns_are_enforced() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create(&test_variant("DUP", 0)).await.unwrap();
        let err = tx.create(&test_variant("DUP", 0)).await.unwrap_err();
        assert_eq!(err, StoreError::UniqueViolation("product_variants.sku".to_string()));
    }

    #[tokio::test]
    async fn saving_a_record_does_not_conflict_with_itself() {
        let store = InMemoryStore::new();
        let mut variant = test_variant("SAME", 0);
        let mut tx = store.begin().await.unwrap();
        tx.create(&variant).await.unwrap();
        variant.price = 250;
        tx.save(&variant).await.unwrap();
        assert_eq!(tx.get::<Variant>(variant.id).await.unwrap().unwrap().price, 250);
    }

    #[tokio::test]
    async fn reject_underflow_leaves_stock_untouched() {
        let store = InMemoryStore::new();
        let variant = test_variant("A-1", 2);
        let mut tx = store.begin().await.unwrap();
        tx.create(&variant).await.unwrap();

        let err = tx
            .adjust_stock_atomic(variant.id, -3, Underflow::Reject)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::InsufficientStock {
                variant: variant.id,
                available: 2,
                requested: 3
            }
        );
        assert_eq!(tx.get::<Variant>(variant.id).await.unwrap().unwrap().stock, 2);
        assert_eq!(tx.adjust_stock_atomic(variant.id, -3, Underflow::ClampToZero).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stock_overflow_is_out_of_range() {
        let store = InMemoryStore::new();
        let variant = test_variant("A-1", i64::MAX);
        let mut tx = store.begin().await.unwrap();
        tx.create(&variant).await.unwrap();

        let err = tx
            .adjust_stock_atomic(variant.id, 1, Underflow::Allow)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange(_)));
        assert_eq!(tx.get::<Variant>(variant.id).await.unwrap().unwrap().stock, i64::MAX);
    }

    #[tokio::test]
    async fn stock_update_on_missing_variant_is_not_found() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx.set_stock(VariantId::new(), 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_filters_and_orders() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        for name in ["Shoes", "hats", "Shirts"] {
            tx.create(&test_category(name)).await.unwrap();
        }

        let all: Vec<Category> = tx.find(Filter::All).await.unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Shirts", "Shoes", "hats"]);

        let matching: Vec<Category> = tx.find(Filter::contains("name", "SH")).await.unwrap();
        assert_eq!(matching.len(), 2);

        let removed = tx
            .delete_where::<Category>(Filter::contains("name", "hat"))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(!tx.exists::<Category>(Filter::eq("name", "hats")).await.unwrap());
    }
}
