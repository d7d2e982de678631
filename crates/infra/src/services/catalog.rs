use chrono::Utc;
use tracing::{info, instrument};

use stockroom_core::{CategoryId, ProductId, VariantId};
use stockroom_products::{
    Category, CategoryDraft, Product, ProductDetail, ProductDraft, Variant, VariantChanges, VariantDraft,
};

use crate::error::{ServiceError, ServiceResult};
use crate::reconciliation::ReconciliationEngine;
use crate::store::{Filter, Store, UnitOfWork, Value};

/// Categories, products and variants. Variant writes go through the
/// reconciliation engine because they touch the ledger.
#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
    engine: ReconciliationEngine<S>,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S, engine: ReconciliationEngine<S>) -> Self {
        Self { store, engine }
    }

    // Categories

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find(Filter::All).await?)
    }

    pub async fn get_category(&self, id: CategoryId) -> ServiceResult<Category> {
        let mut tx = self.store.begin().await?;
        Ok(tx.require::<Category>(id).await?)
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    pub async fn create_category(&self, draft: CategoryDraft) -> ServiceResult<Category> {
        let category = Category::create(CategoryId::new(), draft, Utc::now())?;

        let mut tx = self.store.begin().await?;
        ensure_category_name_free(&mut tx, &category).await?;
        tx.create(&category).await?;
        tx.commit().await?;

        info!(category_id = %category.id, "category created");
        Ok(category)
    }

    pub async fn update_category(&self, id: CategoryId, draft: CategoryDraft) -> ServiceResult<Category> {
        let mut tx = self.store.begin().await?;
        let mut category = tx.require_for_update::<Category>(id).await?;
        category.revise(draft)?;
        ensure_category_name_free(&mut tx, &category).await?;
        tx.save(&category).await?;
        tx.commit().await?;
        Ok(category)
    }

    pub async fn delete_category(&self, id: CategoryId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        tx.require_for_update::<Category>(id).await?;
        if tx
            .exists::<Product>(Filter::eq("category_id", Value::id(id)))
            .await?
        {
            return Err(ServiceError::conflict(format!("category {id} still has products")));
        }
        tx.delete::<Category>(id).await?;
        tx.commit().await?;
        info!(category_id = %id, "category deleted");
        Ok(())
    }

    // Products

    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find(Filter::All).await?)
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<ProductDetail> {
        let mut tx = self.store.begin().await?;
        let product = tx.require::<Product>(id).await?;
        let variants = tx
            .find::<Variant>(Filter::eq("product_id", Value::id(id)))
            .await?;
        Ok(ProductDetail { product, variants })
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    pub async fn create_product(&self, draft: ProductDraft) -> ServiceResult<Product> {
        let product = Product::create(ProductId::new(), draft, Utc::now())?;

        let mut tx = self.store.begin().await?;
        tx.require::<Category>(product.category_id).await?;
        tx.create(&product).await?;
        tx.commit().await?;

        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: ProductId, draft: ProductDraft) -> ServiceResult<Product> {
        let mut tx = self.store.begin().await?;
        let mut product = tx.require_for_update::<Product>(id).await?;
        product.revise(draft)?;
        tx.require::<Category>(product.category_id).await?;
        tx.save(&product).await?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        tx.require_for_update::<Product>(id).await?;
        if tx
            .exists::<Variant>(Filter::eq("product_id", Value::id(id)))
            .await?
        {
            return Err(ServiceError::conflict(format!("product {id} still has variants")));
        }
        tx.delete::<Product>(id).await?;
        tx.commit().await?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    // Variants

    pub async fn list_variants(&self, product: ProductId) -> ServiceResult<Vec<Variant>> {
        let mut tx = self.store.begin().await?;
        tx.require::<Product>(product).await?;
        Ok(tx
            .find(Filter::eq("product_id", Value::id(product)))
            .await?)
    }

    pub async fn all_variants(&self) -> ServiceResult<Vec<Variant>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.find(Filter::All).await?)
    }

    pub async fn create_variant(&self, product: ProductId, draft: VariantDraft) -> ServiceResult<Variant> {
        self.engine.create_variant(product, draft).await
    }

    pub async fn update_variant(
        &self,
        product: ProductId,
        id: VariantId,
        changes: VariantChanges,
    ) -> ServiceResult<Variant> {
        self.engine.update_variant(product, id, changes).await
    }

    pub async fn delete_variant(&self, product: ProductId, id: VariantId) -> ServiceResult<()> {
        self.engine.delete_variant(product, id).await
    }
}

async fn ensure_category_name_free<U: UnitOfWork>(tx: &mut U, category: &Category) -> ServiceResult<()> {
    let taken = Filter::eq("name", category.name.as_str()).and(Filter::ne("id", Value::id(category.id)));
    if tx.exists::<Category>(taken).await? {
        return Err(ServiceError::conflict(format!(
            "category '{}' already exists",
            category.name
        )));
    }
    Ok(())
}
