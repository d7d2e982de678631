//! Fixture seeding shared by the in-crate tests.

use chrono::Utc;

use stockroom_auth::{NewUser, User, UserRole};
use stockroom_core::{CategoryId, ProductId, SupplierId, UserId, VariantId};
use stockroom_inventory::InventoryLogEntry;
use stockroom_parties::{Supplier, SupplierDraft};
use stockroom_products::{Category, CategoryDraft, CategoryGroup, Product, ProductDraft, Variant, VariantDraft};

use crate::reconciliation::{LedgerPolicy, ReconciliationEngine};
use crate::store::{Filter, InMemoryStore, Store, UnitOfWork, Value};

pub(crate) struct Fixture {
    pub store: InMemoryStore,
    pub engine: ReconciliationEngine<InMemoryStore>,
    pub supplier: SupplierId,
    pub product: ProductId,
    pub customer: UserId,
    pub staff: UserId,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_policy(LedgerPolicy::default()).await
    }

    pub async fn with_policy(policy: LedgerPolicy) -> Self {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let mut tx = store.begin().await.unwrap();

        let category = Category::create(
            CategoryId::new(),
            CategoryDraft {
                name: "Shirts".into(),
                group: CategoryGroup::Men,
            },
            now,
        )
        .unwrap();
        tx.create(&category).await.unwrap();

        let product = Product::create(
            ProductId::new(),
            ProductDraft {
                name: "Oxford shirt".into(),
                description: String::new(),
                category_id: category.id,
                image: String::new(),
                price: 2_500,
                discount: 0,
            },
            now,
        )
        .unwrap();
        tx.create(&product).await.unwrap();

        let supplier = Supplier::create(
            SupplierId::new(),
            SupplierDraft {
                name: "Acme Textiles".into(),
                ..SupplierDraft::default()
            },
            now,
        )
        .unwrap();
        tx.create(&supplier).await.unwrap();

        let customer = user(&mut tx, "carol", UserRole::Customer).await;
        let staff = user(&mut tx, "sam", UserRole::Staff).await;
        tx.commit().await.unwrap();

        Self {
            engine: ReconciliationEngine::new(store.clone(), policy),
            store,
            supplier: supplier.id,
            product: product.id,
            customer,
            staff,
        }
    }

    /// Insert a variant with the given stock straight into the store,
    /// bypassing the ledger.
    pub async fn variant(&self, sku: &str, stock: i64) -> VariantId {
        let mut variant = Variant::create(
            VariantId::new(),
            self.product,
            VariantDraft {
                sku: sku.into(),
                price: 1_000,
                ..VariantDraft::default()
            },
        )
        .unwrap();
        variant.stock = stock;

        let mut tx = self.store.begin().await.unwrap();
        tx.create(&variant).await.unwrap();
        tx.commit().await.unwrap();
        variant.id
    }

    pub async fn stock(&self, variant: VariantId) -> i64 {
        let mut tx = self.store.begin().await.unwrap();
        tx.require::<Variant>(variant).await.unwrap().stock
    }

    /// Ledger of one variant, most recent first.
    pub async fn ledger(&self, variant: VariantId) -> Vec<InventoryLogEntry> {
        let mut tx = self.store.begin().await.unwrap();
        tx.find(Filter::eq("variant_id", Value::id(variant)))
            .await
            .unwrap()
    }
}

async fn user<U: UnitOfWork>(tx: &mut U, name: &str, role: UserRole) -> UserId {
    let user = User::create(
        UserId::new(),
        NewUser {
            username: name.into(),
            email: format!("{name}@shop.example"),
            password_hash: "pbkdf2-sha256$1$salt$digest".into(),
            role,
            phone: String::new(),
            address: String::new(),
        },
        Utc::now(),
    )
    .unwrap();
    tx.create(&user).await.unwrap();
    user.id
}
