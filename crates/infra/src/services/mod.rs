//! Application services over a [`Store`]. Anything that moves stock is
//! delegated to the [`ReconciliationEngine`].

pub mod accounts;
pub mod catalog;
pub mod orders;
pub mod search;
pub mod suppliers;

use std::sync::Arc;

use stockroom_auth::{PasswordHasher, TokenIssuer};

use crate::mailer::Mailer;
use crate::reconciliation::{LedgerPolicy, ReconciliationEngine};
use crate::store::Store;

pub use accounts::{AccountService, ClientInfo, Credentials, LoginOutcome, Registration};
pub use catalog::CatalogService;
pub use orders::OrderService;
pub use search::{SearchHit, SearchKind, SearchService};
pub use suppliers::{SupplierDetail, SupplierService};

/// Everything the HTTP layer needs, wired against one store.
#[derive(Clone)]
pub struct Services<S: Store> {
    pub engine: ReconciliationEngine<S>,
    pub catalog: CatalogService<S>,
    pub suppliers: SupplierService<S>,
    pub orders: OrderService<S>,
    pub accounts: AccountService<S>,
    pub search: SearchService<S>,
}

impl<S: Store> Services<S> {
    pub fn new(
        store: S,
        policy: LedgerPolicy,
        tokens: TokenIssuer,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        backend_url: impl Into<String>,
    ) -> Self {
        let engine = ReconciliationEngine::new(store.clone(), policy);
        Self {
            catalog: CatalogService::new(store.clone(), engine.clone()),
            suppliers: SupplierService::new(store.clone()),
            orders: OrderService::new(store.clone(), engine.clone()),
            accounts: AccountService::new(store.clone(), tokens, hasher, mailer, backend_url),
            search: SearchService::new(store),
            engine,
        }
    }
}
