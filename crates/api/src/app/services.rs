//! Service wiring: pick a store backend from the configuration and build the
//! application services on top of it.

use std::sync::Arc;

use tracing::info;

use stockroom_auth::{Pbkdf2PasswordHasher, TokenIssuer};
use stockroom_infra::{
    AppConfig, AppStore, InMemoryStore, LedgerPolicy, Mailer, PostgresStore, Services, StoreError,
    TracingMailer,
};

pub type AppServices = Services<AppStore>;

/// Postgres when `DATABASE_URL` is set (migrations are applied), in-memory
/// otherwise.
pub async fn connect_store(config: &AppConfig) -> Result<AppStore, StoreError> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.database_max_connections).await?;
            store.migrate().await?;
            info!(backend = "postgres", "store ready");
            Ok(AppStore::Postgres(store))
        }
        None => {
            info!(backend = "memory", "store ready; data is lost on restart");
            Ok(AppStore::Memory(InMemoryStore::new()))
        }
    }
}

pub fn build_services(store: AppStore, config: &AppConfig, mailer: Arc<dyn Mailer>) -> AppServices {
    Services::new(
        store,
        config.ledger_policy,
        TokenIssuer::new(&config.jwt_secret, config.token_ttl),
        Arc::new(Pbkdf2PasswordHasher::default()),
        mailer,
        config.backend_url.clone(),
    )
}

/// In-memory services with default settings and a cheap password hash; used
/// by tests and local runs.
pub fn in_memory_services(jwt_secret: &str, policy: LedgerPolicy) -> AppServices {
    Services::new(
        AppStore::Memory(InMemoryStore::new()),
        policy,
        TokenIssuer::new(jwt_secret, chrono::Duration::minutes(60)),
        Arc::new(Pbkdf2PasswordHasher::with_rounds(1_000)),
        Arc::new(TracingMailer),
        "http://localhost:8080",
    )
}
