//! Infrastructure layer: persistence, the reconciliation engine, application
//! services and process configuration.

pub mod config;
pub mod error;
pub mod mailer;
pub mod reconciliation;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AppConfig, BootstrapAdmin, ConfigError};
pub use error::{ServiceError, ServiceResult};
pub use mailer::{Mail, MailError, Mailer, OutboxMailer, TracingMailer};
pub use reconciliation::{DeleteMode, LedgerPolicy, ReconciliationEngine};
pub use services::Services;
pub use store::{AppStore, InMemoryStore, PostgresStore, Store, StoreError, UnitOfWork};
