//! Process configuration read from the environment.

use std::net::SocketAddr;

use stockroom_observability::{LogConfig, LogFormat};
use thiserror::Error;

use crate::reconciliation::LedgerPolicy;

const DEV_JWT_SECRET: &str = "stockroom-dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not valid: {message}")]
    Invalid { name: &'static str, message: String },

    #[error("{0} must be set together with {1}")]
    Incomplete(&'static str, &'static str),
}

impl ConfigError {
    fn invalid(name: &'static str, message: impl ToString) -> Self {
        Self::Invalid {
            name,
            message: message.to_string(),
        }
    }
}

/// Credentials for the admin account created at startup when missing.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    /// Postgres connection string. The in-memory store is used when absent.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// Base URL used to build links in outgoing mail.
    pub backend_url: String,
    pub ledger_policy: LedgerPolicy,
    pub log: LogConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind", &self.bind)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("token_ttl_minutes", &self.token_ttl.num_minutes())
            .field("backend_url", &self.backend_url)
            .field("ledger_policy", &self.ledger_policy)
            .field("log", &self.log)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// True when `JWT_SECRET` was not provided.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind = match var("STOCKROOM_BIND") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("STOCKROOM_BIND", e))?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::invalid("DATABASE_MAX_CONNECTIONS", "expected a positive integer"))?,
            None => 10,
        };

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let token_ttl_minutes = match var("TOKEN_TTL_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::invalid("TOKEN_TTL_MINUTES", "expected a positive integer"))?,
            None => 60,
        };

        let backend_url = var("BACKEND_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let ledger_policy = match var("STOCKROOM_LEDGER_CASCADE")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            None => LedgerPolicy::default(),
            Some("1" | "true" | "yes") => LedgerPolicy::cascading(),
            Some("0" | "false" | "no") => LedgerPolicy::default(),
            Some(other) => {
                return Err(ConfigError::invalid(
                    "STOCKROOM_LEDGER_CASCADE",
                    format!("expected a boolean, got '{other}'"),
                ));
            }
        };

        let log = LogConfig {
            format: match var("STOCKROOM_LOG_FORMAT") {
                Some(raw) => raw
                    .parse::<LogFormat>()
                    .map_err(|e| ConfigError::invalid("STOCKROOM_LOG_FORMAT", e))?,
                None => LogFormat::default(),
            },
            ..LogConfig::default()
        };

        let bootstrap_admin = match (var("STOCKROOM_ADMIN_EMAIL"), var("STOCKROOM_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete("STOCKROOM_ADMIN_EMAIL", "STOCKROOM_ADMIN_PASSWORD"));
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete("STOCKROOM_ADMIN_PASSWORD", "STOCKROOM_ADMIN_EMAIL"));
            }
        };

        Ok(Self {
            bind,
            database_url: var("DATABASE_URL"),
            database_max_connections,
            jwt_secret,
            token_ttl: chrono::Duration::minutes(token_ttl_minutes),
            backend_url,
            ledger_policy,
            log,
            bootstrap_admin,
        })
    }
}
