use std::sync::Arc;

use anyhow::Context;

use stockroom_infra::{AppConfig, TracingMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    stockroom_observability::init(&config.log);
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using the development secret");
    }

    let store = stockroom_api::app::services::connect_store(&config)
        .await
        .context("failed to open the store")?;
    let services = stockroom_api::app::services::build_services(store, &config, Arc::new(TracingMailer));

    if let Some(admin) = &config.bootstrap_admin {
        let user = services
            .accounts
            .ensure_admin(&admin.email, &admin.password)
            .await
            .context("failed to create the bootstrap admin")?;
        tracing::info!(user_id = %user.id, email = %user.email, "admin account ready");
    }

    let app = stockroom_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(addr = %listener.local_addr()?, ?config, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
