//! Public account endpoints: registration, e-mail confirmation, login.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};

use stockroom_infra::services::{ClientInfo, Credentials, Registration};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/confirm", get(confirm))
        .route("/login", post(login))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Registration>,
) -> axum::response::Response {
    match services.accounts.register(body).await {
        Ok(()) => dto::message(StatusCode::ACCEPTED, "Please check your email to confirm"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ConfirmQuery>,
) -> axum::response::Response {
    match services.accounts.confirm(&query.token).await {
        Ok(user) => dto::created(user),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<Credentials>,
) -> axum::response::Response {
    match services.accounts.login(body, client_info(&headers)).await {
        Ok(outcome) => dto::ok(outcome),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let forwarded = header("x-forwarded-for");
    let ip = forwarded
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| header("x-real-ip"));

    ClientInfo {
        ip,
        user_agent: header("user-agent"),
    }
}
