use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use stockroom_auth::{Permission, UserChanges};
use stockroom_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", put(update_user).delete(delete_user))
        .route("/logs", get(login_logs))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::USERS_MANAGE) {
        return denied;
    }
    match services.accounts.list_users().await {
        Ok(users) => dto::items(users),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UserChanges>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::USERS_MANAGE) {
        return denied;
    }
    let id: UserId = match errors::parse_id(&id, "user") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.accounts.update_user(id, body).await {
        Ok(user) => dto::ok(user),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::USERS_MANAGE) {
        return denied;
    }
    let id: UserId = match errors::parse_id(&id, "user") {
        Ok(v) => v,
        Err(res) => return res,
    };
    if id == principal.user_id() {
        return errors::json_error(StatusCode::CONFLICT, "conflict", "cannot delete your own account");
    }
    match services.accounts.delete_user(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::USERS_MANAGE) {
        return denied;
    }
    match services.accounts.login_logs().await {
        Ok(logs) => dto::items(logs),
        Err(e) => errors::service_error_to_response(e),
    }
}
