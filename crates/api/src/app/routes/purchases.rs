use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};

use stockroom_auth::Permission;
use stockroom_core::PurchaseId;
use stockroom_purchasing::{PurchaseChanges, PurchaseDraft};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_purchases).post(create_purchase))
        .route("/:id", get(get_purchase).put(update_purchase).delete(delete_purchase))
}

pub async fn list_purchases(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_READ) {
        return denied;
    }
    match services.engine.list_purchases(None).await {
        Ok(purchases) => dto::items(purchases),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_READ) {
        return denied;
    }
    let id: PurchaseId = match errors::parse_id(&id, "purchase") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.get_purchase(id).await {
        Ok(purchase) => dto::ok(purchase),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Record a purchase and receive it into stock. The caller is recorded as
/// staff unless the payload names someone else.
pub async fn create_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(mut body): Json<PurchaseDraft>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_WRITE) {
        return denied;
    }
    body.staff_id.get_or_insert(principal.user_id());
    match services.engine.create_purchase(body).await {
        Ok(purchase) => dto::created(purchase),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<PurchaseChanges>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_WRITE) {
        return denied;
    }
    let id: PurchaseId = match errors::parse_id(&id, "purchase") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.update_purchase(id, body).await {
        Ok(purchase) => dto::ok(purchase),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `?cascade=true` also drops the purchase's ledger entries.
pub async fn delete_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::CascadeQuery>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_WRITE) {
        return denied;
    }
    let id: PurchaseId = match errors::parse_id(&id, "purchase") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.delete_purchase(id, query.mode()).await {
        Ok(purchase) => dto::ok(purchase),
        Err(e) => errors::service_error_to_response(e),
    }
}
