use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use stockroom_auth::Permission;
use stockroom_core::{PurchaseId, SupplierId};
use stockroom_parties::SupplierDraft;
use stockroom_purchasing::{PurchaseChanges, PurchaseDraft};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/:id", get(get_supplier).put(update_supplier).delete(delete_supplier))
        .route("/:id/purchases", get(list_supplier_purchases).post(create_supplier_purchase))
        .route(
            "/:id/purchases/:purchase_id",
            put(update_supplier_purchase).delete(delete_supplier_purchase),
        )
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::SUPPLIERS_READ) {
        return denied;
    }
    match services.suppliers.list().await {
        Ok(suppliers) => dto::items(suppliers),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::SUPPLIERS_READ) {
        return denied;
    }
    let id: SupplierId = match errors::parse_id(&id, "supplier") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.suppliers.detail(id).await {
        Ok(detail) => dto::ok(detail),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<SupplierDraft>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::SUPPLIERS_WRITE) {
        return denied;
    }
    match services.suppliers.create(body).await {
        Ok(supplier) => dto::created(supplier),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<SupplierDraft>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::SUPPLIERS_WRITE) {
        return denied;
    }
    let id: SupplierId = match errors::parse_id(&id, "supplier") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.suppliers.update(id, body).await {
        Ok(supplier) => dto::ok(supplier),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::SUPPLIERS_WRITE) {
        return denied;
    }
    let id: SupplierId = match errors::parse_id(&id, "supplier") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.suppliers.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

// Supplier-scoped purchases

pub async fn list_supplier_purchases(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_READ) {
        return denied;
    }
    let id: SupplierId = match errors::parse_id(&id, "supplier") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.list_purchases(Some(id)).await {
        Ok(purchases) => dto::items(purchases),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_supplier_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(mut body): Json<PurchaseDraft>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_WRITE) {
        return denied;
    }
    let id: SupplierId = match errors::parse_id(&id, "supplier") {
        Ok(v) => v,
        Err(res) => return res,
    };
    body.staff_id.get_or_insert(principal.user_id());
    match services.engine.create_supplier_purchase(id, body).await {
        Ok(purchase) => dto::created(purchase),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_supplier_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, purchase_id)): Path<(String, String)>,
    Json(body): Json<PurchaseChanges>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_WRITE) {
        return denied;
    }
    let (id, purchase_id) = match scoped_ids(&id, &purchase_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.update_supplier_purchase(id, purchase_id, body).await {
        Ok(purchase) => dto::ok(purchase),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_supplier_purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, purchase_id)): Path<(String, String)>,
    Query(query): Query<dto::CascadeQuery>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::PURCHASES_WRITE) {
        return denied;
    }
    let (id, purchase_id) = match scoped_ids(&id, &purchase_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services
        .engine
        .delete_supplier_purchase(id, purchase_id, query.mode())
        .await
    {
        Ok(purchase) => dto::ok(purchase),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn scoped_ids(supplier: &str, purchase: &str) -> Result<(SupplierId, PurchaseId), axum::response::Response> {
    Ok((
        errors::parse_id(supplier, "supplier")?,
        errors::parse_id(purchase, "purchase")?,
    ))
}
