//! Inventory ledger endpoints: direct stock movements, the per-variant ledger
//! and the stock audit.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockroom_auth::Permission;
use stockroom_core::{InventoryLogId, VariantId};
use stockroom_inventory::InventoryLogDraft;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/inventory_logs", get(list_logs).post(create_log))
        .route(
            "/inventory_logs/:id",
            get(get_log).put(update_log_note).delete(delete_log),
        )
        .route("/variants/:id/ledger", get(variant_ledger))
        .route("/variants/:id/audit", get(variant_audit))
}

pub async fn list_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::INVENTORY_READ) {
        return denied;
    }
    match services.engine.list_inventory_logs().await {
        Ok(entries) => dto::items(entries),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_log(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::INVENTORY_READ) {
        return denied;
    }
    let id: InventoryLogId = match errors::parse_id(&id, "inventory log") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.get_inventory_log(id).await {
        Ok(entry) => dto::ok(entry),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_log(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<InventoryLogDraft>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::INVENTORY_WRITE) {
        return denied;
    }
    match services.engine.create_inventory_log(body).await {
        Ok(entry) => dto::created(entry),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Only the note can change; stock is never recomputed.
pub async fn update_log_note(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::NoteUpdate>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::INVENTORY_WRITE) {
        return denied;
    }
    let id: InventoryLogId = match errors::parse_id(&id, "inventory log") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.update_inventory_log_note(id, body.note).await {
        Ok(entry) => dto::ok(entry),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_log(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::INVENTORY_WRITE) {
        return denied;
    }
    let id: InventoryLogId = match errors::parse_id(&id, "inventory log") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.delete_inventory_log(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn variant_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::INVENTORY_READ) {
        return denied;
    }
    let id: VariantId = match errors::parse_id(&id, "variant") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.ledger_for_variant(id).await {
        Ok(entries) => dto::items(entries),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn variant_audit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::INVENTORY_READ) {
        return denied;
    }
    let id: VariantId = match errors::parse_id(&id, "variant") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.engine.audit_variant(id).await {
        Ok(audit) => dto::ok(audit),
        Err(e) => errors::service_error_to_response(e),
    }
}
