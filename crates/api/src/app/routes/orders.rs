use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::{get, patch},
    Json, Router,
};

use stockroom_auth::Permission;
use stockroom_core::OrderId;
use stockroom_sales::{OrderDraft, OrderStatus, OrderStatusUpdate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/:id", get(get_order))
        .route("/:id/status", patch(update_status))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::StatusQuery>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::ORDERS_READ) {
        return denied;
    }
    let status = match query.status.as_deref().map(str::parse::<OrderStatus>).transpose() {
        Ok(s) => s,
        Err(e) => return errors::service_error_to_response(e.into()),
    };
    match services.orders.list(status).await {
        Ok(orders) => dto::items(orders),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::ORDERS_READ) {
        return denied;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.orders.detail(id).await {
        Ok(detail) => dto::ok(detail),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Every line is sold from stock; one short line rejects the whole order.
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<OrderDraft>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::ORDERS_WRITE) {
        return denied;
    }
    match services.orders.place(body).await {
        Ok(detail) => dto::created(detail),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(mut body): Json<OrderStatusUpdate>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::ORDERS_WRITE) {
        return denied;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(res) => return res,
    };
    body.staff_id.get_or_insert(principal.user_id());
    match services.orders.update_status(id, body).await {
        Ok(order) => dto::ok(order),
        Err(e) => errors::service_error_to_response(e),
    }
}
