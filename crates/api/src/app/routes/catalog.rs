use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use stockroom_auth::Permission;
use stockroom_core::{CategoryId, ProductId, VariantId};
use stockroom_products::{CategoryDraft, ProductDraft, VariantChanges, VariantDraft};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/variants", get(list_variants).post(create_variant))
        .route(
            "/products/:id/variants/:variant_id",
            put(update_variant).delete(delete_variant),
        )
        .route("/variants", get(all_variants))
}

macro_rules! guard {
    ($principal:expr, $perm:expr) => {
        if let Err(denied) = crate::authz::require(&$principal, &$perm) {
            return denied;
        }
    };
}

macro_rules! id_or_400 {
    ($raw:expr, $what:literal) => {
        match errors::parse_id(&$raw, $what) {
            Ok(v) => v,
            Err(res) => return res,
        }
    };
}

// Categories

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_READ);
    match services.catalog.list_categories().await {
        Ok(categories) => dto::items(categories),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_READ);
    let id: CategoryId = id_or_400!(id, "category");
    match services.catalog.get_category(id).await {
        Ok(category) => dto::ok(category),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CategoryDraft>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    match services.catalog.create_category(body).await {
        Ok(category) => dto::created(category),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<CategoryDraft>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    let id: CategoryId = id_or_400!(id, "category");
    match services.catalog.update_category(id, body).await {
        Ok(category) => dto::ok(category),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    let id: CategoryId = id_or_400!(id, "category");
    match services.catalog.delete_category(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

// Products

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_READ);
    match services.catalog.list_products().await {
        Ok(products) => dto::items(products),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_READ);
    let id: ProductId = id_or_400!(id, "product");
    match services.catalog.get_product(id).await {
        Ok(detail) => dto::ok(detail),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ProductDraft>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    match services.catalog.create_product(body).await {
        Ok(product) => dto::created(product),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ProductDraft>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    let id: ProductId = id_or_400!(id, "product");
    match services.catalog.update_product(id, body).await {
        Ok(product) => dto::ok(product),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    let id: ProductId = id_or_400!(id, "product");
    match services.catalog.delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

// Variants

pub async fn list_variants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_READ);
    let id: ProductId = id_or_400!(id, "product");
    match services.catalog.list_variants(id).await {
        Ok(variants) => dto::items(variants),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn all_variants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_READ);
    match services.catalog.all_variants().await {
        Ok(variants) => dto::items(variants),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `initial_stock` in the body is recorded as an `adjust` ledger entry.
pub async fn create_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<VariantDraft>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    let id: ProductId = id_or_400!(id, "product");
    match services.catalog.create_variant(id, body).await {
        Ok(variant) => dto::created(variant),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, variant_id)): Path<(String, String)>,
    Json(body): Json<VariantChanges>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    let id: ProductId = id_or_400!(id, "product");
    let variant_id: VariantId = id_or_400!(variant_id, "variant");
    match services.catalog.update_variant(id, variant_id, body).await {
        Ok(variant) => dto::ok(variant),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, variant_id)): Path<(String, String)>,
) -> axum::response::Response {
    guard!(principal, Permission::CATALOG_WRITE);
    let id: ProductId = id_or_400!(id, "product");
    let variant_id: VariantId = id_or_400!(variant_id, "variant");
    match services.catalog.delete_variant(id, variant_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
