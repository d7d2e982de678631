use std::sync::Arc;

use axum::extract::{Extension, Query};

use stockroom_auth::Permission;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub async fn search(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    if let Err(denied) = crate::authz::require(&principal, &Permission::SEARCH) {
        return denied;
    }

    match services.search.search(&query.q).await {
        Ok(hits) => dto::items(hits),
        Err(e) => errors::service_error_to_response(e),
    }
}
