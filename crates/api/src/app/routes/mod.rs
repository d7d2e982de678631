use axum::{routing::get, Router};

pub mod auth;
pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod purchases;
pub mod search;
pub mod suppliers;
pub mod system;
pub mod users;

/// Router for every authenticated `/admin` endpoint.
pub fn admin_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/search", get(search::search))
        .merge(users::router())
        .nest("/suppliers", suppliers::router())
        .nest("/purchases", purchases::router())
        .merge(catalog::router())
        .merge(inventory::router())
        .nest("/orders", orders::router())
}
