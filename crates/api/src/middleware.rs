use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use stockroom_auth::TokenIssuer;

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenIssuer,
}

/// Require a valid bearer token from a back-office account and attach the
/// caller as a [`PrincipalContext`] extension.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Some(t) => t,
        None => return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing bearer token"),
    };

    let claims = match state.tokens.verify_access(token, Utc::now()) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "access token rejected");
            return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid or expired token");
        }
    };

    if !claims.role.is_back_office() {
        return errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("role '{}' has no back-office access", claims.role),
        );
    }

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.role));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
