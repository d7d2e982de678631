//! Request/response shapes that are not domain types themselves.
//!
//! Most write payloads deserialize straight into the domain drafts
//! (`PurchaseDraft`, `VariantDraft`, ...); only query strings and a few
//! envelopes live here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use stockroom_infra::DeleteMode;

/// `{"items": [...]}` list envelope with 200.
pub fn items<T: Serialize>(items: Vec<T>) -> Response {
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub fn ok<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

pub fn created<T: Serialize>(body: T) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

pub fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CascadeQuery {
    #[serde(default)]
    pub cascade: Option<bool>,
}

impl CascadeQuery {
    /// `None` defers to the configured ledger policy.
    pub fn mode(&self) -> Option<DeleteMode> {
        self.cascade.map(|cascade| {
            if cascade {
                DeleteMode::Cascade
            } else {
                DeleteMode::Retain
            }
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmQuery {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteUpdate {
    #[serde(default)]
    pub note: String,
}
