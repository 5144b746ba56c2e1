use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Request-level failures. Validation and configuration problems never touch
/// the store; store failures on the write path fail the whole request (an
/// event that cannot be durably counted must not be reported as counted).
/// Read-path store failures are absorbed inside the reporting module and
/// never surface here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Redis not configured")]
    NotConfigured,

    #[error("{0}")]
    Validation(&'static str),

    #[error("Internal server error")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(ref source) => {
                error!("Store failure on write path: {source}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
