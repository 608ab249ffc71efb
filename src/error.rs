// HTTP API error types
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::api::envelope::Envelope;
use crate::database::store::StoreError;

/// Request failures, in validation order. Each becomes an error envelope;
/// none of them stop the server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid content-type: {0}")]
    InvalidContentType(String),

    /// Any method other than POST.
    #[error("invalid request")]
    InvalidRequest,

    /// Body failed to parse as JSON.
    #[error("invalid request: {0}")]
    InvalidBody(String),

    #[error("invalid api_key")]
    InvalidApiKey,

    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Store failure; the real error was already logged.
    #[error("database error")]
    Database,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        // Don't expose internal SQL errors to clients
        tracing::error!("catalog fetch failed: {err}");
        ApiError::Database
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Every outcome is HTTP 200; the envelope status field is the only
        // success/failure signal clients consume.
        Json(Envelope::error(self.to_string())).into_response()
    }
}
