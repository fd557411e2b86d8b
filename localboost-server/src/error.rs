//! API error taxonomy.
//!
//! Every failure is one of a closed set of kinds, each with its own status
//! code, serialized as `{"success": false, "error": ..., "kind": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing field, malformed body, or a sign-up the identity provider refused.
    #[error("{0}")]
    Validation(String),

    /// Identity provider refused the credentials.
    #[error("{0}")]
    ProviderAuth(String),

    /// A provider could not be reached or is not configured.
    #[error("{0}")]
    ProviderUnavailable(String),

    /// Generation provider answered with an error or no text.
    #[error("{0}")]
    GenerationFailed(String),

    /// Text was generated but the campaign record was not stored.
    #[error("{0}")]
    StorageWriteFailed(String),

    #[error("{0}")]
    StorageReadFailed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ProviderAuth(_) => StatusCode::UNAUTHORIZED,
            ApiError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::StorageWriteFailed(_) | ApiError::StorageReadFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::ProviderAuth(_) => "provider_auth",
            ApiError::ProviderUnavailable(_) => "provider_unavailable",
            ApiError::GenerationFailed(_) => "generation_failed",
            ApiError::StorageWriteFailed(_) => "storage_write_failed",
            ApiError::StorageReadFailed(_) => "storage_read_failed",
        }
    }

    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": self.to_string(),
            "kind": self.kind(),
        })
    }

    pub fn into_parts(self) -> (StatusCode, serde_json::Value) {
        (self.status(), self.to_body())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_parts();
        (status, Json(body)).into_response()
    }
}
