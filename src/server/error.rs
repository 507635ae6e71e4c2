//! HTTP mapping of the service's errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::error::{AuthError, ImportError, ProviderError, StoreError, ValidationError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Provider(ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Import cancelled")]
    Cancelled,

    #[error(transparent)]
    TimedOut(ImportError),
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Auth(e) => ApiError::Auth(e),
            other => ApiError::Provider(other),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Auth(e) => ApiError::Auth(e),
            ImportError::Provider(e) => ApiError::Provider(e),
            ImportError::Store(e) => ApiError::Store(e),
            ImportError::Cancelled => ApiError::Cancelled,
            timed_out @ ImportError::TimedOut(_) => ApiError::TimedOut(timed_out),
        }
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) | ApiError::Auth(AuthError::MissingCode) => {
                (StatusCode::BAD_REQUEST, "Invalid request")
            }
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, "Authorization required"),
            ApiError::Provider(_) => (StatusCode::BAD_GATEWAY, "Provider request failed"),
            ApiError::Store(_) => (StatusCode::BAD_GATEWAY, "Triple store request failed"),
            ApiError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "Import cancelled"),
            ApiError::TimedOut(_) => (StatusCode::GATEWAY_TIMEOUT, "Import timed out"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let details = self.to_string();
        if status.is_server_error() {
            warn!("{}: {}", message, details);
        }

        let body = Json(json!({
            "error": message,
            "details": details,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
