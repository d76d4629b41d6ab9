//! API error type mapped onto HTTP responses.
//!
//! Handlers return `Result<_, ApiError>`; the [`IntoResponse`] impl turns
//! the error into a JSON body of the shape `{"error": "..."}`, with extra
//! detail fields for quota and size violations so clients can show exact
//! numbers without parsing the message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use card_core::CardError;
use serde_json::json;

use crate::metrics;
use crate::store::StoreError;

/// Errors surfaced to API clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Identity headers are missing or malformed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The identity is valid but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The owner already holds the maximum number of cards.
    #[error("Card limit reached: {current} of {limit} cards used")]
    QuotaExceeded {
        /// Configured per-owner limit.
        limit: usize,
        /// Cards the owner currently holds.
        current: usize,
    },

    /// No record with the requested id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request failed validation.
    #[error("{0}")]
    Validation(String),

    /// The serialized document exceeds the configured size limit.
    #[error("Document is {measured_bytes} bytes, limit is {limit_bytes} bytes")]
    PayloadTooLarge {
        /// Exact byte length of the serialized document.
        measured_bytes: usize,
        /// Configured ceiling in bytes.
        limit_bytes: usize,
    },

    /// Unexpected server-side failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        metrics::record_api_error(status.as_u16());

        let mut body = json!({ "error": self.to_string() });
        match &self {
            Self::QuotaExceeded { limit, current } => {
                body["limit"] = json!(limit);
                body["current"] = json!(current);
            }
            Self::PayloadTooLarge {
                measured_bytes,
                limit_bytes,
            } => {
                body["measured_bytes"] = json!(measured_bytes);
                body["limit_bytes"] = json!(limit_bytes);
            }
            _ => {}
        }
        (status, Json(body)).into_response()
    }
}

impl From<CardError> for ApiError {
    fn from(err: CardError) -> Self {
        match err {
            CardError::PayloadTooLarge {
                measured_bytes,
                limit_bytes,
            } => Self::PayloadTooLarge {
                measured_bytes,
                limit_bytes,
            },
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::QuotaExceeded { limit, current } => {
                Self::QuotaExceeded { limit, current }
            }
            StoreError::Document(card_err) => Self::from(card_err),
            StoreError::Io(e) => Self::Internal(e.to_string()),
            StoreError::Serialization(e) => Self::Internal(e),
        }
    }
}
