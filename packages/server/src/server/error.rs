//! API error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domains::properties::geocode::GeocodeError;

/// Errors surfaced by the REST edge.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The listing write was aborted because its address could not be
    /// geocoded. Distinct from NotFound so clients can tell a bad address
    /// from a missing listing.
    #[error("Could not save listing: address could not be located")]
    AddressNotLocated(#[source] GeocodeError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GeocodeError> for ApiError {
    fn from(err: GeocodeError) -> Self {
        ApiError::AddressNotLocated(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AddressNotLocated(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        // Client mistakes answer as "fail", server faults as "error"
        let kind = if status.is_server_error() { "error" } else { "fail" };
        let body = json!({
            "status": kind,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
