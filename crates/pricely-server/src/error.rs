//! The HTTP-facing response envelope and error mapping.
//!
//! Success bodies use `{"status": "success", "data": ...}`; errors use
//! `{"status": "error", "message": ..., "request_id": ...}`. Unexpected
//! failures never leak internal error text to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { status: "success", data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// This crate's single error vocabulary for the HTTP surface. Wraps both
/// `EngineError` and `ContentError` directly (see
/// `pricely_orchestrator::EngineError`'s doc comment for why neither of
/// those crates can do that themselves).
#[derive(Debug)]
pub struct ApiError {
    pub request_id: String,
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(request_id: impl Into<String>, status: StatusCode, message: impl Into<String>) -> Self {
        Self { request_id: request_id.into(), status, message: message.into() }
    }

    pub fn bad_request(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(request_id: impl Into<String>) -> Self {
        Self::new(request_id, StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn not_found(request_id: impl Into<String>) -> Self {
        Self::new(request_id, StatusCode::NOT_FOUND, "not found")
    }

    pub fn not_implemented(request_id: impl Into<String>) -> Self {
        Self::new(request_id, StatusCode::NOT_IMPLEMENTED, "not implemented")
    }

    /// Generic 500: per §7, unexpected errors never leak upstream text.
    pub fn internal(request_id: impl Into<String>) -> Self {
        Self::new(request_id, StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }

    pub fn from_content_error(request_id: impl Into<String>, error: &pricely_content::ContentError) -> Self {
        let request_id = request_id.into();
        match error {
            pricely_content::ContentError::NotFound => Self::not_found(request_id),
            pricely_content::ContentError::Unauthorized => Self::unauthorized(request_id),
            pricely_content::ContentError::UnknownTable(table) => {
                Self::bad_request(request_id, format!("unknown table: {table}"))
            }
            pricely_content::ContentError::Store { reason } => {
                tracing::error!(reason, "content store error");
                Self::internal(request_id)
            }
        }
    }

    pub fn from_engine_error(request_id: impl Into<String>, error: &pricely_orchestrator::EngineError) -> Self {
        let request_id = request_id.into();
        tracing::error!(error = %error, "engine call failed");
        match error {
            pricely_orchestrator::EngineError::Geocode(_) | pricely_orchestrator::EngineError::Embedding(_) => {
                Self::internal(request_id)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: Value = serde_json::json!({
            "status": "error",
            "message": self.message,
            "request_id": self.request_id,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_401() {
        let err = ApiError::unauthorized("req-1");
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn content_not_found_maps_to_404() {
        let err = ApiError::from_content_error("req-1", &pricely_content::ContentError::NotFound);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn content_store_error_maps_to_generic_500_message() {
        let err = ApiError::from_content_error(
            "req-1",
            &pricely_content::ContentError::Store { reason: "connection refused".to_string() },
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");
    }
}
