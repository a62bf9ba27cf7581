//! API models for the relay HTTP surface

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Message returned for internal failures, never derived from device data
const INTERNAL_ERROR_MESSAGE: &str = "Internal error while relaying the device request";

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Generic error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

impl From<&RelayError> for ErrorResponse {
    fn from(err: &RelayError) -> Self {
        let message = if err.is_internal() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            err.to_string()
        };

        let mut response = ErrorResponse::new(err.code(), message);
        if let RelayError::PayloadTooLarge { limit } = err {
            response.error.details = Some(serde_json::json!({ "limit_bytes": limit }));
        }
        response
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status: StatusCode = self.status_code();
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
