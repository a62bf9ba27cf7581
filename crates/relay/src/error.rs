//! Relay error types

use axum::http::StatusCode;
use thiserror::Error;

/// Failures surfaced by a device transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The transport does not know the device
    #[error("Device not found: {0}")]
    NotFound(String),

    /// The device (or the bridge in front of it) could not be reached
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// The transport gave up waiting for the device
    #[error("Device request timed out: {0}")]
    Timeout(String),

    /// The device answered with a failure of its own
    #[error("Device error: {0}")]
    Failure(String),
}

/// Failures surfaced by blob storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob url: {0}")]
    InvalidUrl(String),

    #[error("Blob unavailable: {0}")]
    Unavailable(String),
}

/// Errors produced while relaying a request to a device
#[derive(Error, Debug)]
pub enum RelayError {
    /// Empty or missing device identifier
    #[error("Device id must not be empty")]
    InvalidDeviceId,

    /// Required remote-query header absent, empty or not UTF-8
    #[error("Missing required header 'Remote-Query'")]
    MissingRemoteQuery,

    /// The request body could not be read
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// The request body exceeded the route's ceiling
    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    /// Verb the relay does not route
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    /// The transport returned an answer outside the relay contract
    #[error("Unsupported response type: {0}")]
    UnsupportedResponse(String),

    /// The device reported a status code HTTP cannot carry
    #[error("Invalid device status code: {0}")]
    InvalidStatus(u16),
}

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Status the HTTP boundary answers with
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidDeviceId
            | RelayError::MissingRemoteQuery
            | RelayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Device(DeviceError::NotFound(_)) => StatusCode::NOT_FOUND,
            RelayError::Device(DeviceError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Device(_) => StatusCode::BAD_GATEWAY,
            RelayError::Blob(BlobError::NotFound(_)) => StatusCode::NOT_FOUND,
            RelayError::Blob(_) => StatusCode::BAD_GATEWAY,
            RelayError::UnsupportedResponse(_)
            | RelayError::InvalidStatus(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for the JSON error body
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::InvalidDeviceId => "INVALID_DEVICE_ID",
            RelayError::MissingRemoteQuery => "MISSING_REMOTE_QUERY",
            RelayError::InvalidBody(_) => "INVALID_BODY",
            RelayError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            RelayError::UnsupportedMethod(_) => "METHOD_NOT_ALLOWED",
            RelayError::Device(DeviceError::NotFound(_)) => "DEVICE_NOT_FOUND",
            RelayError::Device(DeviceError::Unreachable(_)) => "DEVICE_UNREACHABLE",
            RelayError::Device(DeviceError::Timeout(_)) => "DEVICE_TIMEOUT",
            RelayError::Device(DeviceError::Failure(_)) => "DEVICE_ERROR",
            RelayError::Blob(BlobError::NotFound(_)) => "BLOB_NOT_FOUND",
            RelayError::Blob(_) => "BLOB_UNAVAILABLE",
            RelayError::UnsupportedResponse(_)
            | RelayError::InvalidStatus(_) => "INTERNAL_ERROR",
        }
    }

    /// Contract violations and defects, as opposed to client or upstream failures
    pub fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(RelayError::InvalidDeviceId.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::MissingRemoteQuery.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::PayloadTooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_upstream_errors_map_to_gateway_statuses() {
        let err: RelayError = DeviceError::Unreachable("offline".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "DEVICE_UNREACHABLE");

        let err: RelayError = DeviceError::Timeout("30s".into()).into();
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let err: RelayError = BlobError::NotFound("u".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "BLOB_NOT_FOUND");
    }

    #[test]
    fn test_unsupported_response_is_internal() {
        let err = RelayError::UnsupportedResponse("stream".into());
        assert!(err.is_internal());
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(!RelayError::MissingRemoteQuery.is_internal());
    }

    #[test]
    fn test_only_contract_violations_are_internal() {
        let internal = [RelayError::UnsupportedResponse("ws".into()), RelayError::InvalidStatus(1000)];
        for err in internal {
            assert!(err.is_internal(), "{err}");
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
        let err: RelayError = DeviceError::Failure("boom".into()).into();
        assert!(!err.is_internal());
    }

    #[test]
    fn test_device_error_passes_through_display() {
        let err: RelayError = DeviceError::Failure("boom".into()).into();
        assert_eq!(err.to_string(), "Device error: boom");
    }
}
