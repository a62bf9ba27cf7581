//! Response translator
//!
//! Resolves a [`DeviceResponse`] into the outbound HTTP response: inline
//! content is returned as is, file content is streamed from blob storage.

use axum::body::Body;
use axum::http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::clients::blob::BlobStorage;
use crate::error::{RelayError, Result};
use crate::request::is_hop_by_hop;
use crate::telemetry::{instrumented, TelemetryRecorder, BLOB_READ_FILE};
use crate::types::{DeviceResponse, DeviceResponseHeaders, FileResponse, InlineResponse};

/// Turns device answers into outbound responses
pub struct ResponseTranslator {
    blob_storage: Arc<dyn BlobStorage>,
}

impl ResponseTranslator {
    pub fn new(blob_storage: Arc<dyn BlobStorage>) -> Self {
        Self { blob_storage }
    }

    /// Resolve `response` into an outbound response carrying status, content
    /// type and body. Extra headers are attached separately by
    /// [`attach_headers`].
    pub async fn translate(
        &self,
        device_id: &str,
        response: DeviceResponse,
        recorder: &dyn TelemetryRecorder,
    ) -> Result<Response> {
        match response {
            DeviceResponse::Inline(inline) => inline_response(inline),
            DeviceResponse::File(file) => self.file_response(device_id, file, recorder).await,
            DeviceResponse::Unsupported { headers, kind } => {
                error!(
                    device_id,
                    kind = %kind,
                    status = headers.status,
                    "Device transport returned an unsupported response type"
                );
                Err(RelayError::UnsupportedResponse(kind))
            }
        }
    }

    async fn file_response(
        &self,
        device_id: &str,
        file: FileResponse,
        recorder: &dyn TelemetryRecorder,
    ) -> Result<Response> {
        let stream = instrumented(
            recorder,
            BLOB_READ_FILE,
            &[],
            self.blob_storage.open_file(device_id, &file.blob_url),
        )
        .await?;

        debug!(device_id, blob_url = %file.blob_url, "Streaming blob content");

        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = StatusCode::OK;
        set_content_type(response.headers_mut(), &file.headers.content_type);
        Ok(response)
    }
}

fn inline_response(inline: InlineResponse) -> Result<Response> {
    let status = StatusCode::from_u16(inline.headers.status)
        .map_err(|_| RelayError::InvalidStatus(inline.headers.status))?;

    let mut response = Response::new(Body::from(inline.body));
    *response.status_mut() = status;
    set_content_type(response.headers_mut(), &inline.headers.content_type);
    Ok(response)
}

fn set_content_type(headers: &mut HeaderMap, content_type: &str) {
    if content_type.is_empty() {
        return;
    }
    match HeaderValue::from_str(content_type) {
        Ok(value) => {
            headers.insert(CONTENT_TYPE, value);
        }
        Err(_) => warn!(content_type, "Skipping invalid device content type"),
    }
}

/// Copy the device's extra headers onto `response`.
///
/// Content type, content length and hop-by-hop headers are owned by the
/// outbound response and never overwritten.
pub fn attach_headers(response: &mut Response, device_headers: &DeviceResponseHeaders) {
    let headers = response.headers_mut();

    for (name, value) in &device_headers.extra {
        if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str())
            || name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str())
            || is_hop_by_hop(name)
        {
            continue;
        }

        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            warn!(header = %name, "Skipping invalid device header name");
            continue;
        };
        headers.remove(&header_name);
        for value in DeviceResponseHeaders::extra_values(name, value) {
            match HeaderValue::from_str(value) {
                Ok(header_value) => {
                    headers.append(header_name.clone(), header_value);
                }
                Err(_) => warn!(header = %name, "Skipping invalid device header value"),
            }
        }
    }
}
