//! Device transport - trait and implementations

use async_trait::async_trait;

use crate::error::DeviceError;
use crate::types::{DeviceRequest, DeviceResponse};

/// Client trait for reaching devices - protocol agnostic
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Deliver `request` to the device and wait for its answer.
    ///
    /// This is the slow leg of a relay call: the device may be busy, far
    /// away or offline. Implementations surface their own failures and
    /// never retry on the relay's behalf.
    async fn invoke_request(
        &self,
        device_id: &str,
        request: &DeviceRequest,
    ) -> Result<DeviceResponse, DeviceError>;
}

// ==================== HTTP Implementation ====================

#[cfg(feature = "client")]
pub mod http {
    //! Device transport speaking to an HTTP device bridge.
    //!
    //! The request is replayed against `{bridge}/devices/{device_id}/request`
    //! with its verb, headers, remote query and body. The bridge answers
    //! with the device's status and content type; two headers select the
    //! response variant:
    //!
    //! - `x-device-response-kind`: `inline` (default) or `file`
    //! - `x-device-blob-url`: blob location of a `file` answer
    //!
    //! Bridge-side failures are flagged with `x-device-error`
    //! (`not-found`, `unreachable`, `timeout`, anything else is a device failure).

    use async_trait::async_trait;
    use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
    use reqwest::Client;
    use std::time::Duration;
    use tracing::{debug, warn};
    use url::Url;

    use super::DeviceTransport;
    use crate::error::DeviceError;
    use crate::request::is_hop_by_hop;
    use crate::types::{DeviceRequest, DeviceResponse, DeviceResponseHeaders, REMOTE_QUERY_HEADER};

    pub const RESPONSE_KIND_HEADER: &str = "x-device-response-kind";
    pub const BLOB_URL_HEADER: &str = "x-device-blob-url";
    pub const DEVICE_ERROR_HEADER: &str = "x-device-error";

    const BRIDGE_CONTROL_HEADERS: &[&str] = &[RESPONSE_KIND_HEADER, BLOB_URL_HEADER, DEVICE_ERROR_HEADER];

    /// Content type assumed when the bridge sends none
    const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

    /// HTTP client for a device bridge
    #[derive(Clone)]
    pub struct HttpDeviceTransport {
        client: Client,
        base_url: Url,
    }

    impl HttpDeviceTransport {
        /// Create a transport for the bridge at `bridge_url`.
        ///
        /// `timeout` bounds each device round-trip at the client level.
        pub fn new(bridge_url: &str, timeout: Option<Duration>) -> Result<Self, DeviceError> {
            let base_url = Url::parse(bridge_url)
                .map_err(|e| DeviceError::Unreachable(format!("invalid bridge url '{}': {}", bridge_url, e)))?;

            let mut builder = Client::builder();
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            let client = builder
                .build()
                .map_err(|e| DeviceError::Unreachable(format!("failed to build http client: {}", e)))?;

            Ok(Self { client, base_url })
        }

        pub fn base_url(&self) -> &str {
            self.base_url.as_str()
        }

        fn request_url(&self, device_id: &str) -> Result<Url, DeviceError> {
            let mut url = self.base_url.clone();
            url.path_segments_mut()
                .map_err(|_| DeviceError::Unreachable(format!("bridge url cannot be a base: {}", self.base_url)))?
                .pop_if_empty()
                .extend(["devices", device_id, "request"]);
            Ok(url)
        }
    }

    #[async_trait]
    impl DeviceTransport for HttpDeviceTransport {
        async fn invoke_request(
            &self,
            device_id: &str,
            request: &DeviceRequest,
        ) -> Result<DeviceResponse, DeviceError> {
            let url = self.request_url(device_id)?;
            debug!(device_id, method = %request.method(), %url, "Forwarding request to device bridge");

            let mut builder = self.client.request(request.method().to_http(), url);
            for (name, value) in request.headers() {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder
                .header(REMOTE_QUERY_HEADER, request.remote_query())
                .body(request.body().clone())
                .send()
                .await
                .map_err(|e| send_error(device_id, e))?;

            decode_response(device_id, response).await
        }
    }

    fn send_error(device_id: &str, err: reqwest::Error) -> DeviceError {
        if err.is_timeout() {
            DeviceError::Timeout(format!("device {}: {}", device_id, err))
        } else {
            DeviceError::Unreachable(format!("device {}: {}", device_id, err))
        }
    }

    fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Decode the bridge's answer into a [`DeviceResponse`]
    pub(crate) async fn decode_response(
        device_id: &str,
        response: reqwest::Response,
    ) -> Result<DeviceResponse, DeviceError> {
        let status = response.status();
        let headers = response.headers().clone();

        if let Some(kind) = header_str(&headers, DEVICE_ERROR_HEADER) {
            let detail = response.text().await.unwrap_or_default();
            warn!(device_id, %status, kind, "Device bridge reported an error");
            return Err(match kind.to_ascii_lowercase().as_str() {
                "not-found" => DeviceError::NotFound(device_id.to_string()),
                "unreachable" => DeviceError::Unreachable(format!("device {}: {}", device_id, detail)),
                "timeout" => DeviceError::Timeout(format!("device {}: {}", device_id, detail)),
                _ => DeviceError::Failure(format!("device {} ({}): {}", device_id, status, detail)),
            });
        }

        let content_type = header_str(&headers, CONTENT_TYPE.as_str()).unwrap_or(FALLBACK_CONTENT_TYPE);
        let mut device_headers = DeviceResponseHeaders::new(status.as_u16(), content_type);

        for (name, value) in headers.iter() {
            let name = name.as_str();
            if name == CONTENT_TYPE.as_str()
                || name == CONTENT_LENGTH.as_str()
                || is_hop_by_hop(name)
                || BRIDGE_CONTROL_HEADERS.contains(&name)
            {
                continue;
            }
            let Ok(value) = value.to_str() else {
                continue;
            };
            device_headers.append_extra(name, value);
        }

        let kind = header_str(&headers, RESPONSE_KIND_HEADER)
            .unwrap_or("inline")
            .to_ascii_lowercase();

        match kind.as_str() {
            "inline" => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| DeviceError::Failure(format!("device {}: failed to read body: {}", device_id, e)))?;
                Ok(DeviceResponse::inline(device_headers, body))
            }
            "file" => {
                let blob_url = header_str(&headers, BLOB_URL_HEADER)
                    .filter(|url| !url.is_empty())
                    .ok_or_else(|| {
                        DeviceError::Failure(format!("device {}: file response without blob url", device_id))
                    })?;
                Ok(DeviceResponse::file(device_headers, blob_url))
            }
            _ => Ok(DeviceResponse::Unsupported {
                headers: device_headers,
                kind,
            }),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use assert_matches::assert_matches;

        fn bridge_response(builder: axum::http::response::Builder, body: &'static str) -> reqwest::Response {
            reqwest::Response::from(builder.body(body).unwrap())
        }

        #[test]
        fn test_request_url_encodes_device_id() {
            let transport = HttpDeviceTransport::new("http://bridge.local:9000/api/", None).unwrap();
            let url = transport.request_url("room 12/a").unwrap();
            assert_eq!(url.as_str(), "http://bridge.local:9000/api/devices/room%2012%2Fa/request");
        }

        #[test]
        fn test_invalid_bridge_url() {
            assert!(HttpDeviceTransport::new("not a url", None).is_err());
        }

        #[tokio::test]
        async fn test_decode_inline_response() {
            let response = bridge_response(
                axum::http::Response::builder()
                    .status(200)
                    .header("content-type", "application/json")
                    .header("x-device-trace", "abc")
                    .header("x-device-response-kind", "inline")
                    .header("content-disposition", "inline"),
                "{\"ok\":true}",
            );

            let decoded = decode_response("d1", response).await.unwrap();
            let DeviceResponse::Inline(inline) = decoded else {
                panic!("expected inline response");
            };
            assert_eq!(inline.headers.status, 200);
            assert_eq!(inline.headers.content_type, "application/json");
            assert_eq!(inline.body.as_ref(), b"{\"ok\":true}");
            assert_eq!(inline.headers.extra.get("content-disposition").map(String::as_str), Some("inline"));
            assert_eq!(inline.headers.extra.get("x-device-trace").map(String::as_str), Some("abc"));
            assert!(!inline.headers.extra.contains_key("x-device-response-kind"));
        }

        #[tokio::test]
        async fn test_decode_repeated_headers() {
            let response = bridge_response(
                axum::http::Response::builder()
                    .status(200)
                    .header("set-cookie", "session=abc")
                    .header("set-cookie", "theme=dark")
                    .header("x-device-zone", "a")
                    .header("x-device-zone", "b"),
                "",
            );

            let decoded = decode_response("d1", response).await.unwrap();
            let extra = &decoded.headers().extra;
            assert_eq!(
                DeviceResponseHeaders::extra_values("set-cookie", &extra["set-cookie"]),
                vec!["session=abc", "theme=dark"]
            );
            assert_eq!(extra["x-device-zone"], "a, b");
        }

        #[tokio::test]
        async fn test_decode_file_response() {
            let response = bridge_response(
                axum::http::Response::builder()
                    .status(200)
                    .header("content-type", "image/png")
                    .header("x-device-response-kind", "file")
                    .header("x-device-blob-url", "https://blobs.local/d1/snapshot.png"),
                "",
            );

            let decoded = decode_response("d1", response).await.unwrap();
            assert_matches!(decoded, DeviceResponse::File(file) if file.blob_url == "https://blobs.local/d1/snapshot.png");
        }

        #[tokio::test]
        async fn test_decode_file_without_url_fails() {
            let response = bridge_response(
                axum::http::Response::builder().header("x-device-response-kind", "file"),
                "",
            );

            assert_matches!(decode_response("d1", response).await, Err(DeviceError::Failure(_)));
        }

        #[tokio::test]
        async fn test_decode_unknown_kind_is_unsupported() {
            let response = bridge_response(
                axum::http::Response::builder().header("x-device-response-kind", "websocket"),
                "",
            );

            let decoded = decode_response("d1", response).await.unwrap();
            assert_matches!(decoded, DeviceResponse::Unsupported { kind, .. } if kind == "websocket");
        }

        #[tokio::test]
        async fn test_decode_bridge_errors() {
            let not_found = bridge_response(
                axum::http::Response::builder().status(404).header("x-device-error", "not-found"),
                "",
            );
            assert_matches!(decode_response("d1", not_found).await, Err(DeviceError::NotFound(id)) if id == "d1");

            let timeout = bridge_response(
                axum::http::Response::builder().status(504).header("x-device-error", "timeout"),
                "no answer",
            );
            assert_matches!(decode_response("d1", timeout).await, Err(DeviceError::Timeout(_)));

            let failure = bridge_response(
                axum::http::Response::builder().status(500).header("x-device-error", "crashed"),
                "",
            );
            assert_matches!(decode_response("d1", failure).await, Err(DeviceError::Failure(_)));
        }
    }
}
