//! Device request builder
//!
//! Turns an inbound HTTP request, whatever its verb, into the immutable
//! [`DeviceRequest`] handed to the device transport.

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, Method};
use http_body_util::LengthLimitError;
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::types::{BodyLimits, DeviceMethod, DeviceRequest, REMOTE_QUERY_HEADER};

/// Hop-by-hop headers, never forwarded in either direction
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub(crate) fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// The parts of an inbound call the relay needs
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Body,
}

impl InboundRequest {
    pub fn new(method: Method, headers: HeaderMap, body: impl Into<Body>) -> Self {
        Self {
            method,
            headers,
            body: body.into(),
        }
    }

    pub fn from_request(request: Request) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            headers: parts.headers,
            body,
        }
    }
}

/// Read the remote-query header: present, UTF-8 and non-blank
pub fn remote_query(headers: &HeaderMap) -> Result<String> {
    headers
        .get(REMOTE_QUERY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .ok_or(RelayError::MissingRemoteQuery)
}

/// Builds [`DeviceRequest`]s under per-verb body ceilings
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceRequestBuilder {
    limits: BodyLimits,
}

impl DeviceRequestBuilder {
    pub fn new(limits: BodyLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> BodyLimits {
        self.limits
    }

    /// Build the device request for `device_id` from an inbound call.
    ///
    /// The body is read up to the verb's ceiling; a longer body fails with
    /// [`RelayError::PayloadTooLarge`] without being buffered further.
    pub async fn build(&self, device_id: &str, inbound: InboundRequest) -> Result<DeviceRequest> {
        if device_id.trim().is_empty() {
            return Err(RelayError::InvalidDeviceId);
        }

        let method = DeviceMethod::from_http(&inbound.method)
            .ok_or_else(|| RelayError::UnsupportedMethod(inbound.method.to_string()))?;
        let remote_query = remote_query(&inbound.headers)?;
        let headers = propagated_headers(&inbound.headers);

        let limit = self.limits.for_method(method);
        let body = read_body(inbound.body, limit).await?;

        debug!(
            device_id,
            %method,
            header_count = headers.len(),
            body_bytes = body.len(),
            "Device request built"
        );

        Ok(DeviceRequest::new(
            device_id.to_string(),
            method,
            remote_query,
            headers,
            body,
            limit,
        ))
    }
}

/// Inbound headers worth forwarding, in arrival order
fn propagated_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|(name, _)| {
            let name = name.as_str();
            !is_hop_by_hop(name)
                && name != "host"
                && name != "content-length"
                && name != REMOTE_QUERY_HEADER
        })
        .filter_map(|(name, value)| match value.to_str() {
            Ok(value) => Some((name.as_str().to_string(), value.to_string())),
            Err(_) => {
                debug!(header = %name, "Skipping non UTF-8 header");
                None
            }
        })
        .collect()
}

async fn read_body(body: Body, limit: usize) -> Result<Bytes> {
    axum::body::to_bytes(body, limit).await.map_err(|err| {
        if is_length_limit(&err) {
            RelayError::PayloadTooLarge { limit }
        } else {
            RelayError::InvalidBody(err.to_string())
        }
    })
}

fn is_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<LengthLimitError>() {
            return true;
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[tokio::test]
    async fn test_build_carries_method_query_and_body() {
        let builder = DeviceRequestBuilder::default();
        let inbound = InboundRequest::new(
            Method::POST,
            headers(&[
                ("host", "relay.local"),
                ("remote-query", "/api/points?id=4"),
                ("accept", "application/json"),
                ("content-length", "5"),
                ("x-trace", "t1"),
                ("connection", "keep-alive"),
            ]),
            "hello",
        );

        let request = builder.build("device-1", inbound).await.unwrap();

        assert_eq!(request.device_id(), "device-1");
        assert_eq!(request.method(), DeviceMethod::Post);
        assert_eq!(request.remote_query(), "/api/points?id=4");
        assert_eq!(
            request.headers(),
            &[
                ("accept".to_string(), "application/json".to_string()),
                ("x-trace".to_string(), "t1".to_string()),
            ]
        );
        assert_eq!(request.body().as_ref(), b"hello");
        assert_eq!(request.body_size_limit_bytes(), crate::types::POST_BODY_LIMIT_BYTES);
    }

    #[tokio::test]
    async fn test_build_rejects_missing_remote_query() {
        let builder = DeviceRequestBuilder::default();
        let inbound = InboundRequest::new(Method::GET, headers(&[("accept", "*/*")]), Body::empty());

        assert_matches!(
            builder.build("device-1", inbound).await,
            Err(RelayError::MissingRemoteQuery)
        );
    }

    #[tokio::test]
    async fn test_build_rejects_blank_remote_query() {
        let builder = DeviceRequestBuilder::default();
        let inbound = InboundRequest::new(Method::GET, headers(&[("remote-query", "  ")]), Body::empty());

        assert_matches!(
            builder.build("device-1", inbound).await,
            Err(RelayError::MissingRemoteQuery)
        );
    }

    #[tokio::test]
    async fn test_build_rejects_empty_device_id() {
        let builder = DeviceRequestBuilder::default();
        let inbound = InboundRequest::new(Method::GET, headers(&[("remote-query", "/")]), Body::empty());

        assert_matches!(builder.build("", inbound).await, Err(RelayError::InvalidDeviceId));
    }

    #[tokio::test]
    async fn test_build_rejects_unrouted_verb() {
        let builder = DeviceRequestBuilder::default();
        let inbound = InboundRequest::new(Method::PATCH, headers(&[("remote-query", "/")]), Body::empty());

        assert_matches!(
            builder.build("device-1", inbound).await,
            Err(RelayError::UnsupportedMethod(m)) if m == "PATCH"
        );
    }

    #[tokio::test]
    async fn test_body_limit_is_per_verb() {
        let builder = DeviceRequestBuilder::new(BodyLimits::new(8, 4));

        let at_limit = InboundRequest::new(Method::POST, headers(&[("remote-query", "/")]), "12345678");
        assert!(builder.build("d", at_limit).await.is_ok());

        let over_post = InboundRequest::new(Method::POST, headers(&[("remote-query", "/")]), "123456789");
        assert_matches!(
            builder.build("d", over_post).await,
            Err(RelayError::PayloadTooLarge { limit: 8 })
        );

        let over_put = InboundRequest::new(Method::PUT, headers(&[("remote-query", "/")]), "12345");
        assert_matches!(
            builder.build("d", over_put).await,
            Err(RelayError::PayloadTooLarge { limit: 4 })
        );
    }

    #[test]
    fn test_hop_by_hop_detection() {
        assert!(is_hop_by_hop("Transfer-Encoding"));
        assert!(is_hop_by_hop("connection"));
        assert!(!is_hop_by_hop("content-disposition"));
    }
}
