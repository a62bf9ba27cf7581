//! Relay data model
//!
//! The request handed to the device transport and the polymorphic answer it
//! returns. Everything here lives for exactly one inbound call.

use axum::http::Method;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

/// Header carrying the caller's remote query (matched case-insensitively)
pub const REMOTE_QUERY_HEADER: &str = "remote-query";

/// Body ceiling for POST device requests: 200 MiB, body and multipart form alike
pub const POST_BODY_LIMIT_BYTES: usize = 200 * 1024 * 1024;

/// Body ceiling for GET, PUT and DELETE device requests
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 30_000_000;

/// HTTP verbs a device request can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl DeviceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMethod::Get => "GET",
            DeviceMethod::Put => "PUT",
            DeviceMethod::Post => "POST",
            DeviceMethod::Delete => "DELETE",
        }
    }

    /// Map an inbound HTTP method, `None` for verbs the relay does not route
    pub fn from_http(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(DeviceMethod::Get),
            Method::PUT => Some(DeviceMethod::Put),
            Method::POST => Some(DeviceMethod::Post),
            Method::DELETE => Some(DeviceMethod::Delete),
            _ => None,
        }
    }

    pub fn to_http(self) -> Method {
        match self {
            DeviceMethod::Get => Method::GET,
            DeviceMethod::Put => Method::PUT,
            DeviceMethod::Post => Method::POST,
            DeviceMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for DeviceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-verb request body ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimits {
    /// Applied to POST
    pub post_bytes: usize,
    /// Applied to GET, PUT and DELETE
    pub default_bytes: usize,
}

impl BodyLimits {
    pub fn new(post_bytes: usize, default_bytes: usize) -> Self {
        Self {
            post_bytes,
            default_bytes,
        }
    }

    pub fn for_method(&self, method: DeviceMethod) -> usize {
        match method {
            DeviceMethod::Post => self.post_bytes,
            _ => self.default_bytes,
        }
    }
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self::new(POST_BODY_LIMIT_BYTES, DEFAULT_BODY_LIMIT_BYTES)
    }
}

/// A transport-neutral request addressed to one device.
///
/// Built once per inbound call by
/// [`DeviceRequestBuilder`](crate::request::DeviceRequestBuilder) and never
/// mutated afterwards, hence the read-only accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    device_id: String,
    method: DeviceMethod,
    remote_query: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    body_size_limit_bytes: usize,
}

impl DeviceRequest {
    pub(crate) fn new(
        device_id: String,
        method: DeviceMethod,
        remote_query: String,
        headers: Vec<(String, String)>,
        body: Bytes,
        body_size_limit_bytes: usize,
    ) -> Self {
        Self {
            device_id,
            method,
            remote_query,
            headers,
            body,
            body_size_limit_bytes,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn method(&self) -> DeviceMethod {
        self.method
    }

    pub fn remote_query(&self) -> &str {
        &self.remote_query
    }

    /// Propagated inbound headers, in arrival order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_size_limit_bytes(&self) -> usize {
        self.body_size_limit_bytes
    }
}

/// Headers every device answer carries, whatever its variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResponseHeaders {
    pub status: u16,
    pub content_type: String,
    /// Headers the outbound response does not set on its own.
    ///
    /// Repeated headers share one entry: values are joined with `", "`,
    /// except `set-cookie` whose values are kept apart by `'\n'` (see
    /// [`DeviceResponseHeaders::extra_values`]).
    pub extra: BTreeMap<String, String>,
}

impl DeviceResponseHeaders {
    pub fn new(status: u16, content_type: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Add one more value for `name`, folding it into any existing entry
    pub fn append_extra(&mut self, name: &str, value: &str) {
        let separator = if is_set_cookie(name) { SET_COOKIE_SEPARATOR } else { ", " };
        self.extra
            .entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(separator);
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// The separate header values stored under one `extra` entry
    pub fn extra_values<'a>(name: &str, value: &'a str) -> Vec<&'a str> {
        if is_set_cookie(name) {
            value.split(SET_COOKIE_SEPARATOR).collect()
        } else {
            vec![value]
        }
    }
}

/// Cookies cannot be comma-folded; a newline never occurs in a valid header value
const SET_COOKIE_SEPARATOR: &str = "\n";

fn is_set_cookie(name: &str) -> bool {
    name.eq_ignore_ascii_case("set-cookie")
}

/// Content returned directly by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineResponse {
    pub headers: DeviceResponseHeaders,
    pub body: Bytes,
}

/// Content the device stored externally, fetched by reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResponse {
    pub headers: DeviceResponseHeaders,
    pub blob_url: String,
}

/// How a device answered.
///
/// `Inline` and `File` are the only shapes of the relay contract.
/// `Unsupported` is what a transport reports when the device answered with
/// anything else; the translator treats it as a fatal internal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceResponse {
    Inline(InlineResponse),
    File(FileResponse),
    Unsupported {
        headers: DeviceResponseHeaders,
        kind: String,
    },
}

impl DeviceResponse {
    pub fn inline(headers: DeviceResponseHeaders, body: impl Into<Bytes>) -> Self {
        DeviceResponse::Inline(InlineResponse {
            headers,
            body: body.into(),
        })
    }

    pub fn file(headers: DeviceResponseHeaders, blob_url: impl Into<String>) -> Self {
        DeviceResponse::File(FileResponse {
            headers,
            blob_url: blob_url.into(),
        })
    }

    pub fn headers(&self) -> &DeviceResponseHeaders {
        match self {
            DeviceResponse::Inline(inline) => &inline.headers,
            DeviceResponse::File(file) => &file.headers,
            DeviceResponse::Unsupported { headers, .. } => headers,
        }
    }

    /// Variant name, used in logs
    pub fn kind(&self) -> &str {
        match self {
            DeviceResponse::Inline(_) => "inline",
            DeviceResponse::File(_) => "file",
            DeviceResponse::Unsupported { kind, .. } => kind,
        }
    }
}
