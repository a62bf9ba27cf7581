//! Device relay for CloudRelay
//!
//! This crate carries an inbound HTTP request to a named device and the
//! device's answer back to the caller.
//!
//! # Features
//!
//! - Verb-agnostic device request building with per-verb body ceilings
//! - Device invocation through a pluggable transport
//! - Inline and blob-backed (streamed) device responses
//! - Device header propagation
//! - Per-call telemetry with guaranteed release
//!
//! # Feature Flags
//!
//! - `client` - Enable HTTP clients for the device bridge and blob storage

pub mod api;
pub mod clients;
pub mod error;
pub mod orchestrator;
pub mod request;
pub mod telemetry;
pub mod translate;
pub mod types;

// Re-export commonly used types
pub use error::{BlobError, DeviceError, RelayError, Result};
pub use orchestrator::DeviceRelay;
pub use request::{DeviceRequestBuilder, InboundRequest};
pub use translate::ResponseTranslator;
pub use types::{
    BodyLimits, DeviceMethod, DeviceRequest, DeviceResponse, DeviceResponseHeaders, FileResponse,
    InlineResponse, REMOTE_QUERY_HEADER,
};

// API exports
pub use api::{relay_routes, RelayApiState};

// Client exports
pub use clients::blob::{BlobStorage, BlobStream, InMemoryBlobStorage};
pub use clients::device::DeviceTransport;

#[cfg(feature = "client")]
pub use clients::blob::http::HttpBlobStorage;

#[cfg(feature = "client")]
pub use clients::device::http::HttpDeviceTransport;

// Telemetry exports
pub use telemetry::{InMemoryTelemetry, MetricsTelemetry, Telemetry, TelemetryRecorder, TelemetryScope};
