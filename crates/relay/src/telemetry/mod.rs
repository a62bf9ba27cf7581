//! Telemetry for the relay path
//!
//! A [`Telemetry`] service hands out one [`TelemetryRecorder`] per inbound
//! call. The recorder is owned by a [`TelemetryScope`], which releases it
//! exactly once however the call ends, and every awaited step of the relay
//! runs through [`instrumented`].
//!
//! # Implementations
//!
//! - [`MetricsTelemetry`] - buffers per call, flushes to the `metrics` facade
//! - [`InMemoryTelemetry`] - keeps everything for inspection in tests

pub mod memory;
pub mod metrics;
pub mod scope;
pub mod traits;

pub use self::memory::InMemoryTelemetry;
pub use self::metrics::MetricsTelemetry;
pub use self::scope::{instrumented, TelemetryScope};
pub use self::traits::{Telemetry, TelemetryRecorder};

/// Counter bumped once per inbound device request
pub const SEND_DEVICE_REQUEST: &str = "senddevicerequest";

/// Operation name for building the device request
pub const CREATE_REQUEST: &str = "create_request";

/// Operation name for the device round-trip
pub const INVOKE_REQUEST: &str = "invoke_request";

/// Operation name for opening blob content
pub const BLOB_READ_FILE: &str = "blob_storage.read_file";
