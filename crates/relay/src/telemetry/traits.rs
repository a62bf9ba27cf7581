//! Telemetry trait definitions

use std::time::Duration;

/// Per-call telemetry sink.
///
/// Tags are free-form dimension strings; `key:value` tags are understood as
/// labelled dimensions by implementations that support them.
pub trait TelemetryRecorder: Send + Sync {
    /// Count one occurrence of `name`
    fn increment_counter(&self, name: &str, tags: &[&str]);

    /// Record one measured interval for `name`
    fn record_timer(&self, name: &str, elapsed: Duration, tags: &[&str]);

    /// Release the recorder at the end of the call.
    ///
    /// [`TelemetryScope`](super::TelemetryScope) calls this exactly once.
    fn release(&self);
}

/// Shared telemetry service, acquired from once per inbound call
pub trait Telemetry: Send + Sync {
    fn recorder(&self) -> Box<dyn TelemetryRecorder>;
}
