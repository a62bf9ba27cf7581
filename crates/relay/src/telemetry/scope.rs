//! Scoped recorder ownership and instrumented execution

use std::future::Future;
use std::time::Instant;
use tracing::Instrument;

use super::traits::{Telemetry, TelemetryRecorder};

/// Owns the recorder of one inbound call and releases it on drop.
///
/// Dropping covers every way a call can end: normal return, `?` early
/// returns, and the handler future being dropped on client disconnect.
///
/// # Example
///
/// ```ignore
/// let scope = TelemetryScope::acquire(telemetry.as_ref());
/// scope.recorder().increment_counter("senddevicerequest", &[]);
/// // ... recorder released when `scope` goes out of scope
/// ```
pub struct TelemetryScope {
    recorder: Box<dyn TelemetryRecorder>,
}

impl TelemetryScope {
    pub fn acquire(telemetry: &dyn Telemetry) -> Self {
        Self {
            recorder: telemetry.recorder(),
        }
    }

    pub fn recorder(&self) -> &dyn TelemetryRecorder {
        self.recorder.as_ref()
    }
}

impl Drop for TelemetryScope {
    fn drop(&mut self) {
        self.recorder.release();
    }
}

/// Timer span that records its duration when dropped
struct TimerSpan<'a> {
    recorder: &'a dyn TelemetryRecorder,
    operation: &'a str,
    tags: &'a [&'a str],
    start: Instant,
}

impl<'a> TimerSpan<'a> {
    fn start(recorder: &'a dyn TelemetryRecorder, operation: &'a str, tags: &'a [&'a str]) -> Self {
        Self {
            recorder,
            operation,
            tags,
            start: Instant::now(),
        }
    }
}

impl Drop for TimerSpan<'_> {
    fn drop(&mut self) {
        self.recorder
            .record_timer(self.operation, self.start.elapsed(), self.tags);
    }
}

/// Run `operation_future` as the named operation.
///
/// Increments the `operation` counter once, then times the future from just
/// before its first poll until it completes or is dropped. The output is
/// returned untouched, errors included.
pub async fn instrumented<F>(
    recorder: &dyn TelemetryRecorder,
    operation: &str,
    tags: &[&str],
    operation_future: F,
) -> F::Output
where
    F: Future,
{
    recorder.increment_counter(operation, tags);
    let _span = TimerSpan::start(recorder, operation, tags);

    operation_future
        .instrument(tracing::debug_span!("relay_operation", operation))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::InMemoryTelemetry;
    use std::time::Duration;

    #[tokio::test]
    async fn test_instrumented_success_counts_and_times() {
        let telemetry = InMemoryTelemetry::new();
        let scope = TelemetryScope::acquire(&telemetry);

        let value: Result<u32, String> =
            instrumented(scope.recorder(), "create_request", &[], async { Ok(7) }).await;

        assert_eq!(value, Ok(7));
        assert_eq!(telemetry.counter("create_request"), 1);
        assert_eq!(telemetry.timers("create_request").len(), 1);
    }

    #[tokio::test]
    async fn test_instrumented_failure_is_returned_unchanged() {
        let telemetry = InMemoryTelemetry::new();
        let scope = TelemetryScope::acquire(&telemetry);

        let value: Result<u32, String> = instrumented(scope.recorder(), "invoke_request", &[], async {
            Err("device offline".to_string())
        })
        .await;

        assert_eq!(value, Err("device offline".to_string()));
        assert_eq!(telemetry.counter("invoke_request"), 1);
        assert_eq!(telemetry.timers("invoke_request").len(), 1);
    }

    #[tokio::test]
    async fn test_instrumented_closes_span_when_cancelled() {
        let telemetry = InMemoryTelemetry::new();
        let scope = TelemetryScope::acquire(&telemetry);

        let pending = instrumented(
            scope.recorder(),
            "invoke_request",
            &[],
            std::future::pending::<()>(),
        );
        let outcome = tokio::time::timeout(Duration::from_millis(10), pending).await;

        assert!(outcome.is_err());
        assert_eq!(telemetry.counter("invoke_request"), 1);
        assert_eq!(telemetry.timers("invoke_request").len(), 1);
    }

    #[tokio::test]
    async fn test_instrumented_measures_elapsed_time() {
        let telemetry = InMemoryTelemetry::new();
        let scope = TelemetryScope::acquire(&telemetry);

        instrumented(scope.recorder(), "slow", &[], async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        })
        .await;

        let timers = telemetry.timers("slow");
        assert_eq!(timers.len(), 1);
        assert!(timers[0] >= Duration::from_millis(20));
    }

    #[test]
    fn test_scope_releases_exactly_once() {
        let telemetry = InMemoryTelemetry::new();
        {
            let _scope = TelemetryScope::acquire(&telemetry);
            assert_eq!(telemetry.acquired(), 1);
            assert_eq!(telemetry.released(), 0);
        }
        assert_eq!(telemetry.released(), 1);
    }
}
