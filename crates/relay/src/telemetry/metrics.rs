//! Telemetry backed by the `metrics` facade
//!
//! Each recorder buffers the events of its call and flushes them when
//! released, so a call's counters and timers reach the exporter together.
//! Metric names are derived from the operation name:
//!
//! * `{prefix}_{name}_total` - counter
//! * `{prefix}_{name}_duration_seconds` - histogram
//!
//! `key:value` tags become labels; bare tags are exported as `tag="..."`.

use metrics::{counter, histogram, Label};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;

use super::traits::{Telemetry, TelemetryRecorder};

/// Default metric name prefix
pub const DEFAULT_PREFIX: &str = "cloudrelay";

/// [`Telemetry`] implementation exporting through the global `metrics` recorder
#[derive(Debug, Clone)]
pub struct MetricsTelemetry {
    prefix: String,
}

impl MetricsTelemetry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: sanitize(&prefix.into()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for MetricsTelemetry {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Telemetry for MetricsTelemetry {
    fn recorder(&self) -> Box<dyn TelemetryRecorder> {
        Box::new(MetricsRecorder::new(self.prefix.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TelemetryEvent {
    Counter {
        name: String,
        labels: Vec<(String, String)>,
    },
    Timer {
        name: String,
        elapsed: Duration,
        labels: Vec<(String, String)>,
    },
}

struct MetricsRecorder {
    prefix: String,
    pending: Mutex<Vec<TelemetryEvent>>,
    released: AtomicBool,
}

impl MetricsRecorder {
    fn new(prefix: String) -> Self {
        Self {
            prefix,
            pending: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    fn push(&self, event: TelemetryEvent) {
        if self.released.load(Ordering::SeqCst) {
            // Late events are emitted directly rather than lost
            self.emit(event);
            return;
        }
        self.pending.lock().push(event);
    }

    fn emit(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::Counter { name, labels } => {
                counter!(
                    format!("{}_{}_total", self.prefix, name),
                    to_labels(labels)
                )
                .increment(1);
            }
            TelemetryEvent::Timer {
                name,
                elapsed,
                labels,
            } => {
                histogram!(
                    format!("{}_{}_duration_seconds", self.prefix, name),
                    to_labels(labels)
                )
                .record(elapsed.as_secs_f64());
            }
        }
    }
}

impl TelemetryRecorder for MetricsRecorder {
    fn increment_counter(&self, name: &str, tags: &[&str]) {
        self.push(TelemetryEvent::Counter {
            name: sanitize(name),
            labels: parse_tags(tags),
        });
    }

    fn record_timer(&self, name: &str, elapsed: Duration, tags: &[&str]) {
        self.push(TelemetryEvent::Timer {
            name: sanitize(name),
            elapsed,
            labels: parse_tags(tags),
        });
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            warn!("Telemetry recorder released twice");
            return;
        }

        let events = std::mem::take(&mut *self.pending.lock());
        for event in events {
            self.emit(event);
        }
    }
}

/// Prometheus-safe metric name: `[a-zA-Z0-9_]` only
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn parse_tags(tags: &[&str]) -> Vec<(String, String)> {
    tags.iter()
        .filter(|t| !t.is_empty())
        .map(|tag| match tag.split_once(':') {
            Some((key, value)) => (sanitize(key), value.to_string()),
            None => ("tag".to_string(), tag.to_string()),
        })
        .collect()
}

fn to_labels(labels: Vec<(String, String)>) -> Vec<Label> {
    labels
        .into_iter()
        .map(|(key, value)| Label::new(key, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_metric_names() {
        assert_eq!(sanitize("blob_storage.read_file"), "blob_storage_read_file");
        assert_eq!(sanitize("senddevicerequest"), "senddevicerequest");
        assert_eq!(MetricsTelemetry::new("cloud-relay").prefix(), "cloud_relay");
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            parse_tags(&["verb:get", "canary", ""]),
            vec![
                ("verb".to_string(), "get".to_string()),
                ("tag".to_string(), "canary".to_string()),
            ]
        );
        assert!(parse_tags(&[]).is_empty());
    }

    #[test]
    fn test_events_buffer_until_release() {
        let recorder = MetricsRecorder::new(DEFAULT_PREFIX.to_string());
        recorder.increment_counter("senddevicerequest", &[]);
        recorder.record_timer("invoke_request", Duration::from_millis(5), &[]);
        assert_eq!(recorder.pending(), 2);

        recorder.release();
        assert_eq!(recorder.pending(), 0);

        // second release is ignored, later events bypass the buffer
        recorder.release();
        recorder.increment_counter("late", &[]);
        assert_eq!(recorder.pending(), 0);
    }
}
