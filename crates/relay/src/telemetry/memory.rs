//! In-memory telemetry, for tests and local runs

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::traits::{Telemetry, TelemetryRecorder};

#[derive(Debug, Default)]
struct TelemetryLog {
    counters: HashMap<String, u64>,
    timers: HashMap<String, Vec<Duration>>,
    tags: Vec<(String, Vec<String>)>,
    acquired: u64,
    released: u64,
}

/// Telemetry that keeps every event in memory.
///
/// Clones share the same log, so a test can keep one handle and give another
/// to the relay.
#[derive(Clone, Default)]
pub struct InMemoryTelemetry {
    log: Arc<Mutex<TelemetryLog>>,
}

impl InMemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total increments of counter `name`
    pub fn counter(&self, name: &str) -> u64 {
        self.log.lock().counters.get(name).copied().unwrap_or(0)
    }

    /// Every duration recorded for timer `name`
    pub fn timers(&self, name: &str) -> Vec<Duration> {
        self.log.lock().timers.get(name).cloned().unwrap_or_default()
    }

    /// Tags passed along with each event, in order
    pub fn tags(&self) -> Vec<(String, Vec<String>)> {
        self.log.lock().tags.clone()
    }

    /// Recorders handed out so far
    pub fn acquired(&self) -> u64 {
        self.log.lock().acquired
    }

    /// Recorder releases so far
    pub fn released(&self) -> u64 {
        self.log.lock().released
    }
}

impl Telemetry for InMemoryTelemetry {
    fn recorder(&self) -> Box<dyn TelemetryRecorder> {
        self.log.lock().acquired += 1;
        Box::new(InMemoryRecorder {
            log: Arc::clone(&self.log),
        })
    }
}

struct InMemoryRecorder {
    log: Arc<Mutex<TelemetryLog>>,
}

fn owned_tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

impl TelemetryRecorder for InMemoryRecorder {
    fn increment_counter(&self, name: &str, tags: &[&str]) {
        let mut log = self.log.lock();
        *log.counters.entry(name.to_string()).or_insert(0) += 1;
        log.tags.push((name.to_string(), owned_tags(tags)));
    }

    fn record_timer(&self, name: &str, elapsed: Duration, tags: &[&str]) {
        let mut log = self.log.lock();
        log.timers.entry(name.to_string()).or_default().push(elapsed);
        log.tags.push((name.to_string(), owned_tags(tags)));
    }

    fn release(&self) {
        self.log.lock().released += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_log() {
        let telemetry = InMemoryTelemetry::new();
        let handle = telemetry.clone();

        let recorder = telemetry.recorder();
        recorder.increment_counter("senddevicerequest", &["env:test"]);
        recorder.record_timer("invoke_request", Duration::from_millis(3), &[]);
        recorder.release();

        assert_eq!(handle.counter("senddevicerequest"), 1);
        assert_eq!(handle.counter("unknown"), 0);
        assert_eq!(handle.timers("invoke_request"), vec![Duration::from_millis(3)]);
        assert_eq!(handle.tags()[0].1, vec!["env:test".to_string()]);
        assert_eq!(handle.acquired(), 1);
        assert_eq!(handle.released(), 1);
    }
}
