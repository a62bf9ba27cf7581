//! Observability infrastructure for CloudRelay
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics exporter
//! - HTTP request metric helpers
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! // Initialize logging
//! init_logging("relayd", LogFormat::Pretty)?;
//!
//! // Initialize metrics (optional)
//! observability::metrics::init_metrics("0.0.0.0:9090".parse()?)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, HttpMetrics, RequestMetricsGuard};
