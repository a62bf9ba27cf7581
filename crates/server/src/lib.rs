//! Server infrastructure for CloudRelay
//!
//! This crate runs the relay's HTTP surface with lifecycle management,
//! a standard middleware stack and graceful shutdown.
//!
//! # Architecture
//!
//! Servers implement the [`Server`] trait; [`ServerExt`] adds `spawn()` and
//! `run_until_signal()`. Shutdown uses `CancellationToken` from `tokio_util`:
//! cancelling the root token stops every server holding a child token.
//!
//! # Quick Start
//!
//! ```ignore
//! use server::{HttpServer, ServerConfig, ServerExt};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = HttpServer::new(ServerConfig::default(), router);
//!     server.run_until_signal().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Server configuration and port constants
//! - [`traits`] - `Server` and `ServerExt` traits
//! - [`http`] - HTTP server using Axum
//! - [`middleware`] - Request id, access log and request metrics
//! - [`health`] - Health check endpoint
//! - [`shutdown`] - Graceful shutdown utilities

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod middleware;
pub mod shutdown;
pub mod traits;

// Re-exports for convenience
pub use config::{ports, ServerConfig};
pub use error::{Result, ServerError};
pub use health::{health_routes, HealthState, HealthStatus};
pub use http::HttpServer;
pub use middleware::{with_http_middleware, REQUEST_ID_HEADER};
pub use shutdown::ShutdownController;
pub use traits::{Server, ServerExt};
