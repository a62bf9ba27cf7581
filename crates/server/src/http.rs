//! HTTP server implementation using Axum
//!
//! [`HttpServer`] serves a router behind the standard middleware stack and
//! implements the [`Server`](crate::Server) lifecycle.

use async_trait::async_trait;
use axum::Router;
use observability::HttpMetrics;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::middleware::with_http_middleware;
use crate::traits::Server;

/// HTTP server
///
/// # Example
///
/// ```ignore
/// use server::{HttpServer, ServerConfig, ServerExt};
///
/// let server = HttpServer::new(ServerConfig::default(), router);
/// server.run_until_signal().await?;
/// ```
#[derive(Clone)]
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    running: Arc<AtomicBool>,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl HttpServer {
    /// Create a server for `router`, wrapped in the middleware stack
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let router = with_http_middleware(router, HttpMetrics::new("http"));
        Self {
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
            bound_addr: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        "http"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let result = self.serve(shutdown_token).await;

        self.running.store(false, Ordering::SeqCst);
        *self.bound_addr.write() = None;
        result
    }
}

impl HttpServer {
    async fn serve(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.config.http_addr()?;

        info!(%addr, "Starting HTTP server");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;
        let local_addr = listener.local_addr().map_err(ServerError::Io)?;
        *self.bound_addr.write() = Some(local_addr);

        info!(%local_addr, "HTTP server listening");

        let graceful_token = shutdown_token.clone();
        let router = self.router.clone();
        let serve = async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    graceful_token.cancelled().await;
                    info!("HTTP server received shutdown signal");
                })
                .await
        };

        // Connections still open past the drain deadline are dropped
        let shutdown_timeout = self.config.shutdown_timeout;
        let drain_deadline = async move {
            shutdown_token.cancelled().await;
            tokio::time::sleep(shutdown_timeout).await;
        };

        tokio::select! {
            result = serve => match result {
                Ok(()) => {
                    info!("HTTP server shutdown complete");
                    Ok(())
                }
                Err(e) => {
                    error!(%e, "HTTP server error");
                    Err(ServerError::Io(e))
                }
            },
            _ = drain_deadline => {
                warn!(timeout = ?shutdown_timeout, "Timed out draining HTTP connections");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ServerExt;
    use axum::routing::get;
    use std::time::Duration;

    fn server() -> HttpServer {
        let router = Router::new().route("/", get(|| async { "relay" }));
        HttpServer::new(ServerConfig::ephemeral(), router)
    }

    #[tokio::test]
    async fn test_http_server_binds_and_shuts_down() {
        let server = server();
        let probe = server.clone();
        let (handle, token) = server.spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(probe.is_running());
        assert!(probe.address().is_some());

        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "Server should shutdown within timeout");
        assert!(!probe.is_running());
        assert!(probe.address().is_none());
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = HttpServer::new(
            ServerConfig::new("127.0.0.1", port),
            Router::new().route("/", get(|| async { "relay" })),
        );
        let result = server.run(CancellationToken::new()).await;

        assert!(matches!(result, Err(ServerError::BindError { .. })));
        assert!(!server.is_running());
    }

    #[test]
    fn test_http_server_name() {
        assert_eq!(server().name(), "http");
    }
}
