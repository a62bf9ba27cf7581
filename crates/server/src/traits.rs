//! Server traits
//!
//! [`Server`] is the lifecycle contract of every server; [`ServerExt`] adds
//! spawning and signal-driven runs on top of it.

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Core server trait.
///
/// # Implementors
///
/// - [`HttpServer`](crate::http::HttpServer) - HTTP server using Axum
///
/// # Example
///
/// ```ignore
/// use server::{HttpServer, Server, ServerConfig, ServerExt};
///
/// let server = HttpServer::new(ServerConfig::default(), router);
/// server.run_until_signal().await?;
/// ```
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Server name for logging
    fn name(&self) -> &str;

    /// Bound address, `None` until the server is listening
    fn address(&self) -> Option<SocketAddr>;

    fn is_running(&self) -> bool;

    /// Run until `shutdown` is cancelled.
    ///
    /// Binds, serves, and once cancelled stops accepting connections and
    /// drains in-flight requests before returning `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or hits a fatal I/O error.
    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

/// Convenience methods, implemented for every [`Server`]
pub trait ServerExt: Server + Sized {
    /// Spawn the server on a new task.
    ///
    /// Returns the task handle and the token that stops it.
    fn spawn(self) -> (tokio::task::JoinHandle<Result<()>>, CancellationToken) {
        let token = CancellationToken::new();
        let token_clone = token.clone();
        let handle = tokio::spawn(async move { self.run(token_clone).await });
        (handle, token)
    }

    /// Run until Ctrl+C or SIGTERM
    fn run_until_signal(self) -> impl std::future::Future<Output = Result<()>> + Send {
        async move {
            let shutdown = crate::shutdown::ShutdownController::with_signals();
            self.run(shutdown.token()).await
        }
    }
}

impl<T: Server + Sized> ServerExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct IdleServer;

    #[async_trait]
    impl Server for IdleServer {
        fn name(&self) -> &str {
            "idle"
        }

        fn address(&self) -> Option<SocketAddr> {
            None
        }

        fn is_running(&self) -> bool {
            false
        }

        async fn run(&self, shutdown: CancellationToken) -> Result<()> {
            shutdown.cancelled().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_server_ext_spawn() {
        let (handle, token) = IdleServer.spawn();

        token.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(1), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
