//! Blob storage - trait and implementations

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::BlobError;

/// Blob content, read chunk by chunk
pub type BlobStream = Pin<Box<dyn Stream<Item = Result<Bytes, BlobError>> + Send>>;

/// Storage holding content devices chose not to return inline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Open the blob at `blob_url`, stored on behalf of `device_id`.
    ///
    /// The returned stream must not be buffered into memory up front.
    async fn open_file(&self, device_id: &str, blob_url: &str) -> Result<BlobStream, BlobError>;
}

// ==================== In-Memory Implementation ====================

/// Default chunk size served by [`InMemoryBlobStorage`]
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Blob storage keeping content in memory, keyed by blob url
#[derive(Clone)]
pub struct InMemoryBlobStorage {
    blobs: Arc<RwLock<HashMap<String, Bytes>>>,
    chunk_size: usize,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Serve content in chunks of at most `chunk_size` bytes
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn insert(&self, blob_url: impl Into<String>, content: impl Into<Bytes>) {
        self.blobs.write().insert(blob_url.into(), content.into());
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl Default for InMemoryBlobStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn open_file(&self, device_id: &str, blob_url: &str) -> Result<BlobStream, BlobError> {
        let content = self
            .blobs
            .read()
            .get(blob_url)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(blob_url.to_string()))?;

        tracing::debug!(device_id, blob_url, size = content.len(), "Serving in-memory blob");

        let chunk_size = self.chunk_size;
        let chunks: Vec<Result<Bytes, BlobError>> = (0..content.len())
            .step_by(chunk_size)
            .map(|start| Ok(content.slice(start..(start + chunk_size).min(content.len()))))
            .collect();

        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

// ==================== HTTP Implementation ====================

#[cfg(feature = "client")]
pub mod http {
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use reqwest::{Client, StatusCode};
    use std::time::Duration;
    use tracing::{debug, warn};
    use url::Url;

    use super::{BlobStorage, BlobStream};
    use crate::error::BlobError;

    /// Blob storage reading blobs over HTTP(S), typically pre-signed urls
    #[derive(Clone)]
    pub struct HttpBlobStorage {
        client: Client,
        allowed_schemes: Vec<String>,
    }

    impl HttpBlobStorage {
        /// Create a blob reader.
        ///
        /// `connect_timeout` bounds connection setup only, so long downloads
        /// keep streaming.
        pub fn new(connect_timeout: Option<Duration>, allowed_schemes: Vec<String>) -> Result<Self, BlobError> {
            let mut builder = Client::builder();
            if let Some(timeout) = connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            let client = builder
                .build()
                .map_err(|e| BlobError::Unavailable(format!("failed to build http client: {}", e)))?;

            Ok(Self {
                client,
                allowed_schemes: allowed_schemes
                    .into_iter()
                    .map(|s| s.to_ascii_lowercase())
                    .collect(),
            })
        }

        fn parse_url(&self, blob_url: &str) -> Result<Url, BlobError> {
            let url = Url::parse(blob_url).map_err(|e| BlobError::InvalidUrl(format!("{}: {}", blob_url, e)))?;
            if !self.allowed_schemes.iter().any(|s| s == url.scheme()) {
                return Err(BlobError::InvalidUrl(format!(
                    "{}: scheme '{}' not allowed",
                    blob_url,
                    url.scheme()
                )));
            }
            Ok(url)
        }
    }

    #[async_trait]
    impl BlobStorage for HttpBlobStorage {
        async fn open_file(&self, device_id: &str, blob_url: &str) -> Result<BlobStream, BlobError> {
            let url = self.parse_url(blob_url)?;
            debug!(device_id, %url, "Opening blob");

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| BlobError::Unavailable(format!("{}: {}", blob_url, e)))?;

            match response.status() {
                status if status.is_success() => {}
                StatusCode::NOT_FOUND => return Err(BlobError::NotFound(blob_url.to_string())),
                status => {
                    warn!(device_id, blob_url, %status, "Blob storage returned an error");
                    return Err(BlobError::Unavailable(format!("{}: status {}", blob_url, status)));
                }
            }

            let stream = response
                .bytes_stream()
                .map_err(|e| BlobError::Unavailable(format!("blob stream interrupted: {}", e)));

            Ok(Box::pin(stream))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use assert_matches::assert_matches;

        fn storage() -> HttpBlobStorage {
            HttpBlobStorage::new(None, vec!["https".into(), "HTTP".into()]).unwrap()
        }

        #[test]
        fn test_parse_url_accepts_allowed_schemes() {
            assert!(storage().parse_url("https://blobs.local/d1/a.png").is_ok());
            assert!(storage().parse_url("http://blobs.local/d1/a.png").is_ok());
        }

        #[tokio::test]
        async fn test_open_file_rejects_bad_urls() {
            assert_matches!(
                storage().open_file("d1", "not a url").await.map(|_| ()),
                Err(BlobError::InvalidUrl(_))
            );
            assert_matches!(
                storage().open_file("d1", "file:///etc/passwd").await.map(|_| ()),
                Err(BlobError::InvalidUrl(_))
            );
        }
    }
}
