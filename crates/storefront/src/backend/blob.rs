//! Retrieval of order attachments.

use std::sync::Arc;
use std::time::Duration;

use cardshop_core::ExternalBlob;
use tracing::{debug, instrument};

use super::{BackendError, BackendResult};

/// Largest remote attachment the resolver will download.
pub const MAX_BLOB_BYTES: usize = 10 * 1024 * 1024;

/// Attachment content ready to be served.
#[derive(Debug, Clone)]
pub struct ResolvedBlob {
    /// MIME type of the content.
    pub content_type: String,
    /// Raw content.
    pub bytes: Arc<[u8]>,
}

/// Fetches the bytes behind an [`ExternalBlob`].
///
/// Inline blobs resolve immediately; URL blobs are downloaded.
#[derive(Clone)]
pub struct BlobResolver {
    client: reqwest::Client,
}

impl BlobResolver {
    /// Create a resolver whose downloads time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> BackendResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    /// Content and MIME type of `blob`.
    ///
    /// # Errors
    ///
    /// Returns an error if a remote blob cannot be downloaded or exceeds
    /// [`MAX_BLOB_BYTES`].
    #[instrument(skip(self, blob))]
    pub async fn resolve(&self, blob: &ExternalBlob) -> BackendResult<ResolvedBlob> {
        match blob {
            ExternalBlob::Bytes(bytes) => Ok(ResolvedBlob {
                content_type: blob.content_type().to_string(),
                bytes: Arc::clone(bytes),
            }),
            ExternalBlob::Url(url) => self.download(url).await,
        }
    }

    async fn download(&self, url: &str) -> BackendResult<ResolvedBlob> {
        debug!(url = %url, "Downloading attachment");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response.bytes().await?;
        if bytes.len() > MAX_BLOB_BYTES {
            return Err(BackendError::Rejected(format!(
                "Attachment exceeds {} MB",
                MAX_BLOB_BYTES / (1024 * 1024)
            )));
        }

        Ok(ResolvedBlob {
            content_type,
            bytes: Arc::from(bytes.as_ref()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inline_blob_resolves_without_network() {
        let resolver = BlobResolver::new(Duration::from_secs(1)).unwrap();
        let png = ExternalBlob::from_bytes(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A]);

        let resolved = resolver.resolve(&png).await.unwrap();
        assert_eq!(resolved.content_type, "image/png");
        assert_eq!(resolved.bytes.len(), 6);
    }

    #[tokio::test]
    async fn test_unreachable_url_is_transient() {
        let resolver = BlobResolver::new(Duration::from_millis(200)).unwrap();
        let err = resolver
            .resolve(&ExternalBlob::from_url("http://127.0.0.1:9/photo.jpg"))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
