use async_trait::async_trait;
use griz_core::SourceError;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Request deadline applied to clients built by this crate.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Downloads the raw bytes behind an image URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

#[async_trait]
impl<T: ImageFetcher + ?Sized> ImageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        (**self).fetch(url).await
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::Request(format!("failed to build HTTP client: {e}")))
}

/// [`ImageFetcher`] over a `reqwest` client. Anything but `200 OK` is an error.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// Wraps an existing client. The client's timeout bounds every download.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self::new(build_client(timeout)?))
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        trace!(url = %url, "Downloading image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Request(format!("GET {url}: {e}")))?;

        if response.status() != StatusCode::OK {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::Request(format!("reading body of {url}: {e}")))?;
        Ok(body.to_vec())
    }
}
