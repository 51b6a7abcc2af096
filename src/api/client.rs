use async_trait::async_trait;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::models::ClientConfig;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("Write error: {0}")]
    Write(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Fetches the raw text of a feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, url: &str) -> Result<String>;
}

/// Streams one media file into a writable sink, returning the bytes written.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn download_to(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent)
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    /// Download file as a chunk stream
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self.get(download_url).await?;

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::Request);

        Ok((total_size, stream))
    }
}

#[async_trait]
impl FeedSource for ApiClient {
    async fn fetch_feed(&self, url: &str) -> Result<String> {
        let body = self.get(url).await?.text().await?;
        debug!(url, bytes = body.len(), "fetched feed");
        Ok(body)
    }
}

#[async_trait]
impl MediaFetcher for ApiClient {
    async fn download_to(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let (total, stream) = self.download_file_stream(url).await?;
        futures::pin_mut!(stream);

        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await.map_err(ApiError::Write)?;
            downloaded += chunk.len() as u64;
        }
        sink.flush().await.map_err(ApiError::Write)?;

        debug!(url, downloaded, total, "download finished");
        Ok(downloaded)
    }
}
