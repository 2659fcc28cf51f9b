//! Upstream tile retrieval.

use async_trait::async_trait;
use bytes::Bytes;
use raster_common::{RasterError, RasterResult};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Retrieves raw tile bytes from a resolved tile URL.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> RasterResult<Bytes>;
}

/// `TileFetcher` over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> RasterResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RasterError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> RasterResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RasterError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RasterError::Fetch(format!("{}: HTTP {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RasterError::Fetch(format!("{}: {}", url, e)))?;

        debug!(url = %url, bytes = body.len(), "Fetched tile");
        Ok(body)
    }
}
