//! Remote document fetching.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{PolicyError, Result};

/// Request timeout for every remote fetch.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetches remote rule documents.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch the body at `url`, failing with [`PolicyError::SourceTooLarge`]
    /// once it exceeds `max_bytes`.
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>>;
}

/// HTTPS fetcher backed by `reqwest` with rustls.
///
/// Certificate chain and hostname validation are always on; there is no
/// insecure fallback. Non-2xx responses are transport errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| PolicyError::Transport {
                origin: "http client".to_string(),
                error,
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>> {
        let transport = |error| PolicyError::Transport {
            origin: url.to_string(),
            error,
        };
        let too_large = |size| PolicyError::SourceTooLarge {
            origin: url.to_string(),
            size,
            limit: max_bytes,
        };

        if url.starts_with("http://") {
            warn!(url = %url, "fetching rules over plain http");
        }
        info!(url = %url, "fetching remote rules");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(transport)?;

        if let Some(announced) = response.content_length() {
            if announced > max_bytes {
                return Err(too_large(announced));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(transport)? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > max_bytes {
                return Err(too_large(body.len() as u64));
            }
        }

        Ok(body)
    }
}
