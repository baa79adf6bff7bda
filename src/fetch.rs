//! Content Fetcher
//!
//! Fetches JSON content over HTTP with optional read-through caching.
//!
//! The cache is keyed by URL. A cache hit skips the network entirely; a miss
//! fetches, decodes and stores the value. Cache failures never fail a fetch.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::cache::{TtlCache, DEFAULT_TTL_SECS};
use crate::error::FetchError;

// == Fetch Options ==
/// Per-request caching behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Read from and write to the cache
    pub use_cache: bool,
    /// TTL in seconds for the stored response
    pub ttl: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            ttl: DEFAULT_TTL_SECS,
        }
    }
}

impl FetchOptions {
    /// Options that bypass the cache in both directions.
    pub fn no_cache() -> Self {
        Self {
            use_cache: false,
            ..Self::default()
        }
    }

    pub fn with_ttl(ttl: u64) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }
}

// == Content Fetcher ==
/// HTTP JSON fetcher with an optional cache in front of it.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    cache: Option<Arc<TtlCache>>,
}

impl ContentFetcher {
    // == Constructor ==
    pub fn new(client: reqwest::Client, cache: Option<Arc<TtlCache>>) -> Self {
        Self { client, cache }
    }

    /// Returns the attached cache, if any.
    pub fn cache(&self) -> Option<&TtlCache> {
        self.cache.as_deref()
    }

    // == Fetch JSON ==
    /// Fetches `url` and decodes the body as `T`.
    ///
    /// # Errors
    /// - `FetchError::Http` when the request cannot be sent or read
    /// - `FetchError::Status` on a non-success status
    /// - `FetchError::Decode` when the body is not valid JSON for `T`
    pub async fn fetch_json<T>(&self, url: &str, options: FetchOptions) -> Result<T, FetchError>
    where
        T: DeserializeOwned + Serialize,
    {
        let cache = self.cache.as_deref().filter(|_| options.use_cache);

        if let Some(cache) = cache {
            if let Some(cached) = cache.get::<T>(url) {
                debug!(url, "Serving from cache");
                return Ok(cached);
            }
        }

        let data: T = self.fetch_remote(url).await.map_err(|e| {
            error!(url, error = %e, "Error fetching data");
            e
        })?;

        if let Some(cache) = cache {
            if !cache.set(url, &data, Some(options.ttl)) {
                warn!(url, "Fetched data could not be cached");
            }
        }

        Ok(data)
    }

    async fn fetch_remote<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
