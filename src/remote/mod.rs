//! Chunked fetching of range-scoped JSON from a remote endpoint.
//!
//! [`RemoteRequest`] turns a `(contig, start, stop, options)` request into a
//! parsed JSON response and remembers every span it has fetched, so a later
//! request inside an already-fetched span never reaches the network.
//!
//! The network itself sits behind the [`Transport`] trait; [`HttpTransport`]
//! is the reqwest-backed implementation.
//!
//! ```text
//! GET <base_url>/<contig>?start=<start>&end=<stop>[&binning=<n>][&pageToken=<t>]
//! ```

#[cfg(feature = "http")]
mod http;
#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "http")]
pub use http::HttpTransport;

use crate::cache::Resolution;
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Requests spanning more than this are refused without touching the network.
pub const MAX_REQUEST_SPAN: u64 = 50_000_000;

/// Typed query options appended to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Ask the server to aggregate records into bins of this size.
    pub binning: Option<Resolution>,
    /// Continuation token from the previous page of a paged response.
    pub page_token: Option<String>,
}

impl FetchOptions {
    pub fn binned(resolution: Resolution) -> Self {
        Self {
            binning: Some(resolution),
            page_token: None,
        }
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}

/// Black-box GET of a JSON document.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and decode its JSON body.
    ///
    /// Implementations fail on connection errors and on HTTP status >= 400.
    /// An empty body decodes to [`Value::Null`].
    async fn get_json(&self, url: &Url) -> Result<Value>;
}

/// Decode a response body, treating an empty body as `null`.
pub fn decode_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}

/// A previously satisfied request, keyed by the span that was asked for.
#[derive(Debug)]
struct Chunk {
    start: u64,
    stop: u64,
    options: FetchOptions,
    response: Arc<Value>,
}

impl Chunk {
    fn satisfies(&self, start: u64, stop: u64, options: &FetchOptions) -> bool {
        self.start <= start && stop <= self.stop && &self.options == options
    }
}

/// Range-request client for one endpoint, with its own chunk cache.
pub struct RemoteRequest {
    base_url: Url,
    transport: Arc<dyn Transport>,
    chunks: Mutex<Vec<Chunk>>,
    num_network_requests: AtomicUsize,
}

impl RemoteRequest {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidInput(format!("invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidInput(format!(
                "base URL cannot have path segments: {}",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            transport,
            chunks: Mutex::new(Vec::new()),
            num_network_requests: AtomicUsize::new(0),
        })
    }

    /// Create a client that talks HTTP through reqwest.
    #[cfg(feature = "http")]
    pub fn http(base_url: &str) -> Result<Self> {
        Self::new(base_url, Arc::new(HttpTransport::new()?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch `[start, stop]` on `contig`.
    ///
    /// Fails without a network call when `stop <= start`. If a cached chunk
    /// fetched with the same options encloses the span, its response is
    /// returned as-is; callers select the records they need.
    pub async fn get(
        &self,
        contig: &str,
        start: u64,
        stop: u64,
        options: &FetchOptions,
    ) -> Result<Arc<Value>> {
        if stop <= start {
            return Err(Error::InvalidRange(format!(
                "requested <= 0 units ({}-{}) from {}",
                start, stop, self.base_url
            )));
        }

        if let Some(response) = self.get_from_cache(start, stop, options) {
            tracing::debug!(contig, start, stop, "chunk cache hit");
            return Ok(response);
        }

        self.get_from_network(contig, start, stop, options).await
    }

    fn get_from_cache(&self, start: u64, stop: u64, options: &FetchOptions) -> Option<Arc<Value>> {
        self.chunks
            .lock()
            .iter()
            .find(|chunk| chunk.satisfies(start, stop, options))
            .map(|chunk| Arc::clone(&chunk.response))
    }

    /// Build `<base>/<contig>?start=..&end=..` plus any options.
    pub fn endpoint(
        &self,
        contig: &str,
        start: u64,
        stop: u64,
        options: &FetchOptions,
    ) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push(contig);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("start", &start.to_string())
                .append_pair("end", &stop.to_string());
            if let Some(binning) = options.binning {
                query.append_pair("binning", &binning.to_string());
            }
            if let Some(token) = &options.page_token {
                query.append_pair("pageToken", token);
            }
        }

        Ok(url)
    }

    async fn get_from_network(
        &self,
        contig: &str,
        start: u64,
        stop: u64,
        options: &FetchOptions,
    ) -> Result<Arc<Value>> {
        let span = stop - start;
        if span > MAX_REQUEST_SPAN {
            return Err(Error::RequestTooLarge {
                url: self.base_url.to_string(),
                span,
            });
        }

        let url = self.endpoint(contig, start, stop, options)?;
        self.num_network_requests.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%url, "fetching from network");

        let json = self.transport.get_json(&url).await?;
        if json.get("errorCode").is_some() {
            return Err(Error::Server {
                url: url.to_string(),
                body: json.to_string(),
            });
        }

        // Keyed by the requested span: a short response still stands for it.
        let response = Arc::new(json);
        self.chunks.lock().push(Chunk {
            start,
            stop,
            options: options.clone(),
            response: Arc::clone(&response),
        });

        Ok(response)
    }

    /// Requests that actually went to the transport.
    pub fn num_network_requests(&self) -> usize {
        self.num_network_requests.load(Ordering::SeqCst)
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn clear_cache(&self) {
        self.chunks.lock().clear();
    }
}
