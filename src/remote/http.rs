//! HTTP/HTTPS transport backed by reqwest.

use super::{Transport, decode_body};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// [`Transport`] issuing plain GET requests.
///
/// No timeout is configured: a hung request only stalls the gap it serves.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::InvalidInput(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (proxies, headers, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &Url) -> Result<Value> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
                text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: Bytes = response.bytes().await.map_err(|e| Error::Transport {
            url: url.to_string(),
            message: format!("failed to read HTTP response: {}", e),
        })?;

        decode_body(&body)
    }
}
