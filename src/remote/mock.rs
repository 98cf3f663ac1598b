use super::Transport;
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

type Handler = Box<dyn Fn(&Url) -> Result<Value> + Send + Sync>;

/// In-memory transport that records every URL it is asked for.
pub(crate) struct MockTransport {
    handler: Handler,
    urls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub(crate) fn new(handler: impl Fn(&Url) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same document.
    pub(crate) fn json(body: Value) -> Self {
        Self::new(move |_| Ok(body.clone()))
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, url: &Url) -> Result<Value> {
        self.urls.lock().push(url.to_string());
        (self.handler)(url)
    }
}

/// Look up a query parameter by name.
pub(crate) fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
