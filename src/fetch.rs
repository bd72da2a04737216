use crate::constants::{ACCEPT_LANGUAGE, USER_AGENT};
use crate::error::Result;
use async_trait::async_trait;

/// Boundary to the network layer. Crawlers only ever see this trait; the
/// retry/politeness machinery and the concurrency cap live behind it, and
/// tests substitute canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one page and return its body as text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain reqwest-backed fetcher with a fixed browser identity.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let body = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .send()
            .await?
            .text()
            .await?;
        Ok(body)
    }
}
