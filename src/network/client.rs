use crate::config::constants::PAGE_TIMEOUT_MS;
use crate::network::errors::NetworkError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

// * A source of raw page markup. One call is one GET for one page URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, NetworkError>;
}

// * Plain HTTP fetcher: no custom headers, no cookies carried between pages.
pub struct HttpFetcher {
    inner: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_timeout(Duration::from_millis(PAGE_TIMEOUT_MS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { inner: client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    // * Fetches a URL and returns the body; non-2xx and empty bodies are transient failures.
    async fn fetch(&self, url: &str) -> Result<String, NetworkError> {
        let parsed = Url::parse(url).map_err(|_| NetworkError::InvalidUrl(url.to_string()))?;

        let resp = self.inner.get(parsed).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(NetworkError::HttpStatus(status.as_u16()));
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(NetworkError::EmptyResponse);
        }

        Ok(body)
    }
}
