use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::config::AppConfig;
use crate::{Error, Result};

const BOT_USER_AGENT: &str = "Mozilla/5.0 (compatible; AINewz-Bot/1.0; +https://ainewz.ai)";
const FEED_ACCEPT: &str = "application/rss+xml, application/xml, text/xml, application/json, */*";

/// Seam for HTTP access so the pipeline and verifier can be tested
/// without the network.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issue a GET and return the status code with the permissively decoded
    /// body, without treating non-2xx as an error.
    async fn fetch_with_status(&self, url: &str) -> Result<(u16, String)>;

    /// Fetch a URL, returning the body only on a successful status.
    /// Failures are reported through the error; the caller decides what
    /// to log.
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let (status, body) = self.fetch_with_status(url).await?;

        if !(200..300).contains(&status) {
            return Err(Error::Fetch(format!("HTTP {} for URL: {}", status, url)));
        }

        Ok(body)
    }
}

/// HTTP fetcher for feed documents
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a fetcher with the configured request timeout
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.sync.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client })
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BOT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));
        headers
    }
}

#[async_trait]
impl Fetch for FeedFetcher {
    async fn fetch_with_status(&self, url: &str) -> Result<(u16, String)> {
        Url::parse(url)?;

        let response = self
            .client
            .get(url)
            .headers(Self::build_headers())
            .send()
            .await?;

        let status = response.status().as_u16();
        // Invalid bytes are replaced, never fatal
        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok((status, body))
    }
}
