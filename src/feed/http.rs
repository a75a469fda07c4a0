use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;

use super::{parse::parse_feed, FeedReader, FeedSource, Item};
use crate::error::{ConfigError, FeedError};

const FEED_ACCEPT: &str = "application/rss+xml, application/xml;q=0.9, */*;q=0.8";
const FEED_USER_AGENT: &str = "writeup-notifier/0.1";

/// Fetches feeds over plain HTTP(S). Never goes through the Telegram proxy.
pub struct HttpFeedReader {
    client: Client,
}

impl HttpFeedReader {
    pub fn new() -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FeedReader for HttpFeedReader {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<Item>, FeedError> {
        let resp = self
            .client
            .get(&source.url)
            .header(USER_AGENT, FEED_USER_AGENT)
            .header(ACCEPT, FEED_ACCEPT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        let items = parse_feed(&body, source.kind)?;
        tracing::debug!(feed = %source.url, items = items.len(), "feed parsed");
        Ok(items)
    }
}
