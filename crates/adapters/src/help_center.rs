//! Help-center article listing client

use async_trait::async_trait;
use mcbe_news_domain::{ArticleListing, ArticleSource, Feed, FetchError};
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BETA_URL: &str = "https://feedback.minecraft.net/api/v2/help_center/en-us/sections/360001185332/articles.json?sort_by=created_at&sort_order=desc";
pub const DEFAULT_RELEASE_URL: &str = "https://feedback.minecraft.net/api/v2/help_center/en-us/sections/360001186971/articles.json?sort_by=created_at&sort_order=desc";

/// Listing endpoints per feed
#[derive(Debug, Clone)]
pub struct HelpCenterConfig {
    pub beta_url: Url,
    pub release_url: Url,
    pub timeout_secs: u64,
}

impl HelpCenterConfig {
    pub fn url_for(&self, feed: Feed) -> &Url {
        match feed {
            Feed::Beta => &self.beta_url,
            Feed::Release => &self.release_url,
        }
    }
}

/// Fetches one page of a feed's listing over HTTP
pub struct HelpCenterClient {
    client: Client,
    config: HelpCenterConfig,
}

impl HelpCenterClient {
    pub fn new(config: HelpCenterConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ArticleSource for HelpCenterClient {
    async fn fetch_listing(&self, feed: Feed) -> Result<ArticleListing, FetchError> {
        let url = self.config.url_for(feed);
        tracing::debug!(feed = %feed, url = %url, "Fetching article listing");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let listing =
            ArticleListing::from_json(&body).map_err(|e| FetchError::Validation(e.to_string()))?;

        tracing::info!(
            feed = %feed,
            articles = listing.articles.len(),
            "Fetched article listing"
        );

        Ok(listing)
    }
}
