//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use url::Url;

/// One of the independently toggleable article sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    /// Beta and preview builds
    Beta,
    /// Stable releases
    Release,
}

impl Feed {
    /// Feeds in the order a reconciliation cycle visits them
    pub const ALL: [Feed; 2] = [Feed::Beta, Feed::Release];

    pub fn label(&self) -> &'static str {
        match self {
            Feed::Beta => "Beta",
            Feed::Release => "Release",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single help-center article as returned by the listing API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Stable identifier, the sole dedup key
    pub id: u64,
    /// API resource URL
    pub url: Url,
    /// Canonical, human-facing URL
    pub html_url: Url,
    pub author_id: u64,

    pub comments_disabled: bool,
    pub draft: bool,
    pub promoted: bool,

    pub position: i64,
    pub vote_sum: i64,
    pub vote_count: u64,
    pub section_id: u64,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub edited_at: OffsetDateTime,

    pub name: String,
    pub title: String,

    pub source_locale: String,
    pub locale: String,

    pub outdated: bool,
    pub outdated_locales: Vec<String>,

    /// Absent for articles visible to everyone
    pub user_segment_id: Option<u64>,
    pub user_segment_ids: Vec<u64>,

    pub permission_group_id: u64,
    pub content_tag_ids: Vec<u64>,
    pub label_names: Vec<String>,

    /// Raw HTML body
    pub body: String,
}

/// One page of an article listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleListing {
    pub count: u64,
    pub next_page: Option<Url>,
    pub previous_page: Option<Url>,

    pub page: u64,
    pub page_count: u64,
    pub per_page: u64,

    pub sort_by: String,
    pub sort_order: String,

    /// Articles in server order (newest first for the sort we request)
    pub articles: Vec<Article>,
}

impl ArticleListing {
    /// Validate a raw listing document.
    ///
    /// Every declared field must be present and well-typed; only the
    /// pagination cursors and `user_segment_id` may be absent.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// The newest article on this page, if any
    pub fn newest(&self) -> Option<&Article> {
        self.articles.first()
    }
}

/// An article surfaced as new, tagged with the feed it came from
#[derive(Debug, Clone)]
pub struct FeedArticle {
    pub feed: Feed,
    pub article: Article,
}

/// One piece of an outbound chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    Image { url: String },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Segment::Image { url: url.into() }
    }
}

/// An ordered message ready for delivery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub segments: Vec<Segment>,
}

impl RenderedMessage {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// A message consisting of a single text segment
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::text(text)],
        }
    }

    /// Concatenated text segments, ignoring images
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text { text } => Some(text.as_str()),
                Segment::Image { .. } => None,
            })
            .collect()
    }

    /// Image URLs in message order
    pub fn image_urls(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Image { url } => Some(url.as_str()),
                Segment::Text { .. } => None,
            })
            .collect()
    }
}

/// A resolved delivery target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Human-readable key used in logs and status output
    pub key: String,
    /// Opaque address handed to the message sink
    pub address: String,
}

/// Outcome of one reconciliation cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Newly surfaced articles, beta before release, newest first per feed
    pub new_articles: Vec<FeedArticle>,
    /// Feeds whose fetch failed, with the error text
    pub failed_feeds: Vec<(Feed, String)>,
    /// Successful (article, destination) deliveries
    pub delivered: usize,
    /// Failed (article, destination) deliveries
    pub delivery_failures: usize,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a listing document with one article per `(id, body)` pair
    pub fn listing_json(articles: &[(u64, &str)]) -> String {
        let articles: Vec<serde_json::Value> = articles
            .iter()
            .map(|(id, body)| article_json(*id, body))
            .collect();

        serde_json::json!({
            "count": articles.len(),
            "next_page": null,
            "previous_page": null,
            "page": 1,
            "page_count": 1,
            "per_page": 30,
            "sort_by": "created_at",
            "sort_order": "desc",
            "articles": articles,
        })
        .to_string()
    }

    pub fn article_json(id: u64, body: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "url": format!("https://feedback.minecraft.net/api/v2/help_center/en-us/articles/{id}.json"),
            "html_url": format!("https://feedback.minecraft.net/hc/en-us/articles/{id}"),
            "author_id": 42,
            "comments_disabled": true,
            "draft": false,
            "promoted": false,
            "position": 0,
            "vote_sum": -3,
            "vote_count": 7,
            "section_id": 360001186971u64,
            "created_at": "2024-05-01T17:00:00Z",
            "updated_at": "2024-05-02T09:30:00Z",
            "edited_at": "2024-05-02T09:30:00Z",
            "name": format!("Minecraft 1.21.{id}"),
            "title": format!("Minecraft 1.21.{id}"),
            "source_locale": "en-us",
            "locale": "en-us",
            "outdated": false,
            "outdated_locales": [],
            "user_segment_ids": [],
            "permission_group_id": 7,
            "content_tag_ids": [],
            "label_names": ["release"],
            "body": body,
        })
    }

    pub fn listing(articles: &[(u64, &str)]) -> ArticleListing {
        ArticleListing::from_json(&listing_json(articles)).expect("valid fixture")
    }

    pub fn article(id: u64, body: &str) -> Article {
        serde_json::from_value(article_json(id, body)).expect("valid fixture")
    }
}
