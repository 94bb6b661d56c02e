//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{ArticleListing, Feed, RenderedMessage};

/// Error type for article listing fetches
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout")]
    Timeout,
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid listing: {0}")]
    Validation(String),
}

/// Port for fetching one page of a feed's article listing
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_listing(&self, feed: Feed) -> Result<ArticleListing, FetchError>;
}

/// Input for a summarization call
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// Fully rendered prompt
    pub prompt: String,
    /// Optional provider selector; `None` uses the default provider
    pub provider: Option<String>,
}

/// Error type for summarizer operations
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for LLM-backed summarization
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Return the raw completion text for the prompt
    async fn summarize(&self, request: SummaryRequest) -> Result<String, SummarizeError>;
}

/// Error type for message delivery
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Destination rejected message: {0}")]
    Rejected(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Port for delivering rendered messages to a chat destination
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn deliver(&self, address: &str, message: &RenderedMessage)
    -> Result<(), DeliveryError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// The calling context of a chat command
pub trait ChatContext: Send + Sync {
    /// Opaque address messages for this context are delivered to
    fn primary_address(&self) -> String;

    /// Human-readable key identifying this context
    fn display_key(&self) -> String;
}

/// Error type for durable state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the durable seen-ids document
#[async_trait]
pub trait SeenIdsRepo: Send + Sync {
    /// Read the stored ids; `Ok(None)` when nothing has been stored yet
    async fn load(&self) -> Result<Option<HashSet<u64>>, StateError>;

    /// Replace the stored ids
    async fn save(&self, ids: &HashSet<u64>) -> Result<(), StateError>;
}

/// Port for the durable destinations document
#[async_trait]
pub trait DestinationsRepo: Send + Sync {
    /// Read the stored key -> address mapping; `Ok(None)` when absent
    async fn load(&self) -> Result<Option<BTreeMap<String, String>>, StateError>;

    /// Replace the stored mapping
    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StateError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
