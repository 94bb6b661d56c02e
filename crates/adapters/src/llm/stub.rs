//! Stub summarizer for testing and offline mode

use async_trait::async_trait;
use mcbe_news_domain::{SummarizeError, Summarizer, SummaryRequest};

/// Stub summarizer that returns configurable responses
pub struct StubSummarizer {
    response: Option<String>,
    error: Option<SummarizeError>,
}

impl StubSummarizer {
    /// Create a stub that returns a fixed offline summary
    pub fn offline() -> Self {
        Self::with_response("• Summary unavailable in offline mode")
    }

    /// Create a stub that returns a specific response
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            error: None,
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: SummarizeError) -> Self {
        Self {
            response: None,
            error: Some(error),
        }
    }

    /// Create a stub that echoes the first line of the prompt
    pub fn echo() -> Self {
        Self {
            response: None,
            error: None,
        }
    }
}

impl Default for StubSummarizer {
    fn default() -> Self {
        Self::offline()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, request: SummaryRequest) -> Result<String, SummarizeError> {
        if let Some(ref error) = self.error {
            return Err(match error {
                SummarizeError::Api(msg) => SummarizeError::Api(msg.clone()),
                SummarizeError::InvalidFormat(msg) => SummarizeError::InvalidFormat(msg.clone()),
                SummarizeError::RateLimited => SummarizeError::RateLimited,
                SummarizeError::Timeout => SummarizeError::Timeout,
                SummarizeError::Config(msg) => SummarizeError::Config(msg.clone()),
            });
        }

        if let Some(ref response) = self.response {
            return Ok(response.clone());
        }

        let first_line = request.prompt.lines().next().unwrap_or_default();
        Ok(format!("• {}", first_line))
    }
}
