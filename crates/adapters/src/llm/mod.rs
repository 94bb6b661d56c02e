//! LLM provider adapters

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod openai_compat;
pub mod router;
pub mod stub;

pub use anthropic::AnthropicSummarizer;
pub use ollama::OllamaSummarizer;
pub use openai::OpenAiSummarizer;
pub use openai_compat::OpenAiCompatSummarizer;
pub use router::LlmRouter;
pub use stub::StubSummarizer;

use mcbe_news_domain::SummarizeError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// System instruction sent with every summarization request
pub const SYSTEM_PROMPT: &str =
    "You summarize Minecraft Bedrock Edition update articles for a chat audience.";

/// Common LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries on failure
    pub retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_output_tokens: 800,
            timeout_secs: 60,
            retries: 2,
        }
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client, SummarizeError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SummarizeError::Config(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn request_error(error: reqwest::Error) -> SummarizeError {
    if error.is_timeout() {
        SummarizeError::Timeout
    } else {
        SummarizeError::Api(error.to_string())
    }
}

/// Run `call` up to `retries + 1` times with exponential backoff.
/// Rate limiting and configuration errors are returned immediately.
pub(crate) async fn with_retries<F, Fut>(
    provider: &'static str,
    retries: u32,
    mut call: F,
) -> Result<String, SummarizeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, SummarizeError>>,
{
    let mut last_error = None;
    for attempt in 0..=retries {
        if attempt > 0 {
            tracing::warn!(provider, attempt = attempt, "Retrying summarization");
            tokio::time::sleep(Duration::from_millis(500 * 2_u64.pow(attempt))).await;
        }

        match call().await {
            Ok(text) => return Ok(text),
            Err(SummarizeError::RateLimited) => return Err(SummarizeError::RateLimited),
            Err(e @ SummarizeError::Config(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(provider, error = %e, "Summarization attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| SummarizeError::Api("Unknown error".to_string())))
}
