//! Ollama local LLM adapter

use async_trait::async_trait;
use mcbe_news_domain::{SummarizeError, Summarizer, SummaryRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{LlmConfig, SYSTEM_PROMPT, http_client, request_error, with_retries};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Summarizer backed by a local Ollama server
pub struct OllamaSummarizer {
    client: Client,
    base_url: String,
    config: LlmConfig,
}

impl OllamaSummarizer {
    pub fn new(config: LlmConfig) -> Result<Self, SummarizeError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(base_url: String, config: LlmConfig) -> Result<Self, SummarizeError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url,
            config,
        })
    }

    async fn call_api(&self, prompt: &str) -> Result<String, SummarizeError> {
        let request = OllamaRequest {
            model: &self.config.model,
            prompt,
            system: Some(SYSTEM_PROMPT),
            stream: false,
            options: Some(OllamaOptions {
                temperature: Some(self.config.temperature),
                num_predict: Some(self.config.max_output_tokens as i32),
            }),
        };

        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::InvalidFormat(e.to_string()))?;

        if api_response.response.trim().is_empty() {
            return Err(SummarizeError::InvalidFormat("Empty response".to_string()));
        }

        Ok(api_response.response)
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, request: SummaryRequest) -> Result<String, SummarizeError> {
        with_retries("ollama", self.config.retries, || {
            self.call_api(&request.prompt)
        })
        .await
    }
}
