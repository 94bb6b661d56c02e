//! Anthropic Messages API adapter

use async_trait::async_trait;
use mcbe_news_domain::{SummarizeError, Summarizer, SummaryRequest};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{LlmConfig, SYSTEM_PROMPT, http_client, request_error, with_retries};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

pub struct AnthropicSummarizer {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
}

impl AnthropicSummarizer {
    pub fn new(api_key: SecretString, config: LlmConfig) -> Result<Self, SummarizeError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(
        api_key: SecretString,
        base_url: String,
        config: LlmConfig,
    ) -> Result<Self, SummarizeError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key,
            base_url,
            config,
        })
    }

    async fn call_api(&self, prompt: &str) -> Result<String, SummarizeError> {
        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_output_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            system: Some(SYSTEM_PROMPT),
            temperature: Some(self.config.temperature),
        };

        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(request_error)?;

        if response.status() == 429 {
            return Err(SummarizeError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .content
            .into_iter()
            .filter(|c| c.r#type == "text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(SummarizeError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    r#type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Summarizer for AnthropicSummarizer {
    async fn summarize(&self, request: SummaryRequest) -> Result<String, SummarizeError> {
        with_retries("anthropic", self.config.retries, || {
            self.call_api(&request.prompt)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summarizer(server: &MockServer) -> AnthropicSummarizer {
        AnthropicSummarizer::with_base_url(
            SecretString::from("anthropic-key".to_string()),
            server.uri(),
            LlmConfig {
                model: "claude-3-5-haiku-latest".to_string(),
                retries: 0,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn request() -> SummaryRequest {
        SummaryRequest {
            prompt: "prompt".to_string(),
            provider: Some("anthropic".to_string()),
        }
    }

    #[tokio::test]
    async fn test_text_blocks_are_joined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "anthropic-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "text", "text": "📌 Realms "},
                    {"type": "text", "text": "update"}
                ]
            })))
            .mount(&server)
            .await;

        let text = summarizer(&server).summarize(request()).await.unwrap();

        assert_eq!(text, "📌 Realms update");
    }

    #[tokio::test]
    async fn test_overloaded_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let result = summarizer(&server).summarize(request()).await;

        assert!(matches!(result, Err(SummarizeError::Api(msg)) if msg.contains("overloaded")));
    }
}
