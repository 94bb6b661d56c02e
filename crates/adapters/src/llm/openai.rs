//! OpenAI Responses API adapter

use async_trait::async_trait;
use mcbe_news_domain::{SummarizeError, Summarizer, SummaryRequest};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{LlmConfig, SYSTEM_PROMPT, http_client, request_error, with_retries};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI summarizer using the Responses API
pub struct OpenAiSummarizer {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
}

impl OpenAiSummarizer {
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
        let request = OpenAiRequest {
            model: &self.config.model,
            input: prompt,
            instructions: Some(SYSTEM_PROMPT),
            temperature: Some(self.config.temperature),
            max_output_tokens: Some(self.config.max_output_tokens),
        };

        let url = format!("{}/responses", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
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

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .output
            .into_iter()
            .filter(|item| item.r#type == "message")
            .flat_map(|item| item.content)
            .filter(|c| c.r#type == "output_text")
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
struct OpenAiRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    r#type: String,
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Deserialize)]
struct ContentItem {
    r#type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, request: SummaryRequest) -> Result<String, SummarizeError> {
        with_retries("openai", self.config.retries, || {
            self.call_api(&request.prompt)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SummaryRequest {
        SummaryRequest {
            prompt: "Summarize: Minecraft 1.21.2".to_string(),
            provider: None,
        }
    }

    fn summarizer(server: &MockServer, retries: u32) -> OpenAiSummarizer {
        OpenAiSummarizer::with_base_url(
            SecretString::from("test-key".to_string()),
            server.uri(),
            LlmConfig {
                retries,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "input": "Summarize: Minecraft 1.21.2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": [
                    {"type": "reasoning", "content": []},
                    {
                        "type": "message",
                        "content": [
                            {"type": "output_text", "text": "✨ Added the "},
                            {"type": "output_text", "text": "armadillo"}
                        ]
                    }
                ]
            })))
            .mount(&mock_server)
            .await;

        let text = summarizer(&mock_server, 0)
            .summarize(request())
            .await
            .unwrap();

        assert_eq!(text, "✨ Added the armadillo");
    }

    #[tokio::test]
    async fn test_summarize_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = summarizer(&mock_server, 2).summarize(request()).await;

        assert!(matches!(result, Err(SummarizeError::RateLimited)));
    }

    #[tokio::test]
    async fn test_summarize_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
            .mount(&mock_server)
            .await;

        let result = summarizer(&mock_server, 0).summarize(request()).await;

        assert!(matches!(result, Err(SummarizeError::Api(_))));
    }

    #[tokio::test]
    async fn test_empty_output_is_invalid() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"output": []})),
            )
            .mount(&mock_server)
            .await;

        let result = summarizer(&mock_server, 0).summarize(request()).await;

        assert!(matches!(result, Err(SummarizeError::InvalidFormat(_))));
    }
}
