//! Provider router dispatching summary requests by provider selector

use async_trait::async_trait;
use mcbe_news_domain::{SummarizeError, Summarizer, SummaryRequest};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Routes each request to the provider it names, or to the default one
pub struct LlmRouter {
    providers: BTreeMap<String, Arc<dyn Summarizer>>,
    default_provider: String,
}

impl LlmRouter {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: normalize(&default_provider.into()),
        }
    }

    pub fn with_provider(mut self, name: &str, summarizer: Arc<dyn Summarizer>) -> Self {
        self.providers.insert(normalize(name), summarizer);
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

#[async_trait]
impl Summarizer for LlmRouter {
    async fn summarize(&self, request: SummaryRequest) -> Result<String, SummarizeError> {
        let name = request
            .provider
            .as_deref()
            .map(normalize)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.default_provider.clone());

        let Some(provider) = self.providers.get(&name) else {
            return Err(SummarizeError::Config(format!(
                "Unknown LLM provider '{}' (configured: {})",
                name,
                self.provider_names().join(", ")
            )));
        };

        tracing::debug!(provider = %name, "Routing summary request");
        provider.summarize(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubSummarizer;

    fn router() -> LlmRouter {
        LlmRouter::new("openai")
            .with_provider("openai", Arc::new(StubSummarizer::with_response("from openai")))
            .with_provider("Ollama", Arc::new(StubSummarizer::with_response("from ollama")))
    }

    fn request(provider: Option<&str>) -> SummaryRequest {
        SummaryRequest {
            prompt: "prompt".to_string(),
            provider: provider.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_missing_selector_uses_default() {
        assert_eq!(
            router().summarize(request(None)).await.unwrap(),
            "from openai"
        );
        assert_eq!(
            router().summarize(request(Some("  "))).await.unwrap(),
            "from openai"
        );
    }

    #[tokio::test]
    async fn test_selector_picks_named_provider() {
        assert_eq!(
            router().summarize(request(Some("ollama"))).await.unwrap(),
            "from ollama"
        );
    }

    #[tokio::test]
    async fn test_unknown_provider_is_a_config_error() {
        let result = router().summarize(request(Some("gemini"))).await;

        match result {
            Err(SummarizeError::Config(msg)) => {
                assert!(msg.contains("gemini"));
                assert!(msg.contains("ollama, openai"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
