//! HTTP relay sink
//!
//! Posts `{"target": ..., "segments": [...]}` to a bot-side relay endpoint
//! which forwards the message to the chat platform.

use async_trait::async_trait;
use mcbe_news_domain::model::{RenderedMessage, Segment};
use mcbe_news_domain::ports::{DeliveryError, MessageSink};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use url::Url;

pub struct RelaySink {
    client: Client,
    endpoint: Url,
    token: Option<SecretString>,
}

impl RelaySink {
    pub fn new(
        endpoint: Url,
        token: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DeliveryError::Api(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    target: &'a str,
    segments: &'a [Segment],
}

#[async_trait]
impl MessageSink for RelaySink {
    async fn deliver(
        &self,
        address: &str,
        message: &RenderedMessage,
    ) -> Result<(), DeliveryError> {
        let request = RelayRequest {
            target: address,
            segments: &message.segments,
        };

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.token {
            builder = builder.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            );
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DeliveryError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected(format!(
                "relay returned {}: {}",
                status, body
            )));
        }

        tracing::debug!(destination = %address, "Message accepted by relay");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> RenderedMessage {
        RenderedMessage::new(vec![
            Segment::text("📢 Minecraft 1.21.2\n"),
            Segment::image("https://feedback.minecraft.net/a.png"),
        ])
    }

    fn sink_for(server: &MockServer, token: Option<&str>) -> RelaySink {
        let endpoint = Url::parse(&format!("{}/send", server.uri())).unwrap();
        RelaySink::new(endpoint, token.map(|t| SecretString::from(t.to_string())), 5).unwrap()
    }

    #[tokio::test]
    async fn test_posts_target_and_segments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("Authorization", "Bearer relay-key"))
            .and(body_json(serde_json::json!({
                "target": "qq:GroupMessage:123",
                "segments": [
                    {"type": "text", "text": "📢 Minecraft 1.21.2\n"},
                    {"type": "image", "url": "https://feedback.minecraft.net/a.png"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        sink_for(&server, Some("relay-key"))
            .deliver("qq:GroupMessage:123", &message())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("unknown target"))
            .mount(&server)
            .await;

        let result = sink_for(&server, None).deliver("group_1", &message()).await;

        match result {
            Err(DeliveryError::Rejected(msg)) => assert!(msg.contains("unknown target")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
