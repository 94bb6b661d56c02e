//! Outbox sink writing deliveries to a JSONL file for review or offline runs.

use async_trait::async_trait;
use mcbe_news_domain::model::{RenderedMessage, Segment};
use mcbe_news_domain::ports::{DeliveryError, MessageSink};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct OutboxSink {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl OutboxSink {
    pub async fn open(path: PathBuf) -> Result<Self, OutboxError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: &OutboxEntry<'_>) -> Result<(), OutboxError> {
        let line = serde_json::to_string(entry)?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    written_at: OffsetDateTime,
    target: &'a str,
    segments: &'a [Segment],
}

#[async_trait]
impl MessageSink for OutboxSink {
    async fn deliver(
        &self,
        address: &str,
        message: &RenderedMessage,
    ) -> Result<(), DeliveryError> {
        let entry = OutboxEntry {
            id: Uuid::new_v4(),
            written_at: OffsetDateTime::now_utc(),
            target: address,
            segments: &message.segments,
        };

        self.append(&entry)
            .await
            .map_err(|error| DeliveryError::Io(format!("Outbox write failed: {}", error)))?;

        tracing::debug!(destination = %address, path = %self.path.display(), "Message written to outbox");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "outbox"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    #[tokio::test]
    async fn outbox_sink_appends_one_line_per_delivery() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("out/outbox.jsonl");

        let sink = OutboxSink::open(path.clone()).await.expect("sink");
        let message = RenderedMessage::new(vec![
            Segment::text("📢 Minecraft 1.21.2\n"),
            Segment::image("https://feedback.minecraft.net/a.png"),
            Segment::text("\n"),
        ]);

        sink.deliver("group_555", &message).await.expect("deliver");
        sink.deliver("group_666", &message).await.expect("deliver");

        let contents = tokio::fs::read_to_string(&path).await.expect("read outbox");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: Value = serde_json::from_str(lines[0]).expect("valid json");
        assert_eq!(value["target"], "group_555");
        assert_eq!(value["segments"][0]["type"], "text");
        assert_eq!(value["segments"][1]["type"], "image");
        assert_eq!(
            value["segments"][1]["url"],
            "https://feedback.minecraft.net/a.png"
        );

        let second: Value = serde_json::from_str(lines[1]).expect("valid json");
        assert_eq!(second["target"], "group_666");
    }
}
