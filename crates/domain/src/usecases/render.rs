//! Rendering use case - turns an article into an ordered chat message

use std::sync::Arc;
use time::macros::format_description;
use url::Url;

use crate::{
    model::{Article, Feed, RenderedMessage, Segment},
    ports::Summarizer,
    usecases::{
        extract::{ArticleBody, MAX_IMAGES},
        summarize::{SummarizeConfig, SummarizeUseCase},
    },
};

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━";

/// Configuration for the renderer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Origin that relative image sources are resolved against
    pub base_url: Url,
    /// Maximum images per message
    pub max_images: usize,
    /// Summarization settings
    pub summarize: SummarizeConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://feedback.minecraft.net").expect("static URL is valid"),
            max_images: MAX_IMAGES,
            summarize: SummarizeConfig::default(),
        }
    }
}

/// Renderer producing header, AI summary and inline images
pub struct Renderer<S: ?Sized> {
    summarizer: Arc<S>,
    config: RenderConfig,
}

impl<S: Summarizer + ?Sized> Renderer<S> {
    pub fn new(summarizer: Arc<S>, config: RenderConfig) -> Self {
        Self { summarizer, config }
    }

    /// Render one article. Never fails: summarization errors degrade to an excerpt.
    pub async fn render(&self, feed: Feed, article: &Article) -> RenderedMessage {
        // The parsed document is not Send, keep it out of the await below
        let (plain_text, images) = {
            let body = ArticleBody::parse(&article.body);
            (
                body.plain_text(),
                body.image_urls(&self.config.base_url, self.config.max_images),
            )
        };

        let summary = SummarizeUseCase::new(self.summarizer.as_ref(), &self.config.summarize)
            .summarize(feed, article, &plain_text)
            .await;

        let mut segments = vec![
            Segment::text(format_header(article)),
            Segment::text(format!("📝 AI summary:\n{}\n\n", summary)),
        ];

        for url in &images {
            segments.push(Segment::image(url.clone()));
            segments.push(Segment::text("\n"));
        }

        tracing::info!(
            article_id = article.id,
            feed = %feed,
            images = images.len(),
            "Rendered article"
        );

        RenderedMessage::new(segments)
    }
}

/// Title, timestamp and canonical link block
pub fn format_header(article: &Article) -> String {
    let published = article
        .updated_at
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_default();

    format!(
        "📢 {}\n🗓 Published: {}\n🔗 Link: {}\n{}\n\n",
        article.title, published, article.html_url, DIVIDER
    )
}
