//! Summarization use case

use time::macros::format_description;

use crate::{
    model::{Article, Feed},
    ports::{SummaryRequest, Summarizer},
};

/// Number of plain-text characters kept in the fallback summary
pub const FALLBACK_EXCERPT_CHARS: usize = 200;

/// Configuration for the summarize use case
#[derive(Debug, Clone)]
pub struct SummarizeConfig {
    /// Provider selector forwarded with every request
    pub provider: Option<String>,
    /// Language the summary should be written in
    pub language: String,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            provider: None,
            language: "English".to_string(),
        }
    }
}

/// Use case for summarizing articles
pub struct SummarizeUseCase<'a, S: ?Sized> {
    summarizer: &'a S,
    config: &'a SummarizeConfig,
}

impl<'a, S: Summarizer + ?Sized> SummarizeUseCase<'a, S> {
    pub fn new(summarizer: &'a S, config: &'a SummarizeConfig) -> Self {
        Self { summarizer, config }
    }

    /// Summarize an article, falling back to an excerpt on any failure
    pub async fn summarize(&self, feed: Feed, article: &Article, plain_text: &str) -> String {
        let request = SummaryRequest {
            prompt: build_summary_prompt(feed, article, plain_text, &self.config.language),
            provider: self.config.provider.clone(),
        };

        tracing::info!(
            article_id = article.id,
            provider = ?self.config.provider,
            "Summarizing article"
        );

        match self.summarizer.summarize(request).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!(article_id = article.id, "Summarizer returned empty text");
                fallback_summary(plain_text)
            }
            Err(e) => {
                tracing::error!(article_id = article.id, error = %e, "Summarization failed");
                fallback_summary(plain_text)
            }
        }
    }
}

/// Build the fixed summarization prompt
pub fn build_summary_prompt(
    feed: Feed,
    article: &Article,
    plain_text: &str,
    language: &str,
) -> String {
    let date = article
        .updated_at
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default();

    format!(
        r#"Summarize the following Minecraft Bedrock Edition update article and list the main changes as concise bullet points in {language}.

Release type: {feed}
Title: {title}
Published: {date}

Article content:
{plain_text}

Use bullet points and cover:
✨ Major new features
🔧 Important bug fixes
📌 Other notable changes

Keep it concise, but do not leave out details."#,
        feed = feed.label(),
        title = article.title,
    )
}

/// Summary used when the summarizer cannot produce one
pub fn fallback_summary(plain_text: &str) -> String {
    let excerpt: String = plain_text.chars().take(FALLBACK_EXCERPT_CHARS).collect();
    format!(
        "Unable to generate a summary, please read the original article for details.\n\n{}...",
        excerpt
    )
}
