//! Chat command handling

use std::sync::Arc;
use time::macros::format_description;

use crate::{
    model::{Feed, RenderedMessage},
    ports::{ArticleSource, ChatContext, Clock, FetchError, MessageSink, Summarizer},
    state::Unregistered,
    usecases::check::{CheckError, UpdateChecker},
};

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━";

/// Commands understood by the chat surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    /// Fetch and render the newest release article
    FetchLatest,
    /// Run a reconciliation cycle now
    CheckNow,
    Status,
    Register,
    Unregister,
    Help,
}

impl ChatCommand {
    /// Parse the first word of a chat message, with or without a leading `/`
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let word = word.strip_prefix('/').unwrap_or(word);

        match word {
            "mcbe_news" | "fetch-latest" => Some(Self::FetchLatest),
            "mcbe_check" | "check-now" => Some(Self::CheckNow),
            "mcbe_status" | "status" => Some(Self::Status),
            "mcbe_register" | "register" => Some(Self::Register),
            "mcbe_unregister" | "unregister" => Some(Self::Unregister),
            "mcbe_help" | "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Static facts shown by the status command
#[derive(Debug, Clone, Default)]
pub struct StatusInfo {
    /// Schedule expression as configured
    pub cron: String,
    /// Configured provider selector, if any
    pub llm_provider: Option<String>,
}

/// Handles chat commands against the shared checker and session
pub struct CommandHandler<A, S, M, Cl>
where
    A: ArticleSource + ?Sized,
    S: Summarizer + ?Sized,
    M: MessageSink + ?Sized,
    Cl: Clock + ?Sized,
{
    checker: Arc<UpdateChecker<A, S, M, Cl>>,
    info: StatusInfo,
}

impl<A, S, M, Cl> CommandHandler<A, S, M, Cl>
where
    A: ArticleSource + ?Sized,
    S: Summarizer + ?Sized,
    M: MessageSink + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(checker: Arc<UpdateChecker<A, S, M, Cl>>, info: StatusInfo) -> Self {
        Self { checker, info }
    }

    /// Execute a command; every failure is turned into a short reply
    pub async fn handle(
        &self,
        command: ChatCommand,
        context: &dyn ChatContext,
    ) -> Vec<RenderedMessage> {
        tracing::info!(command = ?command, context = %context.display_key(), "Handling command");

        match command {
            ChatCommand::FetchLatest => self.fetch_latest().await,
            ChatCommand::CheckNow => self.check_now().await,
            ChatCommand::Status => vec![RenderedMessage::plain(self.status().await)],
            ChatCommand::Register => vec![self.register(context).await],
            ChatCommand::Unregister => vec![self.unregister(context).await],
            ChatCommand::Help => vec![RenderedMessage::plain(help_text())],
        }
    }

    async fn fetch_latest(&self) -> Vec<RenderedMessage> {
        let listing = match self.checker.source().fetch_listing(Feed::Release).await {
            Ok(listing) => listing,
            Err(e) => return vec![fetch_failure(&e)],
        };

        let Some(article) = listing.newest() else {
            tracing::warn!("Release listing is empty");
            return vec![RenderedMessage::plain(
                "❌ Failed to fetch the latest article: the listing is empty",
            )];
        };

        tracing::info!(article_id = article.id, title = %article.title, "Fetched latest article");

        let notice = RenderedMessage::plain(format!(
            "Fetching and summarizing the latest MCBE update article...\n📰 {}",
            article.title
        ));
        let rendered = self.checker.renderer().render(Feed::Release, article).await;

        vec![notice, rendered]
    }

    async fn check_now(&self) -> Vec<RenderedMessage> {
        let started = RenderedMessage::plain("🔍 Checking for MCBE updates...");

        let outcome = match self.checker.run_cycle().await {
            Ok(report) => {
                let mut text = format!(
                    "✅ Check complete! Found {} new article(s); new articles are sent to the configured destinations.",
                    report.new_articles.len()
                );
                for (feed, error) in &report.failed_feeds {
                    text.push_str(&format!("\n⚠️ {} feed failed: {}", feed, error));
                }
                text
            }
            Err(CheckError::InProgress) => {
                "⏳ A check is already in progress, please try again later.".to_string()
            }
        };

        vec![started, RenderedMessage::plain(outcome)]
    }

    /// Formatted status report
    pub async fn status(&self) -> String {
        let config = self.checker.config();
        let session = self.checker.session();

        let (seen_count, last_check) = {
            let state = session.reconcile_state().await;
            (state.seen.len(), state.last_check)
        };
        let registered = session.registry().read().await.keys();

        let mut status = format!("📊 MCBE news monitor status\n{}\n\n", DIVIDER);

        status.push_str(&format!(
            "🤖 LLM provider: {}\n",
            self.info.llm_provider.as_deref().unwrap_or("not configured")
        ));

        if registered.is_empty() {
            let legacy = config.legacy_group_ids.trim();
            status.push_str(&format!(
                "📱 Notification groups: {}\n",
                if legacy.is_empty() { "not configured" } else { legacy }
            ));
        } else {
            status.push_str(&format!("📱 Registered chats: {}\n", registered.join(", ")));
        }

        status.push_str(&format!("🧪 Beta monitor: {}\n", on_off(config.enable_beta)));
        status.push_str(&format!(
            "🎮 Release monitor: {}\n",
            on_off(config.enable_release)
        ));
        status.push_str(&format!("⏰ Cron expression: {}\n", self.info.cron));
        status.push_str(&format!("📝 Recorded articles: {}\n", seen_count));
        status.push_str(&format!(
            "🔄 Scheduler: {}\n",
            if session.scheduler_running() {
                "✅ running"
            } else {
                "❌ stopped"
            }
        ));

        let last_check = last_check
            .and_then(|t| {
                t.format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
                ))
                .ok()
            })
            .unwrap_or_else(|| "never".to_string());
        status.push_str(&format!("🕒 Last check: {}\n", last_check));

        status
    }

    async fn register(&self, context: &dyn ChatContext) -> RenderedMessage {
        let key = context.display_key();
        let address = context.primary_address();

        self.checker
            .session()
            .registry()
            .write()
            .await
            .register(key.clone(), address)
            .await;

        RenderedMessage::plain(format!(
            "✅ Registered!\n\nThis chat will receive MCBE update notifications.\nChat key: {}",
            key
        ))
    }

    async fn unregister(&self, context: &dyn ChatContext) -> RenderedMessage {
        let address = context.primary_address();

        let outcome = self
            .checker
            .session()
            .registry()
            .write()
            .await
            .unregister_by_address(&address)
            .await;

        match outcome {
            Unregistered::Removed { .. } => RenderedMessage::plain(
                "✅ Unregistered!\n\nThis chat will no longer receive MCBE update notifications.",
            ),
            Unregistered::NotRegistered => {
                RenderedMessage::plain("ℹ️ This chat is not registered.")
            }
        }
    }
}

fn fetch_failure(error: &FetchError) -> RenderedMessage {
    tracing::error!(error = %error, "Failed to fetch latest article");
    RenderedMessage::plain(format!(
        "❌ Failed to fetch or summarize the latest article: {}",
        error
    ))
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "✅ on" } else { "❌ off" }
}

/// Static help text
pub fn help_text() -> String {
    format!(
        r#"📖 MCBE news monitor help

{DIVIDER}

📌 Commands:

/mcbe_news
Fetch and summarize the latest MCBE release article

/mcbe_register
Register this chat for automatic update notifications
(preferred over configuring group ids)

/mcbe_unregister
Stop update notifications for this chat

/mcbe_check
Check for updates now

/mcbe_status
Show the monitor status

/mcbe_help
Show this help

{DIVIDER}

💡 Tips:
1. Run /mcbe_register in every chat that should receive notifications
2. Configure the LLM provider and feed toggles in config.toml
3. Use /mcbe_check to verify everything works
4. Use /mcbe_status to inspect the current state"#
    )
}
