//! Dependency wiring shared by the run and chat commands

use anyhow::{Context, Result, bail};
use mcbe_news_adapters::{
    help_center::{HelpCenterClient, HelpCenterConfig},
    llm::{
        AnthropicSummarizer, LlmConfig as AdapterLlmConfig, LlmRouter, OllamaSummarizer,
        OpenAiCompatSummarizer, OpenAiSummarizer, StubSummarizer,
    },
    sinks::{OutboxSink, RelaySink},
    state::{JsonDestinationsRepo, JsonSeenIdsRepo},
};
use mcbe_news_domain::{
    ArticleSource, Clock, MessageSink, RenderedMessage, Segment, Summarizer, SystemClock,
    schedule::CronSchedule,
    state::Session,
    usecases::{
        CheckConfig, CommandHandler, RenderConfig, StatusInfo, SummarizeConfig, UpdateChecker,
    },
};
use secrecy::SecretString;
use std::sync::Arc;
use url::Url;

use crate::config::{AppConfig, LlmConfig, SinkKind};

pub type AppChecker =
    UpdateChecker<dyn ArticleSource, dyn Summarizer, dyn MessageSink, dyn Clock>;
pub type AppHandler =
    CommandHandler<dyn ArticleSource, dyn Summarizer, dyn MessageSink, dyn Clock>;

/// Fully wired application
pub struct App {
    pub session: Arc<Session>,
    pub checker: Arc<AppChecker>,
    pub handler: AppHandler,
    pub schedule: CronSchedule,
}

impl App {
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let schedule = CronSchedule::parse(&config.schedule.cron)
            .with_context(|| format!("Invalid schedule.cron '{}'", config.schedule.cron))?;

        let data_dir = &config.general.data_dir;
        let session = Arc::new(
            Session::load(
                Arc::new(JsonSeenIdsRepo::in_dir(data_dir)),
                Arc::new(JsonDestinationsRepo::in_dir(data_dir)),
            )
            .await,
        );

        let source: Arc<dyn ArticleSource> = Arc::new(build_source(config)?);
        let summarizer: Arc<dyn Summarizer> = Arc::new(build_summarizer(&config.llm)?);
        let sink = build_sink(config).await?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        tracing::info!(
            data_dir = %data_dir.display(),
            sink = sink.name(),
            provider = config.llm.effective_provider(),
            cron = %schedule,
            "Application wired"
        );

        let checker = Arc::new(UpdateChecker::new(
            source,
            summarizer,
            sink,
            clock,
            session.clone(),
            check_config(config)?,
        ));

        let handler = CommandHandler::new(
            checker.clone(),
            StatusInfo {
                cron: schedule.to_string(),
                llm_provider: config.llm.provider.clone(),
            },
        );

        Ok(Self {
            session,
            checker,
            handler,
            schedule,
        })
    }
}

pub(crate) fn check_config(config: &AppConfig) -> Result<CheckConfig> {
    let base_url = Url::parse(&config.feeds.base_url)
        .with_context(|| format!("Invalid feeds.base_url '{}'", config.feeds.base_url))?;

    Ok(CheckConfig {
        enable_beta: config.feeds.enable_beta,
        enable_release: config.feeds.enable_release,
        legacy_group_ids: config.delivery.group_ids.clone(),
        render: RenderConfig {
            base_url,
            summarize: SummarizeConfig {
                provider: config.llm.provider.clone(),
                language: config.llm.language.clone(),
            },
            ..Default::default()
        },
    })
}

fn build_source(config: &AppConfig) -> Result<HelpCenterClient> {
    let parse = |value: &str, field: &str| {
        Url::parse(value).with_context(|| format!("Invalid feeds.{} '{}'", field, value))
    };

    let client = HelpCenterClient::new(HelpCenterConfig {
        beta_url: parse(&config.feeds.beta_url, "beta_url")?,
        release_url: parse(&config.feeds.release_url, "release_url")?,
        timeout_secs: config.feeds.timeout_secs,
    })?;

    Ok(client)
}

async fn build_sink(config: &AppConfig) -> Result<Arc<dyn MessageSink>> {
    match config.delivery.sink {
        SinkKind::Outbox => {
            let path = config.delivery.outbox_path(&config.general.data_dir);
            let sink = OutboxSink::open(path.clone())
                .await
                .with_context(|| format!("Failed to open outbox {}", path.display()))?;
            Ok(Arc::new(sink))
        }
        SinkKind::Relay => {
            let relay_url = config.delivery.relay_url.trim();
            if relay_url.is_empty() {
                bail!("delivery.relay_url is required when delivery.sink = \"relay\"");
            }
            let endpoint = Url::parse(relay_url)
                .with_context(|| format!("Invalid delivery.relay_url '{}'", relay_url))?;
            let token = optional_secret(&config.delivery.relay_token_env);
            Ok(Arc::new(RelaySink::new(
                endpoint,
                token,
                config.delivery.relay_timeout_secs,
            )?))
        }
    }
}

fn adapter_llm_config(llm: &LlmConfig, model: &str) -> AdapterLlmConfig {
    AdapterLlmConfig {
        model: model.to_string(),
        temperature: llm.temperature,
        max_output_tokens: llm.max_output_tokens,
        timeout_secs: llm.timeout_secs,
        retries: llm.retries,
    }
}

/// Register every provider that can be constructed from the configuration.
///
/// Providers missing credentials are left out; requests naming them fail
/// with a configuration error and fall back to the excerpt summary.
pub(crate) fn build_summarizer(llm: &LlmConfig) -> Result<LlmRouter> {
    let mut router = LlmRouter::new(&llm.default_provider)
        .with_provider("stub", Arc::new(StubSummarizer::offline()));

    match load_api_key(&llm.openai.api_key_env, "openai") {
        Ok(api_key) => {
            let summarizer = OpenAiSummarizer::with_base_url(
                api_key,
                llm.openai.base_url.clone(),
                adapter_llm_config(llm, &llm.openai.model),
            )?;
            router = router.with_provider("openai", Arc::new(summarizer));
        }
        Err(e) => tracing::debug!(error = %e, "OpenAI provider not configured"),
    }

    match load_api_key(&llm.anthropic.api_key_env, "anthropic") {
        Ok(api_key) => {
            let summarizer = AnthropicSummarizer::with_base_url(
                api_key,
                llm.anthropic.base_url.clone(),
                adapter_llm_config(llm, &llm.anthropic.model),
            )?;
            router = router.with_provider("anthropic", Arc::new(summarizer));
        }
        Err(e) => tracing::debug!(error = %e, "Anthropic provider not configured"),
    }

    let ollama_url = llm.ollama.base_url.trim();
    if !ollama_url.is_empty() {
        let summarizer = OllamaSummarizer::with_base_url(
            ollama_url.to_string(),
            adapter_llm_config(llm, &llm.ollama.model),
        )?;
        router = router.with_provider("ollama", Arc::new(summarizer));
    }

    let compat_url = llm.openai_compat.base_url.trim();
    if !compat_url.is_empty() {
        let summarizer = OpenAiCompatSummarizer::new(
            optional_secret(&llm.openai_compat.api_key_env),
            compat_url.to_string(),
            adapter_llm_config(llm, &llm.openai_compat.model),
        )?;
        router = router.with_provider("openai_compat", Arc::new(summarizer));
    }

    let active = llm.effective_provider().to_ascii_lowercase();
    if !router.provider_names().contains(&active.as_str()) {
        tracing::warn!(
            provider = %active,
            available = ?router.provider_names(),
            "Selected LLM provider is not available, summaries will use the fallback excerpt"
        );
    }

    Ok(router)
}

pub(crate) fn load_api_key(env_var: &str, provider: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No API key env var configured for provider {}", provider);
    }

    let key = std::env::var(env_var).with_context(|| {
        format!(
            "Missing API key env var {} for provider {}",
            env_var, provider
        )
    })?;

    if key.trim().is_empty() {
        bail!(
            "API key env var {} is empty for provider {}",
            env_var,
            provider
        );
    }

    Ok(SecretString::from(key))
}

fn optional_secret(env_var: &str) -> Option<SecretString> {
    if env_var.trim().is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Console rendering of a message: text as-is, images as `[image] <url>` lines
pub fn format_for_console(message: &RenderedMessage) -> String {
    message
        .segments
        .iter()
        .map(|segment| match segment {
            Segment::Text { text } => text.clone(),
            Segment::Image { url } => format!("[image] {}", url),
        })
        .collect()
}
