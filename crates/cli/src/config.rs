//! Configuration loading and management

use anyhow::{Context, Result};
use mcbe_news_adapters::help_center::{DEFAULT_BETA_URL, DEFAULT_RELEASE_URL};
use mcbe_news_domain::schedule::DEFAULT_CRON;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides, e.g. `MCBE_NEWS__FEEDS__ENABLE_BETA`
pub const ENV_PREFIX: &str = "MCBE_NEWS";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub feeds: FeedsConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding seen_articles.json and registered_groups.json
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Five-field cron expression
    #[serde(default = "default_cron")]
    pub cron: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    #[serde(default = "default_true")]
    pub enable_beta: bool,

    #[serde(default = "default_true")]
    pub enable_release: bool,

    #[serde(default = "default_beta_url")]
    pub beta_url: String,

    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// Origin relative image sources are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Relay,
    Outbox,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Legacy comma-separated group ids, used only when nothing is registered
    #[serde(default)]
    pub group_ids: String,

    #[serde(default = "default_sink")]
    pub sink: SinkKind,

    #[serde(default)]
    pub relay_url: String,

    /// Env var holding an optional bearer token for the relay
    #[serde(default = "default_relay_token_env")]
    pub relay_token_env: String,

    #[serde(default = "default_relay_timeout")]
    pub relay_timeout_secs: u64,

    /// Defaults to `<data_dir>/outbox.jsonl`
    #[serde(default)]
    pub outbox_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider selector sent with every request; unset uses `default_provider`
    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default = "default_provider")]
    pub default_provider: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_llm_retries")]
    pub retries: u32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Language the summary is written in
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub openai_compat: OpenAiCompatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_openai_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default = "default_anthropic_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    #[serde(default = "default_anthropic_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default = "default_ollama_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatConfig {
    #[serde(default)]
    pub api_key_env: String,

    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_openai_model")]
    pub model: String,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/mcbe_news")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cron() -> String {
    DEFAULT_CRON.to_string()
}

fn default_true() -> bool {
    true
}

fn default_beta_url() -> String {
    DEFAULT_BETA_URL.to_string()
}

fn default_release_url() -> String {
    DEFAULT_RELEASE_URL.to_string()
}

fn default_base_url() -> String {
    "https://feedback.minecraft.net".to_string()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_sink() -> SinkKind {
    SinkKind::Outbox
}

fn default_relay_token_env() -> String {
    "MCBE_NEWS_RELAY_TOKEN".to_string()
}

fn default_relay_timeout() -> u64 {
    30
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_timeout() -> u64 {
    60
}

fn default_llm_retries() -> u32 {
    2
}

fn default_max_output_tokens() -> u32 {
    800
}

fn default_language() -> String {
    "English".to_string()
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base_url() -> String {
    mcbe_news_adapters::llm::openai::DEFAULT_BASE_URL.to_string()
}

fn default_anthropic_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_anthropic_base_url() -> String {
    mcbe_news_adapters::llm::anthropic::DEFAULT_BASE_URL.to_string()
}

fn default_ollama_base_url() -> String {
    mcbe_news_adapters::llm::ollama::DEFAULT_BASE_URL.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
        }
    }
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            enable_beta: true,
            enable_release: true,
            beta_url: default_beta_url(),
            release_url: default_release_url(),
            base_url: default_base_url(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            group_ids: String::new(),
            sink: default_sink(),
            relay_url: String::new(),
            relay_token_env: default_relay_token_env(),
            relay_timeout_secs: default_relay_timeout(),
            outbox_path: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            default_provider: default_provider(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            retries: default_llm_retries(),
            max_output_tokens: default_max_output_tokens(),
            language: default_language(),
            openai: OpenAiConfig::default(),
            anthropic: AnthropicConfig::default(),
            ollama: OllamaConfig::default(),
            openai_compat: OpenAiCompatConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_api_key_env(),
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_anthropic_api_key_env(),
            base_url: default_anthropic_base_url(),
            model: default_anthropic_model(),
        }
    }
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            api_key_env: String::new(),
            base_url: String::new(),
            model: default_openai_model(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl DeliveryConfig {
    pub fn outbox_path(&self, data_dir: &Path) -> PathBuf {
        self.outbox_path
            .clone()
            .unwrap_or_else(|| data_dir.join("outbox.jsonl"))
    }
}

impl LlmConfig {
    /// Provider that serves requests without an explicit selector
    pub fn effective_provider(&self) -> &str {
        self.provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.default_provider)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        format!(
            r#"# mcbe-news configuration

[general]
data_dir = "./data/mcbe_news"
log_level = "info"

[schedule]
# minute hour day-of-month month day-of-week
cron = "{DEFAULT_CRON}"

[feeds]
enable_beta = true
enable_release = true
beta_url = "{DEFAULT_BETA_URL}"
release_url = "{DEFAULT_RELEASE_URL}"
base_url = "https://feedback.minecraft.net"
timeout_secs = 30

[delivery]
# Legacy comma-separated group ids, used only while no chat is registered
group_ids = ""
sink = "outbox"  # outbox, relay
relay_url = "http://127.0.0.1:6185/api/send"
relay_token_env = "MCBE_NEWS_RELAY_TOKEN"
relay_timeout_secs = 30
# outbox_path = "./data/mcbe_news/outbox.jsonl"

[llm]
# provider = "openai"  # openai, anthropic, ollama, openai_compat, stub
default_provider = "openai"
temperature = 0.3
timeout_secs = 60
retries = 2
max_output_tokens = 800
language = "English"

[llm.openai]
api_key_env = "OPENAI_API_KEY"
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"

[llm.anthropic]
api_key_env = "ANTHROPIC_API_KEY"
model = "claude-3-5-haiku-latest"

[llm.ollama]
base_url = "http://localhost:11434"
model = "llama3.1"

[llm.openai_compat]
api_key_env = "LLM_API_KEY"
base_url = "https://your-provider.com/v1"
model = "gpt-4o-mini"
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses_to_defaults() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();

        assert_eq!(config.schedule.cron, DEFAULT_CRON);
        assert_eq!(config.delivery.sink, SinkKind::Outbox);
        assert!(config.feeds.enable_beta && config.feeds.enable_release);
        assert_eq!(config.feeds.release_url, DEFAULT_RELEASE_URL);
        assert_eq!(config.llm.provider, None);
        assert_eq!(config.llm.effective_provider(), "openai");
        assert_eq!(config.llm.anthropic.base_url, default_anthropic_base_url());
        assert_eq!(config.llm.anthropic.model, default_anthropic_model());
    }

    #[test]
    fn test_each_provider_has_its_own_default_model() {
        let config: AppConfig = toml::from_str(
            r#"
[llm]
default_provider = "anthropic"

[llm.openai]
model = "gpt-4.1-mini"
"#,
        )
        .unwrap();

        assert_eq!(config.llm.anthropic.model, "claude-3-5-haiku-latest");
        assert_eq!(config.llm.ollama.model, "llama3.1");
        assert_eq!(config.llm.openai.model, "gpt-4.1-mini");
        assert_eq!(config.llm.openai_compat.model, "gpt-4o-mini");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.general.data_dir, PathBuf::from("./data/mcbe_news"));
        assert_eq!(config.feeds.timeout_secs, 30);
        assert_eq!(
            config.delivery.outbox_path(&config.general.data_dir),
            PathBuf::from("./data/mcbe_news/outbox.jsonl")
        );
    }

    #[test]
    fn test_provider_selector_overrides_default() {
        let config: AppConfig = toml::from_str(
            r#"
[llm]
provider = " ollama "
"#,
        )
        .unwrap();

        assert_eq!(config.llm.effective_provider(), "ollama");
    }
}
