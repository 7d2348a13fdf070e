//! TOML-based configuration for research-panel
//!
//! This module provides declarative configuration for the LLM provider,
//! interview limits, search backends, rule learning, prompt overrides and
//! logging via a TOML file (`research.toml`).
//!
//! Every field has a default, so an empty file (or no file at all when using
//! the default path) yields a runnable configuration. Secrets are never stored
//! in the file: providers name the environment variable that holds them.

use crate::llm::{Provider, RetryPolicy};
use crate::types::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "research.toml";

/// Root configuration structure loaded from research.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub interview: InterviewConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub rules: RulesConfig,

    /// Prompt template overrides
    #[serde(default)]
    pub prompts: PromptsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LlmConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
    OpenAI {
        /// Environment variable containing API key
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        #[serde(default = "default_openai_model")]
        model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig::OpenAI {
            api_key_env: default_openai_key_env(),
            api_base: default_openai_base(),
            model: default_openai_model(),
        }
    }
}

impl LlmConfig {
    /// Resolve into a [`Provider`], reading secrets from the environment
    pub fn to_provider(&self) -> Result<Provider, ConfigError> {
        match self {
            LlmConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
            LlmConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => {
                let api_key = std::env::var(api_key_env)
                    .map_err(|_| ConfigError::MissingEnvVar(api_key_env.clone()))?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.clone(),
                })
            }
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmConfig::Ollama { model, .. } | LlmConfig::OpenAI { model, .. } => model,
        }
    }
}

// ============= Interview Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Personas generated per run
    #[serde(default = "default_max_analysts")]
    pub max_analysts: usize,

    /// Expert answers per interview
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Analyst question that ends an interview early
    #[serde(default = "default_stop_phrase")]
    pub stop_phrase: String,

    /// Retries per LLM call after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Deadline for the whole fan-out, in seconds
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Per-backend search timeout, in seconds
    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    #[serde(default = "default_max_concurrent_interviews")]
    pub max_concurrent_interviews: usize,

    /// Fail the run if any interview escalates
    #[serde(default)]
    pub require_all: bool,
}

fn default_max_analysts() -> usize {
    3
}

fn default_max_turns() -> usize {
    2
}

fn default_stop_phrase() -> String {
    "Thank you so much for your help!".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_run_timeout_secs() -> u64 {
    600
}

fn default_search_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_interviews() -> usize {
    4
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_analysts: default_max_analysts(),
            max_turns: default_max_turns(),
            stop_phrase: default_stop_phrase(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            run_timeout_secs: default_run_timeout_secs(),
            search_timeout_secs: default_search_timeout_secs(),
            max_concurrent_interviews: default_max_concurrent_interviews(),
            require_all: false,
        }
    }
}

impl InterviewConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(self.max_retries)
            .with_initial_backoff(Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub web: WebSearchConfig,

    #[serde(default)]
    pub wikipedia: WikipediaSearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_web_max_results")]
    pub max_results: usize,
}

fn default_true() -> bool {
    true
}

fn default_web_max_results() -> usize {
    3
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_results: default_web_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaSearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_wikipedia_max_results")]
    pub max_results: usize,

    #[serde(default = "default_wikipedia_url")]
    pub base_url: String,
}

fn default_wikipedia_max_results() -> usize {
    2
}

fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org".to_string()
}

impl Default for WikipediaSearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_results: default_wikipedia_max_results(),
            base_url: default_wikipedia_url(),
        }
    }
}

// ============= Rules Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Root directory for persisted rules
    #[serde(default = "default_data_path")]
    pub data_path: String,

    #[serde(default = "default_max_rules_per_agent")]
    pub max_rules_per_agent: usize,

    /// Proposed rules below this confidence are discarded
    #[serde(default)]
    pub min_confidence: f32,
}

fn default_data_path() -> String {
    "./research_data".to_string()
}

fn default_max_rules_per_agent() -> usize {
    15
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_path: default_data_path(),
            max_rules_per_agent: default_max_rules_per_agent(),
            min_confidence: 0.0,
        }
    }
}

// ============= Prompt Overrides =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    pub analysts: Option<String>,
    pub question: Option<String>,
    pub search: Option<String>,
    pub answer: Option<String>,
    pub section_writer: Option<String>,
    pub intro_conclusion: Option<String>,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Where a loaded [`ResearchConfig`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// No file at [`DEFAULT_CONFIG_PATH`]; built-in defaults
    Defaults,
}

impl ResearchConfig {
    /// Load configuration from a TOML file and check its structure.
    ///
    /// Environment variables are not checked here; call
    /// [`validate`](Self::validate) before building a provider.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ResearchConfig = toml::from_str(&content)?;
        config.validate_structure()?;

        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file at the default path
    /// falls back to built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let (config, source) = Self::load_with_source(path)?;
        if source == ConfigSource::Defaults {
            tracing::warn!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
        }
        Ok(config)
    }

    /// [`load_or_default`](Self::load_or_default) without logging; the caller
    /// learns where the configuration came from and reports it itself.
    pub fn load_with_source<P: AsRef<Path>>(path: P) -> Result<(Self, ConfigSource), ConfigError> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => Ok((config, ConfigSource::File)),
            Err(ConfigError::FileNotFound(_)) if path == Path::new(DEFAULT_CONFIG_PATH) => {
                Ok((Self::default(), ConfigSource::Defaults))
            }
            Err(e) => Err(e),
        }
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_structure()?;

        if let LlmConfig::OpenAI { api_key_env, .. } = &self.llm {
            self.validate_env_var(api_key_env)?;
        }

        Ok(())
    }

    fn validate_structure(&self) -> Result<(), ConfigError> {
        let interview = &self.interview;

        if interview.max_analysts == 0 {
            return Err(ConfigError::ValidationError(
                "interview.max_analysts must be at least 1".to_string(),
            ));
        }
        if interview.max_concurrent_interviews == 0 {
            return Err(ConfigError::ValidationError(
                "interview.max_concurrent_interviews must be at least 1".to_string(),
            ));
        }
        if interview.stop_phrase.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "interview.stop_phrase must not be empty".to_string(),
            ));
        }
        if interview.run_timeout_secs == 0 || interview.search_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "interview timeouts must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.rules.min_confidence) {
            return Err(ConfigError::ValidationError(format!(
                "rules.min_confidence must be within 0.0..=1.0, got {}",
                self.rules.min_confidence
            )));
        }
        if self.rules.max_rules_per_agent == 0 {
            return Err(ConfigError::ValidationError(
                "rules.max_rules_per_agent must be at least 1".to_string(),
            ));
        }
        if self.search.wikipedia.enabled {
            url::Url::parse(&self.search.wikipedia.base_url).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "search.wikipedia.base_url is not a valid URL: {}",
                    e
                ))
            })?;
        }

        let prompts = [
            ("analysts", &self.prompts.analysts),
            ("question", &self.prompts.question),
            ("search", &self.prompts.search),
            ("answer", &self.prompts.answer),
            ("section_writer", &self.prompts.section_writer),
            ("intro_conclusion", &self.prompts.intro_conclusion),
        ];
        for (name, template) in prompts {
            if template.as_ref().is_some_and(|t| t.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "prompts.{} override is empty",
                    name
                )));
            }
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }
}
