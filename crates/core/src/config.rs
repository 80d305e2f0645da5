//! Configuration management for wikiqa.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`wikiqa.yaml` or the path in `WIKIQA_CONFIG`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "wikiqa.yaml";

/// Smallest number of chunks a query may request.
pub const MIN_CHUNKS: u32 = 1;

/// Largest number of chunks a query may request.
pub const MAX_CHUNKS: u32 = 5;

/// Providers the generation factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "openai"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider ("ollama" or "openai")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// API key for the generation provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON
    pub log_json: bool,

    /// Generation provider configurations
    pub llm: Option<LlmConfig>,

    /// Chunk store connection settings
    pub store: StoreConfig,

    /// Query pipeline settings
    pub rag: RagConfig,
}

/// Generation configuration from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
    },
}

impl ProviderConfig {
    /// Get the model name for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } => model,
            Self::Ollama { model, .. } => model,
        }
    }

    /// Get the endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Chunk store (Weaviate) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the store
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,

    /// Collection holding the indexed chunks
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Environment variable holding the store API key
    #[serde(rename = "apiKeyEnv", default)]
    pub api_key_env: Option<String>,

    /// Hybrid weighting between keyword (0.0) and vector (1.0) search
    #[serde(default)]
    pub alpha: Option<f32>,
}

fn default_store_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_collection() -> String {
    "WikiChunk".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            collection: default_collection(),
            api_key_env: None,
            alpha: None,
        }
    }
}

impl StoreConfig {
    /// Resolve the store API key from its environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }
}

/// Query pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunks retrieved when the caller does not say
    #[serde(rename = "defaultChunks", default = "default_chunks")]
    pub default_chunks: u32,

    /// Sampling temperature for answers
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(rename = "maxTokens", default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Handlebars template replacing the built-in grounding prompt
    #[serde(rename = "promptTemplate", default)]
    pub prompt_template: Option<String>,
}

fn default_chunks() -> u32 {
    3
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            default_chunks: default_chunks(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            prompt_template: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    store: Option<StoreConfig>,
    rag: Option<RagConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            llm: None,
            store: StoreConfig::default(),
            rag: RagConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `WIKIQA_CONFIG`: Path to config file
    /// - `WIKIQA_PROVIDER`: Generation provider
    /// - `WIKIQA_MODEL`: Model identifier
    /// - `WIKIQA_API_KEY`: Generation API key
    /// - `WIKIQA_STORE_URL`: Chunk store base URL
    /// - `WIKIQA_COLLECTION`: Chunk collection name
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use wikiqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Store: {}", config.store.endpoint);
    /// ```
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        config.config_file = config_file
            .or_else(|| std::env::var("WIKIQA_CONFIG").ok().map(PathBuf::from));

        match config.config_file.clone() {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    config = config.merge_yaml(&path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("WIKIQA_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("WIKIQA_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("WIKIQA_STORE_URL") {
            config.store.endpoint = endpoint;
        }

        if let Ok(collection) = std::env::var("WIKIQA_COLLECTION") {
            config.store.collection = collection;
        }

        config.api_key = std::env::var("WIKIQA_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(store) = config_file.store {
            result.store = store;
        }

        if let Some(rag) = config_file.rag {
            result.rag = rag;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the configuration for a provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the endpoint configured for a provider.
    pub fn provider_endpoint(&self, provider: &str) -> Option<&str> {
        self.get_provider_config(provider)
            .and_then(ProviderConfig::endpoint)
    }

    /// Resolve the generation API key.
    ///
    /// `WIKIQA_API_KEY` wins over the provider's `apiKeyEnv` variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            _ => None,
        }
    }

    /// Validate configuration for the active provider and the store.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.to_lowercase();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(&provider).is_none() {
            let hint = match self.get_provider_config(&provider) {
                Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env.clone(),
                _ => "WIKIQA_API_KEY".to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                hint
            )));
        }

        if self.store.collection.trim().is_empty() {
            return Err(AppError::Config(
                "Store collection name must not be empty".to_string(),
            ));
        }

        if let Some(alpha) = self.store.alpha {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(AppError::Config(format!(
                    "Store alpha must be within 0.0..=1.0, got {}",
                    alpha
                )));
            }
        }

        if !(MIN_CHUNKS..=MAX_CHUNKS).contains(&self.rag.default_chunks) {
            return Err(AppError::Config(format!(
                "rag.defaultChunks must be within {}..={}, got {}",
                MIN_CHUNKS, MAX_CHUNKS, self.rag.default_chunks
            )));
        }

        Ok(())
    }
}
