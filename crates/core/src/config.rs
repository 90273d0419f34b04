//! Configuration management for ragcourse.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.ragcourse/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. The API credential is resolved here once and handed to
//! the completion client explicitly; nothing downstream reads the environment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default store file, relative to the workspace.
pub const DEFAULT_DB: &str = "mudd.db";

/// Default number of articles retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Default completion model.
pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";

/// Environment variable holding the Groq credential.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ragcourse/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider ("groq" or "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Path to the article store
    pub db: PathBuf,

    /// Articles retrieved per question
    pub top_k: usize,

    /// Explicit API key override
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Crawler settings
    pub crawl: CrawlConfig,
}

/// LLM configuration from config.yaml.
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
    Groq {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::Groq { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Groq { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Crawler settings for building a store from the web.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Only URLs containing this string are fetched
    #[serde(rename = "allowedDomain", default = "default_allowed_domain")]
    pub allowed_domain: String,

    /// How many link hops to follow from the seed URL
    #[serde(rename = "maxDepth", default)]
    pub max_depth: u32,

    /// Pages with more content than this are not stored
    #[serde(rename = "maxPageChars", default = "default_max_page_chars")]
    pub max_page_chars: usize,

    /// Ask the completion model for a summary of each stored page
    #[serde(default)]
    pub summarize: bool,
}

fn default_allowed_domain() -> String {
    "hmc.edu".to_string()
}

fn default_max_page_chars() -> usize {
    30_000
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            allowed_domain: default_allowed_domain(),
            max_depth: 0,
            max_page_chars: default_max_page_chars(),
            summarize: false,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    retrieval: Option<RetrievalConfig>,
    crawl: Option<CrawlConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalConfig {
    db: Option<String>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "groq".to_string(),
            model: DEFAULT_MODEL.to_string(),
            db: PathBuf::from(DEFAULT_DB),
            top_k: DEFAULT_TOP_K,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            crawl: CrawlConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `RAGCOURSE_WORKSPACE`: Override workspace path
    /// - `RAGCOURSE_CONFIG`: Path to config file
    /// - `RAGCOURSE_PROVIDER`: Completion provider
    /// - `RAGCOURSE_MODEL`: Model identifier
    /// - `RAGCOURSE_DB`: Store path
    /// - `RAGCOURSE_API_KEY`: API key override
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ragcourse_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Store: {:?}", config.db_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Explicit paths take precedence over `RAGCOURSE_WORKSPACE` and
    /// `RAGCOURSE_CONFIG`; the workspace must exist before the config file
    /// inside it can be read.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("RAGCOURSE_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("RAGCOURSE_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.ragcourse_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("RAGCOURSE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("RAGCOURSE_MODEL") {
            config.model = model;
        }

        if let Ok(db) = std::env::var("RAGCOURSE_DB") {
            config.db = PathBuf::from(db);
        }

        config.api_key = std::env::var("RAGCOURSE_API_KEY").ok();
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

        if let Some(retrieval) = config_file.retrieval {
            if let Some(db) = retrieval.db {
                result.db = PathBuf::from(db);
            }
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
        }

        if let Some(crawl) = config_file.crawl {
            result.crawl = crawl;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
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
    /// Command-line flags take precedence over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        db: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        top_k: Option<usize>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(db) = db {
            self.db = db;
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(top_k) = top_k {
            self.top_k = top_k;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .ragcourse directory.
    pub fn ragcourse_dir(&self) -> PathBuf {
        self.workspace.join(".ragcourse")
    }

    /// Resolve the store path against the workspace.
    pub fn db_path(&self) -> PathBuf {
        if self.db.is_absolute() {
            self.db.clone()
        } else {
            self.workspace.join(&self.db)
        }
    }

    /// Get the configuration for a provider, if the config file declared one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider))
    }

    /// Endpoint override for a provider, if configured.
    pub fn endpoint_for(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: `RAGCOURSE_API_KEY`, then the provider's `apiKeyEnv`, then
    /// `GROQ_API_KEY` for the groq provider. Returns `None` when no key is set;
    /// the completion client turns that into an auth error.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::Groq { api_key_env, .. }) => Some(api_key_env.clone()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider.eq_ignore_ascii_case("groq") => Some(GROQ_API_KEY_ENV.to_string()),
            None => None,
        };

        env_var
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["groq", "ollama"];

        if !known_providers.contains(&self.provider.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        Ok(())
    }
}
