//! Configuration system for the stockql server
//!
//! Loads configuration from:
//! 1. config.yaml - operational settings (port, storage, model, logging)
//! 2. .env file - secrets (API keys)
//!
//! Environment variables always override config.yaml values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; "*" allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

/// Where seed market data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedProvider {
    /// `seed_file` on disk
    #[default]
    Fixture,
    /// One HTTP request per symbol against `quote_url`
    QuoteApi,
}

impl SeedProvider {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "fixture" => Some(SeedProvider::Fixture),
            "quote_api" => Some(SeedProvider::QuoteApi),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// DuckDB file path, or ":memory:"
    pub database: String,

    pub provider: SeedProvider,

    /// JSON market data used to seed an empty database
    pub seed_file: Option<String>,

    /// Quote endpoint with a `{symbol}` placeholder
    pub quote_url: Option<String>,

    pub fetch_timeout_secs: u64,

    pub query_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: "data/stocks.duckdb".to_string(),
            provider: SeedProvider::Fixture,
            seed_file: Some("data/stocks.json".to_string()),
            quote_url: None,
            fetch_timeout_secs: 10,
            query_timeout_secs: 10,
        }
    }
}

impl StorageConfig {
    pub fn is_in_memory(&self) -> bool {
        self.database == ":memory:"
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,

    /// OpenAI-compatible endpoint; defaults to api.openai.com
    pub api_base: Option<String>,

    pub temperature: f32,

    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            temperature: 0.1,
            timeout_secs: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file means defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = [
            ("llm.timeout_secs", self.llm.timeout_secs),
            ("storage.query_timeout_secs", self.storage.query_timeout_secs),
            ("storage.fetch_timeout_secs", self.storage.fetch_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Invalid(format!("{} must be greater than 0", name)));
        }

        if self.storage.provider == SeedProvider::QuoteApi {
            match &self.storage.quote_url {
                Some(url) if url.contains("{symbol}") => {}
                _ => {
                    return Err(ConfigError::Invalid(
                        "storage.quote_url with a {symbol} placeholder is required for the quote_api provider"
                            .to_string(),
                    ))
                }
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("STOCKQL_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("STOCKQL_SERVER_PORT") {
            if let Ok(port_num) = port.parse() {
                self.server.port = port_num;
            }
        }

        if let Ok(database) = std::env::var("STOCKQL_DATABASE") {
            self.storage.database = database;
        }
        if let Ok(seed_file) = std::env::var("STOCKQL_SEED_FILE") {
            self.storage.seed_file = Some(seed_file);
        }
        if let Some(provider) = std::env::var("STOCKQL_SEED_PROVIDER")
            .ok()
            .and_then(|p| SeedProvider::parse(&p))
        {
            self.storage.provider = provider;
        }
        if let Ok(url) = std::env::var("STOCKQL_QUOTE_URL") {
            self.storage.quote_url = Some(url);
        }

        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(base) = std::env::var("LLM_API_BASE") {
            self.llm.api_base = Some(base);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
    }

    /// Get the completion service API key from environment (must be in .env)
    pub fn get_openai_api_key() -> Result<String, ConfigError> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string())),
        }
    }
}
