//! Tripex Configuration Management
//!
//! Handles configuration from environment variables, config files,
//! and command-line arguments with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Text source configuration
    pub source: SourceConfig,

    /// Annotation service configuration
    pub annotator: AnnotatorConfig,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Rule-based extraction and batch settings
    pub extraction: ExtractionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Text source
        if let Ok(url) = std::env::var("TRIPEX_WIKIPEDIA_URL") {
            config.source.wikipedia_url = url;
        }
        if let Ok(dir) = std::env::var("TRIPEX_TEXT_DIR") {
            config.source.text_dir = Some(PathBuf::from(dir));
        }

        // Annotator
        if let Ok(url) = std::env::var("TRIPEX_ANNOTATOR_URL") {
            config.annotator.url = url;
        }

        // LLM
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider.parse()?;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.llm.openai_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.llm.gemini_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            config.llm.ollama_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm.model = Some(model);
        }
        if let Ok(chars) = std::env::var("LLM_MAX_INPUT_CHARS") {
            config.llm.max_input_chars = parse_var("LLM_MAX_INPUT_CHARS", chars)?;
        }

        // Extraction
        if let Ok(size) = std::env::var("TRIPEX_SAMPLE_SIZE") {
            config.extraction.sample_size = parse_var("TRIPEX_SAMPLE_SIZE", size)?;
        }
        if let Ok(concurrency) = std::env::var("TRIPEX_CONCURRENCY") {
            config.extraction.concurrency = parse_var("TRIPEX_CONCURRENCY", concurrency)?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // Only override if env values differ from defaults
        if env_config.source.wikipedia_url != defaults.source.wikipedia_url {
            self.source.wikipedia_url = env_config.source.wikipedia_url;
        }
        if env_config.source.text_dir.is_some() {
            self.source.text_dir = env_config.source.text_dir;
        }
        if env_config.annotator.url != defaults.annotator.url {
            self.annotator.url = env_config.annotator.url;
        }
        if env_config.llm.provider != defaults.llm.provider {
            self.llm.provider = env_config.llm.provider;
        }
        if env_config.llm.model.is_some() {
            self.llm.model = env_config.llm.model;
        }
        if env_config.llm.ollama_url != defaults.llm.ollama_url {
            self.llm.ollama_url = env_config.llm.ollama_url;
        }
        if env_config.llm.max_input_chars != defaults.llm.max_input_chars {
            self.llm.max_input_chars = env_config.llm.max_input_chars;
        }
        if env_config.extraction.sample_size != defaults.extraction.sample_size {
            self.extraction.sample_size = env_config.extraction.sample_size;
        }
        if env_config.extraction.concurrency != defaults.extraction.concurrency {
            self.extraction.concurrency = env_config.extraction.concurrency;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }

        // Always use env for sensitive values
        if env_config.llm.openai_api_key.is_some() {
            self.llm.openai_api_key = env_config.llm.openai_api_key;
        }
        if env_config.llm.gemini_api_key.is_some() {
            self.llm.gemini_api_key = env_config.llm.gemini_api_key;
        }

        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Text source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// MediaWiki Action API endpoint
    pub wikipedia_url: String,

    /// User agent sent to Wikipedia
    pub user_agent: String,

    /// Read `<title>.txt` from this directory instead of Wikipedia
    pub text_dir: Option<PathBuf>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            wikipedia_url: "https://en.wikipedia.org/w/api.php".to_string(),
            user_agent: concat!("tripex/", env!("CARGO_PKG_VERSION")).to_string(),
            text_dir: None,
            timeout_secs: 30,
        }
    }
}

/// Annotation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Base URL of the annotation service
    pub url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8090".to_string(),
            timeout_secs: 120,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// LLM provider to use
    pub provider: LlmProvider,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL (for compatible APIs)
    pub openai_base_url: Option<String>,

    /// Gemini API key
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    pub gemini_base_url: String,

    /// Ollama server URL
    pub ollama_url: String,

    /// Model name; the provider's default when unset
    pub model: Option<String>,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Input text is truncated to this many characters before prompting
    pub max_input_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            openai_api_key: None,
            openai_base_url: None,
            gemini_api_key: None,
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            model: None,
            max_tokens: 2048,
            temperature: 0.1,
            timeout_secs: 60,
            max_input_chars: 5000,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Ollama,
    Gemini,
}

impl LlmConfig {
    /// Model to request, falling back to the provider's default
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Ollama => "llama3",
            Self::Gemini => "gemini-1.5-flash",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Rule-based extraction and batch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Reject span candidates with more relation tokens than this
    pub max_relation_tokens: Option<usize>,

    /// Triplets sampled per extractor for review
    pub sample_size: usize,

    /// Documents processed at once in a batch
    pub concurrency: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_relation_tokens: None,
            sample_size: 5,
            concurrency: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {message}", .path.display())]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl From<ConfigError> for crate::TripexError {
    fn from(err: ConfigError) -> Self {
        crate::TripexError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.extraction.sample_size, 5);
        assert_eq!(config.llm.max_input_chars, 5000);
        assert!(config.extraction.max_relation_tokens.is_none());
    }

    #[test]
    fn test_llm_provider_parse() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert!("invalid".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_model_defaults_follow_provider() {
        let config = AppConfig::from_toml_str("[llm]\nprovider = \"openai\"\n").unwrap();
        assert!(config.llm.model.is_none());
        assert_eq!(config.llm.model_name(), "gpt-4o-mini");

        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            ..Default::default()
        };
        assert_eq!(config.model_name(), "llama3");
        assert_eq!(LlmConfig::default().model_name(), "gemini-1.5-flash");

        let config = LlmConfig {
            provider: LlmProvider::Ollama,
            model: Some("mistral".to_string()),
            ..Default::default()
        };
        assert_eq!(config.model_name(), "mistral");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [extraction]
            max_relation_tokens = 3

            [llm]
            provider = "ollama"
            model = "llama3"
            "#,
        )
        .unwrap();

        assert_eq!(config.extraction.max_relation_tokens, Some(3));
        assert_eq!(config.extraction.sample_size, 5);
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.model_name(), "llama3");
        assert_eq!(config.annotator.url, "http://localhost:8090");
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
}
