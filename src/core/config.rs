//! Configuration management for Troika
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/troika/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{Result, TroikaError};

/// Default sentinel token that signals intentional completion
pub const DEFAULT_TERMINATION_TOKEN: &str = "TERMINATE";

/// Main configuration for Troika
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat backend configuration
    pub model: ModelConfig,
    /// Conversation run configuration
    #[serde(default)]
    pub run: RunConfig,
    /// Code executor configuration
    #[serde(default)]
    pub executor: ExecutorConfig,
}

/// Chat backend configuration - read once at startup, immutable for the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent with every request
    pub name: String,
    /// Base endpoint of the OpenAI-compatible API
    pub base_url: String,
    /// API credential (may be empty for unauthenticated endpoints)
    pub api_key: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// How the next speaker is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorMode {
    /// Fixed cyclic order
    RoundRobin,
    /// A coordinator model names the next speaker
    Model,
}

/// Conversation run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Sentinel token whose presence in the last message ends the run
    pub termination_token: String,
    /// Hard cap on transcript length, composed into the termination policy
    pub max_messages: usize,
    /// Turn selection mode
    pub selector: SelectorMode,
    /// Retry budget for the model selector before falling back
    pub max_selector_attempts: usize,
    /// Whether the model selector falls back to round-robin when the
    /// retry budget is exhausted (otherwise the run fails)
    pub selector_fallback: bool,
    /// Whether the same participant may speak twice in a row
    pub allow_repeated_speaker: bool,
    /// Whether to show debug output
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            termination_token: DEFAULT_TERMINATION_TOKEN.to_string(),
            max_messages: 50,
            selector: SelectorMode::RoundRobin,
            max_selector_attempts: 3,
            selector_fallback: true,
            allow_repeated_speaker: false,
            debug: env::var("TROIKA_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Code executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Whether tool-invoking participants get the code execution tool
    pub enabled: bool,
    /// Timeout for a single code execution in seconds
    pub timeout_secs: u64,
    /// Maximum tool round-trips inside one participant turn
    pub max_tool_turns: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 360,
            max_tool_turns: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            run: RunConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: env::var("OPENAI_MODEL").unwrap_or_else(|_| "DeepSeek-R1".to_string()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            temperature: 0.15,
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("troika")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    ///
    /// Priority: env vars > config file > defaults.
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(TroikaError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| TroikaError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| TroikaError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Re-apply environment variables on top of the loaded file
    fn apply_env_overrides(&mut self) {
        if let Ok(model) = env::var("OPENAI_MODEL") {
            self.model.name = model;
        }
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            self.model.base_url = base_url;
        }
        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            self.model.api_key = api_key;
        }
        if let Ok(debug) = env::var("TROIKA_DEBUG") {
            self.run.debug = debug == "true" || debug == "1";
        }
    }

    /// Validate the configuration, failing fast before a run starts
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.model.base_url)
            .map_err(|e| TroikaError::config(format!("Invalid base URL '{}': {}", self.model.base_url, e)))?;

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(TroikaError::config(format!(
                "Temperature {} out of range (0.0 - 2.0)",
                self.model.temperature
            )));
        }

        if self.model.name.trim().is_empty() {
            return Err(TroikaError::config("Model name must not be empty"));
        }

        if self.run.max_messages == 0 {
            return Err(TroikaError::config("max_messages must be at least 1"));
        }

        if self.run.max_selector_attempts == 0 {
            return Err(TroikaError::config(
                "max_selector_attempts must be at least 1",
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| TroikaError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TroikaError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| TroikaError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Copy with the API credential blanked, for display and on-disk output.
    /// The key is only ever read from OPENAI_API_KEY.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        copy.model.api_key = String::new();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.temperature, 0.15);
        assert_eq!(config.run.termination_token, "TERMINATE");
        assert_eq!(config.run.max_selector_attempts, 3);
        assert!(config.run.selector_fallback);
        assert_eq!(config.executor.timeout_secs, 360);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.model.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(TroikaError::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = Config::default();
        config.model.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("termination_token"));
        assert!(toml_str.contains("base_url"));
    }

    #[test]
    fn test_redacted_drops_credential() {
        let mut config = Config::default();
        config.model.api_key = "sk-secret".to_string();

        let shown = config.redacted();
        assert!(shown.model.api_key.is_empty());
        let toml_str = toml::to_string_pretty(&shown).unwrap();
        assert!(!toml_str.contains("sk-secret"));
        // Original untouched
        assert_eq!(config.model.api_key, "sk-secret");
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("troika"));
    }
}
