//! Configuration management for Aide
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/aide/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{AideError, Result};

/// Main configuration for Aide
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model backend configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Where tool collaborators keep their files
    #[serde(default)]
    pub storage: StorageConfig,
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Research sub-agent configuration
    #[serde(default)]
    pub research: ResearchConfig,
    /// Search provider configuration
    #[serde(default)]
    pub search: SearchConfig,
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Messages API endpoint
    pub endpoint: String,
    /// Model used by both the main agent and the research sub-agent
    pub model: String,
    /// Maximum tokens per main-agent response
    pub max_tokens: u32,
    /// Extended thinking budget in tokens (0 = disabled)
    pub thinking_budget: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key, read from ANTHROPIC_API_KEY only
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON records for calendar, notes, reminders and memory
    pub data_dir: PathBuf,
    /// Sandbox root for the file tools
    pub workspace_dir: PathBuf,
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model/tool round-trips per turn before the loop gives up
    /// Default: 25
    pub max_round_trips: usize,
    /// Characters of each tool result shown in progress output
    /// Default: 120
    pub preview_chars: usize,
    /// Whether to show debug output
    pub debug: bool,
}

/// Research sub-agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Search quota for `quick` depth
    pub quick_searches: usize,
    /// Search quota for `thorough` depth
    pub thorough_searches: usize,
    /// Maximum tokens per sub-agent response
    pub max_tokens: u32,
    /// Maximum round-trips for one research run
    pub max_round_trips: usize,
}

/// Search provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// DuckDuckGo HTML endpoint
    pub endpoint: String,
    /// Results returned when the caller does not ask for a number
    pub default_results: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| v == "true" || v == "1")
}

fn assistant_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".personal_assistant")
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: env::var("AIDE_ENDPOINT")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".to_string()),
            model: env::var("AIDE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            max_tokens: 16000,
            thinking_budget: 0,
            timeout_secs: 300,
            api_key: env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| assistant_home().join("data")),
            workspace_dir: env::var("WORKSPACE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| assistant_home().join("workspace")),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_round_trips: 25,
            preview_chars: 120,
            debug: env_flag("AIDE_DEBUG").unwrap_or(false),
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            quick_searches: 3,
            thorough_searches: 6,
            max_tokens: 8192,
            max_round_trips: 12,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            default_results: 5,
            timeout_secs: 20,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aide")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(AideError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| AideError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; the API key always comes from the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| AideError::config(format!("Failed to parse config: {}", e)))?;
        config.backend.api_key = BackendConfig::default().api_key;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| AideError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AideError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| AideError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Save configuration and return the path
    pub fn save_and_get_path(&self) -> Result<PathBuf> {
        self.save()?;
        Ok(Self::config_file())
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config)
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }

    /// Update the backend model
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.backend.model = model.into();
    }
}
