//! Harada grid configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project-local config file name
const LOCAL_CONFIG: &str = ".harada.yml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Generation pacing
    pub generation: GenerationConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .harada.yml
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/harada/harada.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("harada").join("harada.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed: the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Reasoning-effort hint; empty to omit it from requests
    #[serde(rename = "reasoning-effort")]
    pub reasoning_effort: String,

    /// Environment variable holding the default API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-5-nano".to_string(),
            reasoning_effort: "minimal".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 2048,
            timeout_ms: 120_000,
        }
    }
}

/// Pacing between emitted pillars and tasks
///
/// Purely cosmetic; zero delays are valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Delay before each pillar is emitted
    #[serde(rename = "pillar-delay-ms")]
    pub pillar_delay_ms: u64,

    /// Delay before each task is emitted
    #[serde(rename = "task-delay-ms")]
    pub task_delay_ms: u64,

    /// Max tokens requested per list
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl GenerationConfig {
    /// Configuration with pacing disabled
    pub fn immediate() -> Self {
        Self {
            pillar_delay_ms: 0,
            task_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn pillar_delay(&self) -> Duration {
        Duration::from_millis(self.pillar_delay_ms)
    }

    pub fn task_delay(&self) -> Duration {
        Duration::from_millis(self.task_delay_ms)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            pillar_delay_ms: 200,
            task_delay_ms: 150,
            max_tokens: 1024,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the active grid, the stored credential and logs
    #[serde(rename = "data-dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/harada on Linux)
        let data_dir = dirs::data_dir()
            .map(|d| d.join("harada"))
            .unwrap_or_else(|| PathBuf::from(".harada"));

        Self { data_dir }
    }
}

impl StorageConfig {
    /// Data directory with a leading `~/` expanded
    pub fn expanded_data_dir(&self) -> PathBuf {
        match self.data_dir.to_str().and_then(|s| s.strip_prefix("~/")) {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| self.data_dir.clone()),
            None => self.data_dir.clone(),
        }
    }
}
