//! Configuration loading, validation, and management for agentlab.
//!
//! Loads configuration from `~/.agentlab/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentlab/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text generator backend
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Conversation history storage
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Controller step budgets and history windows
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "ollama" or "openai_compat"
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL; each provider kind has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout for the generator call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_kind() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "llama3.1:latest".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            model: default_model(),
            api_url: None,
            api_key: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// "sqlite" or "in_memory"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// SQLite database file
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,
}

fn default_memory_backend() -> String {
    "sqlite".into()
}
fn default_memory_path() -> PathBuf {
    AppConfig::config_dir().join("storage").join("chat_memory.db")
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: default_memory_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Step budget for ordinary requests
    #[serde(default = "default_single_step_limit")]
    pub single_step_limit: usize,

    /// Step budget when the request asks for sequenced work ("... then ...")
    #[serde(default = "default_multi_step_limit")]
    pub multi_step_limit: usize,

    /// Turns of history rendered into the prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Turns read when a pre-loop handler needs older context
    #[serde(default = "default_wide_history_window")]
    pub wide_history_window: usize,
}

fn default_single_step_limit() -> usize {
    4
}
fn default_multi_step_limit() -> usize {
    10
}
fn default_history_window() -> usize {
    6
}
fn default_wide_history_window() -> usize {
    20
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            single_step_limit: default_single_step_limit(),
            multi_step_limit: default_multi_step_limit(),
            history_window: default_history_window(),
            wide_history_window: default_wide_history_window(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentlab/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `AGENTLAB_PROVIDER`, `AGENTLAB_MODEL`, `AGENTLAB_API_URL`
    /// - `AGENTLAB_API_KEY`, falling back to `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(kind) = std::env::var("AGENTLAB_PROVIDER") {
            self.provider.kind = kind;
        }
        if let Ok(model) = std::env::var("AGENTLAB_MODEL") {
            self.provider.model = model;
        }
        if let Ok(url) = std::env::var("AGENTLAB_API_URL") {
            self.provider.api_url = Some(url);
        }
        if self.provider.api_key.is_none() {
            self.provider.api_key = std::env::var("AGENTLAB_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentlab")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !matches!(self.provider.kind.as_str(), "ollama" | "openai_compat") {
            return Err(ConfigError::ValidationError(format!(
                "unknown provider.kind '{}' (expected ollama or openai_compat)",
                self.provider.kind
            )));
        }

        if !matches!(self.memory.backend.as_str(), "sqlite" | "in_memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown memory.backend '{}' (expected sqlite or in_memory)",
                self.memory.backend
            )));
        }

        let agent = &self.agent;
        if agent.single_step_limit == 0
            || agent.multi_step_limit == 0
            || agent.history_window == 0
            || agent.wide_history_window == 0
        {
            return Err(ConfigError::ValidationError(
                "agent step limits and history windows must be > 0".into(),
            ));
        }

        if agent.multi_step_limit < agent.single_step_limit {
            return Err(ConfigError::ValidationError(
                "agent.multi_step_limit must be >= agent.single_step_limit".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
