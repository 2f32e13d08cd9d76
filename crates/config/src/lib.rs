//! Configuration loading, validation, and management for Notewright.
//!
//! Loads configuration from `~/.notewright/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.notewright/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Provider endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Turn loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Preprocessing pipeline settings
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    /// Vault (document store) settings
    #[serde(default)]
    pub vault: VaultConfig,

    /// Tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("provider", &self.provider)
            .field("agent", &self.agent)
            .field("preprocess", &self.preprocess)
            .field("vault", &self.vault)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL for media uploads
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_upload_url() -> String {
    "https://generativelanguage.googleapis.com/upload/v1beta".into()
}
fn default_timeout_secs() -> u64 {
    300
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            upload_url: default_upload_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on model calls per run
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Attempts per model call before the run fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Replaces the built-in system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_turns() -> u32 {
    20
}
fn default_max_retries() -> u32 {
    3
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_retries: default_max_retries(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Depth of the vault tree snapshot sent with the first message
    #[serde(default = "default_tree_depth")]
    pub tree_depth: usize,

    /// How many attachments upload concurrently
    #[serde(default = "default_upload_batch_size")]
    pub upload_batch_size: usize,

    /// Split instruction text into runs of at most this many tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_input_tokens: Option<u32>,
}

fn default_tree_depth() -> usize {
    3
}
fn default_upload_batch_size() -> usize {
    4
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            tree_depth: default_tree_depth(),
            upload_batch_size: default_upload_batch_size(),
            max_input_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Root folder of the vault
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Path segments the tools must never write to or move
    #[serde(default = "default_protected_patterns")]
    pub protected_patterns: Vec<String>,
}

fn default_protected_patterns() -> Vec<String> {
    vec![".obsidian".into()]
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: None,
            protected_patterns: default_protected_patterns(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Description overrides (tool name → text sent to the model)
    #[serde(default)]
    pub descriptions: HashMap<String, String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.notewright/config.toml).
    ///
    /// Also checks environment variables:
    /// - `NOTEWRIGHT_API_KEY` (highest priority), then `GEMINI_API_KEY`
    /// - `NOTEWRIGHT_MODEL`
    /// - `NOTEWRIGHT_VAULT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
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

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("NOTEWRIGHT_API_KEY").or_else(|| lookup("GEMINI_API_KEY"));
        }
        if let Some(model) = lookup("NOTEWRIGHT_MODEL") {
            self.default_model = model;
        }
        if let Some(vault) = lookup("NOTEWRIGHT_VAULT") {
            self.vault.path = Some(PathBuf::from(vault));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".notewright")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_turns must be greater than 0".into(),
            ));
        }
        if self.preprocess.tree_depth == 0 {
            return Err(ConfigError::ValidationError(
                "preprocess.tree_depth must be at least 1".into(),
            ));
        }
        if self.preprocess.upload_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "preprocess.upload_batch_size must be at least 1".into(),
            ));
        }
        if self.preprocess.max_input_tokens == Some(0) {
            return Err(ConfigError::ValidationError(
                "preprocess.max_input_tokens must be greater than 0 when set".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            default_temperature: default_temperature(),
            provider: ProviderConfig::default(),
            agent: AgentConfig::default(),
            preprocess: PreprocessConfig::default(),
            vault: VaultConfig::default(),
            tools: ToolsConfig::default(),
        }
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
