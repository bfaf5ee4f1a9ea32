//! BDI Configuration
//!
//! Inference endpoint and analysis settings.
//! Config file: ~/.config/bdi/config.toml or /etc/bdi/config.toml
//!
//! Environment overrides (applied after the file):
//! - BDI_OLLAMA_URL
//! - BDI_MODEL
//! - BDI_TIMEOUT_SECS

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default Ollama API endpoint
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "llama3.1:8b";

/// Default timeout for one generation call (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Inference endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the Ollama-compatible server
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Timeout for one generation call
    pub timeout_secs: u64,
    /// Sampling temperature; server default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Extra attempts for transient failures (0 = single attempt)
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    pub retry_backoff_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: None,
            max_retries: 0,
            retry_backoff_ms: 500,
        }
    }
}

/// Analysis run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Concurrent model calls per run (1 = sequential)
    pub parallelism: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { parallelism: 1 }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BdiConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl BdiConfig {
    /// Get default user config path: ~/.config/bdi/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bdi").join("config.toml"))
    }

    /// Get system config path: /etc/bdi/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/bdi/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. User config (~/.config/bdi/config.toml)
    /// 2. System config (/etc/bdi/config.toml)
    /// 3. Defaults
    ///
    /// Environment overrides are applied on top of whichever was found.
    pub fn load() -> Result<Self> {
        let mut config = match Self::user_config_path().filter(|p| p.exists()) {
            Some(user_path) => Self::load_from(&user_path)?,
            None => {
                let system_path = Self::system_config_path();
                if system_path.exists() {
                    Self::load_from(&system_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: BdiConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Apply BDI_* overrides using `lookup` to read variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BDI_OLLAMA_URL").filter(|v| !v.trim().is_empty()) {
            self.model.base_url = url.trim().to_string();
        }
        if let Some(model) = lookup("BDI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model.model = model.trim().to_string();
        }
        if let Some(timeout) = lookup("BDI_TIMEOUT_SECS") {
            self.model.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid BDI_TIMEOUT_SECS: '{}'", timeout))?;
        }
        self.validate()
    }

    /// Reject settings that would make every model call fail
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.model.timeout_secs >= 1,
            "timeout_secs must be at least 1 second"
        );
        Ok(())
    }

    /// Serialize to TOML for display
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
