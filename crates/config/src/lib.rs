//! Configuration loading, validation, and management for Glucocast.
//!
//! Loads configuration from `~/.glucocast/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use glucocast_core::series::LOOK_BACK;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.glucocast/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model and scaler artifacts
    #[serde(default)]
    pub model: ModelConfig,

    /// Pipeline behaviour
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Realism noise applied to the baseline forecast
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Where glucose readings are read from
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// JSON model artifact; the drift baseline is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// JSON scaler artifact paired with `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_path: Option<PathBuf>,

    /// Directory holding per-user artifacts
    /// (`glucose_predictor_user_{id}.json`, `scaler_user_{id}.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_model_dir: Option<PathBuf>,

    /// Fall back to the drift baseline when a trained model fails
    #[serde(default = "default_true")]
    pub fallback_to_drift: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            scaler_path: None,
            user_model_dir: None,
            fallback_to_drift: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Include the trend analysis block in every result
    #[serde(default)]
    pub include_analysis: bool,

    /// Round predictions to whole mg/dL
    #[serde(default = "default_true")]
    pub round_output: bool,

    /// Deadline for one pipeline invocation (0 = none)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How many recent readings to fetch from the history store; at least
    /// one input window
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_timeout_ms() -> u64 {
    5000
}
fn default_history_limit() -> usize {
    36
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            include_analysis: false,
            round_output: true,
            timeout_ms: default_timeout_ms(),
            history_limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Std-dev of the perturbation as a fraction of each value
    #[serde(default = "default_noise_factor")]
    pub factor: f64,

    /// Fixed seed for reproducible output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_noise_factor() -> f64 {
    0.02
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: default_noise_factor(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// "memory" or "file"
    #[serde(default = "default_history_backend")]
    pub backend: String,

    /// JSONL file for the "file" backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_history_backend() -> String {
    "file".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: default_history_backend(),
            path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.glucocast/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `GLUCOCAST_MODEL_PATH`
    /// - `GLUCOCAST_SCALER_PATH`
    /// - `GLUCOCAST_NOISE_SEED`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = lookup("GLUCOCAST_MODEL_PATH") {
            self.model.path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("GLUCOCAST_SCALER_PATH") {
            self.model.scaler_path = Some(PathBuf::from(path));
        }
        if let Some(seed) = lookup("GLUCOCAST_NOISE_SEED") {
            let seed = seed.trim().parse::<u64>().map_err(|e| {
                ConfigError::ValidationError(format!("GLUCOCAST_NOISE_SEED must be a u64: {e}"))
            })?;
            self.noise.seed = Some(seed);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".glucocast")
    }

    /// Default JSONL file for the file history backend.
    pub fn default_history_path() -> PathBuf {
        Self::config_dir().join("history").join("readings.jsonl")
    }

    /// The history file in effect for this configuration.
    pub fn history_path(&self) -> PathBuf {
        self.history
            .path
            .clone()
            .unwrap_or_else(Self::default_history_path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.noise.factor.is_finite() || !(0.0..=0.5).contains(&self.noise.factor) {
            return Err(ConfigError::ValidationError(
                "noise.factor must be between 0.0 and 0.5".into(),
            ));
        }

        if self.model.scaler_path.is_some() && self.model.path.is_none() {
            return Err(ConfigError::ValidationError(
                "model.scaler_path is set but model.path is not".into(),
            ));
        }

        if self.forecast.history_limit < LOOK_BACK {
            return Err(ConfigError::ValidationError(format!(
                "forecast.history_limit must be at least {LOOK_BACK}, got {}",
                self.forecast.history_limit
            )));
        }

        match self.history.backend.as_str() {
            "memory" | "file" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "history.backend must be \"memory\" or \"file\", got \"{other}\""
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
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
