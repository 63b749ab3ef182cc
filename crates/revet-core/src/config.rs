//! revet configuration
//!
//! Loaded once from `~/.config/revet/config.toml`; every field has a default
//! so a missing file yields a fully usable configuration.

use revet_types::{ConfigError, Severity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default minimum post-validation confidence for a finding to survive
pub const DEFAULT_MIN_CONFIDENCE: u8 = 80;
/// Default per-analyzer time budget, in milliseconds
pub const DEFAULT_ANALYZER_TIMEOUT_MS: u64 = 10_000;
/// Default run-level timeout, in seconds
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// revet main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Execution settings
    pub run: RunConfig,
    /// Validation pipeline settings
    pub validation: ValidationConfig,
    /// Seen-finding history settings
    pub history: HistoryConfig,
}

/// Execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Worker pool size; 0 means one worker per available core
    pub parallel: usize,
    /// Per-analyzer time budget in milliseconds, used when an analyzer does
    /// not declare its own
    pub analyzer_timeout_ms: u64,
    /// Overall run timeout in seconds, distinct from per-analyzer budgets
    pub run_timeout_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            parallel: 0,
            analyzer_timeout_ms: DEFAULT_ANALYZER_TIMEOUT_MS,
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
        }
    }
}

impl RunConfig {
    /// Effective worker pool size
    pub fn effective_parallelism(&self) -> usize {
        if self.parallel == 0 {
            num_cpus::get()
        } else {
            self.parallel
        }
    }
}

/// Validation pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Findings below this post-validation confidence are dropped entirely
    pub min_confidence: u8,
    /// Severity at or above which a surviving finding fails the run
    pub fail_on: Severity,
    /// Warning-count ceiling; exceeding it fails the run even without a
    /// finding at the `fail_on` severity
    pub max_warnings: Option<usize>,
    /// Path to the rule catalog; defaults to `~/.config/revet/rules.toml`
    /// when present, otherwise the built-in catalog
    pub rules_path: Option<PathBuf>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            fail_on: Severity::Critical,
            max_warnings: None,
            rules_path: None,
        }
    }
}

/// Seen-finding history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Whether to persist seen finding ids across runs
    pub enabled: bool,
    /// Override for the history file location
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_config_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {e}", path.display())))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        log::debug!("configuration loaded from {}", path.display());
        Ok(config)
    }

    /// `~/.config/revet/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("revet").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.validation.min_confidence > 100 {
            return Err(ConfigError::InvalidValue {
                key: "validation.min_confidence".into(),
                reason: "must be between 0 and 100".into(),
            });
        }
        if self.run.run_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "run.run_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
