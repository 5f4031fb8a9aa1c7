//! Configuration management for Lexprep.
//!
//! Supports three-layer configuration loading:
//! 1. Built-in defaults
//! 2. TOML config file (`~/.lexprep/config.toml`)
//! 3. Environment variable overrides (`LEXPREP_` prefix)

mod defaults;

use crate::error::ConfigError;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Top-level configuration for the Lexprep backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Data storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// LLM backend configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Generation pipeline gates and budget.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Adaptive selection and inventory thresholds.
    #[serde(default)]
    pub adaptive: AdaptiveConfig,

    /// Background worker settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Data storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// LLM backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Backend: "anthropic" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for the hosted backend.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override (for testing against a local mock server).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model used for stage-1 generation.
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Model used for stage-2 verification and stage-3 adversarial review.
    #[serde(default = "default_validation_model")]
    pub validation_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            base_url: None,
            generation_model: default_generation_model(),
            validation_model: default_validation_model(),
        }
    }
}

/// Generation pipeline gates and budget.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Gate on stage 2 (independent solve).
    #[serde(default = "default_true")]
    pub validation_enabled: bool,

    /// Gate on stage 3 (adversarial defense).
    #[serde(default = "default_true")]
    pub adversarial_enabled: bool,

    /// Default number of questions per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Daily generation budget in cents. Exceeding it fails new batches
    /// with a busy signal.
    #[serde(default = "default_daily_cost_limit_cents")]
    pub daily_cost_limit_cents: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            validation_enabled: true,
            adversarial_enabled: true,
            batch_size: default_batch_size(),
            daily_cost_limit_cents: default_daily_cost_limit_cents(),
        }
    }
}

/// Adaptive selection and inventory thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdaptiveConfig {
    /// Fallback slider value when the user has none saved.
    #[serde(default = "default_slider")]
    pub default_slider: u8,

    /// Enable the inventory triggers for logical reasoning.
    #[serde(default = "default_true")]
    pub auto_gen_enabled_section_a: bool,

    /// Enable the inventory triggers for reading comprehension.
    #[serde(default = "default_true")]
    pub auto_gen_enabled_section_b: bool,

    /// Per-user unseen threshold below which a generation job is enqueued.
    #[serde(default = "default_auto_gen_min_unseen")]
    pub auto_gen_min_unseen: u32,

    /// Servable-item count below which a bucket is considered short.
    #[serde(default = "default_bucket_low_water")]
    pub bucket_low_water: u32,

    /// Distinct-passage count below which an RC bucket is considered short.
    #[serde(default = "default_passage_low_water")]
    pub passage_low_water: u32,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            default_slider: default_slider(),
            auto_gen_enabled_section_a: true,
            auto_gen_enabled_section_b: true,
            auto_gen_min_unseen: default_auto_gen_min_unseen(),
            bucket_low_water: default_bucket_low_water(),
            passage_low_water: default_passage_low_water(),
        }
    }
}

/// Background worker settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Seconds between worker ticks.
    #[serde(default = "default_worker_interval_secs")]
    pub worker_interval_secs: u64,

    /// Maximum queue items drained per tick.
    #[serde(default = "default_worker_batch_limit")]
    pub worker_batch_limit: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_interval_secs: default_worker_interval_secs(),
            worker_batch_limit: default_worker_batch_limit(),
        }
    }
}

impl Config {
    /// Load configuration from the given path (or the default location),
    /// apply environment overrides, and validate.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => expand_tilde(p),
            None => default_config_path()
                .to_string_lossy()
                .to_string(),
        };

        let mut config = if std::path::Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|_| ConfigError::NotFound { path: path.clone() })?;
            toml::from_str(&raw)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `LEXPREP_`-prefixed environment overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("LEXPREP_DB_PATH") {
            if !v.is_empty() {
                self.storage.db_path = v;
            }
        }
        if let Ok(v) = env::var("LEXPREP_LLM_PROVIDER") {
            if !v.is_empty() {
                self.llm.provider = v;
            }
        }
        if let Ok(v) = env::var("LEXPREP_LLM_API_KEY") {
            if !v.is_empty() {
                self.llm.api_key = Some(v);
            }
        }
    }

    /// Validate field values that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.llm.provider.as_str() {
            "anthropic" | "mock" => {}
            other => {
                return Err(ConfigError::Rejected {
                    field: "llm.provider".to_string(),
                    reason: format!("must be anthropic or mock, got '{other}'"),
                })
            }
        }

        if !(1..=12).contains(&self.generation.batch_size) {
            return Err(ConfigError::Rejected {
                field: "generation.batch_size".to_string(),
                reason: "must be between 1 and 12".to_string(),
            });
        }

        if self.adaptive.default_slider > 100 {
            return Err(ConfigError::Rejected {
                field: "adaptive.default_slider".to_string(),
                reason: "must be between 0 and 100".to_string(),
            });
        }

        if self.scheduler.worker_interval_secs == 0 {
            return Err(ConfigError::Rejected {
                field: "scheduler.worker_interval_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.scheduler.worker_batch_limit == 0 {
            return Err(ConfigError::Rejected {
                field: "scheduler.worker_batch_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// The default config file location (`~/.lexprep/config.toml`).
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lexprep")
        .join("config.toml")
}

/// Expand a leading `~` to the home directory; paths without one (or
/// systems without a resolvable home) pass through untouched.
pub(crate) fn expand_tilde(path: &str) -> String {
    match (path.strip_prefix("~/"), path, dirs::home_dir()) {
        (Some(rest), _, Some(home)) => home.join(rest).to_string_lossy().into_owned(),
        (None, "~", Some(home)) => home.to_string_lossy().into_owned(),
        _ => path.to_string(),
    }
}
