//! Configuration schema
//!
//! Typed configuration for the engine, the ML boundary, the audit trail,
//! and logging. Every section has serde defaults so a partial `cloak.toml`
//! is enough; `validate()` is called after loading and env overrides.

use crate::domain::{CloakError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloakConfig {
    /// Detection engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// Token-classification service
    #[serde(default)]
    pub ml: MlConfig,

    /// Audit trail
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CloakConfig {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.ml.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Detection engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard input ceiling in bytes; larger documents are rejected
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,

    /// Context window in characters on each side of an entity
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Multiplier applied to context word weights
    #[serde(default = "default_context_boost_factor")]
    pub context_boost_factor: f64,

    /// Confidence floor once any positive context was found
    #[serde(default = "default_context_boosted_floor")]
    pub context_boosted_floor: f64,

    /// Grouped addresses below this confidence are flagged for review
    #[serde(default = "default_address_review_threshold")]
    pub address_review_threshold: f64,

    /// Grouped addresses at or above this confidence auto-anonymize
    #[serde(default = "default_address_auto_threshold")]
    pub address_auto_threshold: f64,

    /// Maximum gap in bytes between grouped address components
    #[serde(default = "default_address_max_gap")]
    pub address_max_gap: usize,

    /// Feature flag for the deny-list/context-enhancement stages
    #[serde(default = "default_true")]
    pub filtering_enabled: bool,

    /// Optional external recognizer file layered over the built-ins
    pub recognizer_file: Option<PathBuf>,
}

fn default_max_input_bytes() -> usize {
    1_000_000
}
fn default_context_window() -> usize {
    50
}
fn default_context_boost_factor() -> f64 {
    0.3
}
fn default_context_boosted_floor() -> f64 {
    0.4
}
fn default_address_review_threshold() -> f64 {
    0.6
}
fn default_address_auto_threshold() -> f64 {
    0.85
}
fn default_address_max_gap() -> usize {
    16
}
fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: default_max_input_bytes(),
            context_window: default_context_window(),
            context_boost_factor: default_context_boost_factor(),
            context_boosted_floor: default_context_boosted_floor(),
            address_review_threshold: default_address_review_threshold(),
            address_auto_threshold: default_address_auto_threshold(),
            address_max_gap: default_address_max_gap(),
            filtering_enabled: default_true(),
            recognizer_file: None,
        }
    }
}

impl EngineConfig {
    /// Validate engine tuning values
    pub fn validate(&self) -> Result<()> {
        if self.max_input_bytes == 0 {
            return Err(CloakError::Configuration(
                "engine.max_input_bytes must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("engine.context_boost_factor", self.context_boost_factor),
            ("engine.context_boosted_floor", self.context_boosted_floor),
            (
                "engine.address_review_threshold",
                self.address_review_threshold,
            ),
            ("engine.address_auto_threshold", self.address_auto_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CloakError::Configuration(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.address_review_threshold > self.address_auto_threshold {
            return Err(CloakError::Configuration(
                "engine.address_review_threshold must not exceed engine.address_auto_threshold"
                    .to_string(),
            ));
        }
        if let Some(path) = &self.recognizer_file {
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                return Err(CloakError::Configuration(format!(
                    "engine.recognizer_file must be a TOML file: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Token-classification service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlConfig {
    /// Enable ML recognition; rule-based detection always runs
    #[serde(default)]
    pub enabled: bool,

    /// Inference endpoint URL
    pub endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_ml_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry attempts per chunk
    #[serde(default = "default_ml_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff in milliseconds, doubled per attempt
    #[serde(default = "default_ml_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Input ceiling per inference call; longer text is chunked
    #[serde(default = "default_ml_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_ml_timeout_secs() -> u64 {
    30
}
fn default_ml_max_attempts() -> u32 {
    3
}
fn default_ml_base_backoff_ms() -> u64 {
    200
}
fn default_ml_max_input_chars() -> usize {
    10_000
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            timeout_secs: default_ml_timeout_secs(),
            max_attempts: default_ml_max_attempts(),
            base_backoff_ms: default_ml_base_backoff_ms(),
            max_input_chars: default_ml_max_input_chars(),
        }
    }
}

impl MlConfig {
    /// Validate ML settings
    pub fn validate(&self) -> Result<()> {
        if self.enabled {
            let endpoint = self.endpoint.as_deref().ok_or_else(|| {
                CloakError::Configuration(
                    "ml.endpoint is required when ml.enabled is true".to_string(),
                )
            })?;
            url::Url::parse(endpoint).map_err(|e| {
                CloakError::Configuration(format!("ml.endpoint is not a valid URL: {e}"))
            })?;
            if self.max_attempts == 0 {
                return Err(CloakError::Configuration(
                    "ml.max_attempts must be at least 1".to_string(),
                ));
            }
            if self.max_input_chars == 0 {
                return Err(CloakError::Configuration(
                    "ml.max_input_chars must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Audit trail settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable the JSONL audit trail
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/cloak.jsonl")
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
        }
    }
}

impl AuditConfig {
    /// Validate audit settings
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err(CloakError::Configuration(
                "audit.log_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Log file directory
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation: daily or hourly
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_path() -> String {
    "./logs".to_string()
}
fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    /// Validate logging settings
    pub fn validate(&self) -> Result<()> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(CloakError::Configuration(format!(
                "logging.level must be one of trace, debug, info, warn, error; got '{other}'"
            ))),
        }
    }
}
