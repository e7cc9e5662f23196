//! Assembler configuration.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `QUILL_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::Path;

use quill_compile::{Basis, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};

/// Defaults applied by the job assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Shots per circuit
    #[serde(default = "default_shots")]
    pub shots: u32,

    /// Credit budget for the job
    #[serde(default = "default_max_credits")]
    pub max_credits: u32,

    /// Basis used when a circuit config is not supplied
    #[serde(default)]
    pub basis_gates: Basis,

    /// Bound on nested rule expansion while unrolling
    #[serde(default = "default_max_unroll_depth")]
    pub max_unroll_depth: usize,
}

fn default_shots() -> u32 {
    1024
}

fn default_max_credits() -> u32 {
    10
}

fn default_max_unroll_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            shots: default_shots(),
            max_credits: default_max_credits(),
            basis_gates: Basis::default(),
            max_unroll_depth: default_max_unroll_depth(),
        }
    }
}

impl AssemblerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: AssemblerConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides.
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge `QUILL_*` environment variables into this configuration.
    ///
    /// Unset or unparsable variables leave the field unchanged.
    #[must_use]
    pub fn merge_env(self) -> Self {
        self.merge_with(|key| std::env::var(key).ok())
    }

    fn merge_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("QUILL_SHOTS") {
            if let Ok(val) = v.parse() {
                self.shots = val;
            }
        }
        if let Some(v) = lookup("QUILL_MAX_CREDITS") {
            if let Ok(val) = v.parse() {
                self.max_credits = val;
            }
        }
        if let Some(v) = lookup("QUILL_BASIS_GATES") {
            if let Ok(val) = v.parse() {
                self.basis_gates = val;
            }
        }
        if let Some(v) = lookup("QUILL_MAX_UNROLL_DEPTH") {
            if let Ok(val) = v.parse() {
                self.max_unroll_depth = val;
            }
        }
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shots == 0 {
            return Err(ConfigError::ValidationError(
                "shots must be greater than 0".to_string(),
            ));
        }
        if self.max_credits == 0 {
            return Err(ConfigError::ValidationError(
                "max_credits must be greater than 0".to_string(),
            ));
        }
        if self.max_unroll_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_unroll_depth must be greater than 0".to_string(),
            ));
        }
        if self.basis_gates.is_empty() {
            return Err(ConfigError::ValidationError(
                "basis_gates must name at least one gate".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
