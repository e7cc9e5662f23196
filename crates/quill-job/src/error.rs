//! Error types for job assembly.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while assembling or completing a job.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JobError {
    /// Caller input is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A circuit could not be unrolled.
    #[error("Compiling circuit {index} ('{name}') failed: {source}")]
    Compilation {
        /// Position in the input list.
        index: usize,
        /// Circuit name.
        name: String,
        #[source]
        source: quill_compile::CompileError,
    },

    /// A circuit could not be converted or described.
    #[error("Circuit {index} ('{name}') is invalid: {source}")]
    Ir {
        /// Position in the input list.
        index: usize,
        /// Circuit name.
        name: String,
        #[source]
        source: quill_ir::IrError,
    },

    /// Run parameters or assembler configuration are invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The result slot was already written.
    #[error("Job result is already set")]
    ResultAlreadySet,

    /// Qobj encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;
