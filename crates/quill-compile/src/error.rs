//! Error types for the compilation crate.

use thiserror::Error;

/// Errors that can occur during unrolling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] quill_ir::IrError),

    /// Gate is outside the basis and has no decomposition rule.
    #[error("No decomposition rule for '{0}', and it is not in the basis")]
    MissingRule(String),

    /// Decomposition nested deeper than the configured bound.
    #[error("Unrolling '{gate}' exceeded the recursion limit of {depth}")]
    RecursionLimit { gate: String, depth: usize },

    /// A rule produced an instruction that cannot be rebound.
    #[error("Malformed decomposition rule for '{gate}': {reason}")]
    MalformedRule { gate: String, reason: String },

    /// A parameter could not be evaluated to a number.
    #[error("Parameter '{parameter}' of '{gate}' is not bound to a value")]
    UnboundParameter { gate: String, parameter: String },

    /// Basis string could not be read.
    #[error("Invalid basis: {0}")]
    InvalidBasis(String),

    /// Structured payload is inconsistent.
    #[error("Invalid structured payload: {0}")]
    InvalidPayload(String),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
