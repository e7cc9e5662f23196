//! Error types for the IR crate.

use crate::register::{ClbitId, QubitId, RegisterKind};
use thiserror::Error;

/// Validation errors raised while building circuits, libraries and DAGs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Register name not registered on the circuit.
    #[error("Register '{name}' is not registered{}", format_gate_context(.gate_name))]
    UnknownRegister {
        /// The register that was not found.
        name: String,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Register name already in use.
    #[error("Register '{0}' is already registered")]
    DuplicateRegister(String),

    /// Wire index past the end of its register.
    #[error("Index {index} out of range for register '{register}' of size {size}")]
    WireOutOfRange {
        /// Register name.
        register: String,
        /// Offending index.
        index: u32,
        /// Register size.
        size: u32,
    },

    /// A quantum register was given where a classical one was needed, or vice versa.
    #[error("Register '{register}' is not a {expected} register{}", format_gate_context(.gate_name))]
    WrongWireKind {
        /// Register name.
        register: String,
        /// Kind the operation expected.
        expected: RegisterKind,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Qubit not found in the DAG.
    #[error("Qubit {qubit:?} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit not found in the DAG.
    #[error("Classical bit {clbit:?} not found in circuit{}", format_gate_context(.gate_name))]
    ClbitNotFound {
        /// The classical bit that was not found.
        clbit: ClbitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Gate requires different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Operation requires a different number of classical bits.
    #[error("Operation '{gate_name}' requires {expected} classical bits, got {got}")]
    ClbitCountMismatch {
        /// Name of the operation.
        gate_name: String,
        /// Expected number of bits.
        expected: u32,
        /// Actual number of bits provided.
        got: u32,
    },

    /// Gate requires a different number of parameters.
    #[error("Gate '{gate_name}' requires {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected parameter count.
        expected: usize,
        /// Actual parameter count.
        got: usize,
    },

    /// Parameter value not accepted by the operation.
    #[error("Invalid parameter for '{gate_name}': {reason}")]
    InvalidParameter {
        /// Name of the operation.
        gate_name: String,
        /// Description of the problem.
        reason: String,
    },

    /// Register arguments of one call have different sizes.
    #[error("Register arguments of '{gate_name}' have different sizes ({first} and {second})")]
    RegisterSizeMismatch {
        /// Name of the operation.
        gate_name: String,
        /// Size of the first register argument.
        first: u32,
        /// Size of the conflicting register argument.
        second: u32,
    },

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit:?} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// An instruction set must hold at least one instruction.
    #[error("Instruction set is empty")]
    EmptyInstructionSet,

    /// Operation name unknown to the gate library.
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    /// Classical condition does not name a classical register or its value does not fit.
    #[error("Invalid condition {register}=={value}: {reason}")]
    InvalidCondition {
        /// Register named by the condition.
        register: String,
        /// Compared value.
        value: u64,
        /// What is wrong with it.
        reason: String,
    },

    /// Operation has no inverse.
    #[error("Operation '{0}' is not invertible")]
    NotInvertible(String),

    /// Decomposition rules reference each other in a cycle.
    #[error("Decomposition rule cycle: {0}")]
    CyclicRule(String),

    /// Decomposition rule produced an instruction it is not allowed to produce.
    #[error("Malformed decomposition rule for '{gate}': {reason}")]
    InvalidRule {
        /// Gate whose rule is malformed.
        gate: String,
        /// Description of the problem.
        reason: String,
    },

    /// Invalid DAG structure.
    #[error("Invalid DAG structure: {0}")]
    InvalidDag(String),

    /// Invalid node index.
    #[error("Invalid node index")]
    InvalidNode,
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
