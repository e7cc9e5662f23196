//! Output strategies for the unroller.
//!
//! The unroller walks a circuit once and hands every emitted instruction to
//! an [`UnrollBackend`]. Each backend turns that stream into its own payload:
//!
//! - [`JsonBackend`]: the structured payload ([`StructuredCircuit`])
//! - [`QasmBackend`]: circuit text
//! - [`DagBackend`]: a fresh [`CircuitDag`](quill_ir::CircuitDag)

mod dag;
mod json;
mod qasm;

pub use dag::DagBackend;
pub use json::{
    Conditional, JsonBackend, MAX_PAYLOAD_CLBITS, OperationRecord, StructuredCircuit,
    StructuredHeader,
};
pub use qasm::QasmBackend;

use quill_ir::{CircuitSource, Instruction};

use crate::error::CompileResult;

/// Receiver of the unroller's instruction stream.
pub trait UnrollBackend {
    /// Payload produced once the stream ends.
    type Output;

    /// Start a new circuit. Called once before any instruction.
    fn begin(&mut self, source: &dyn CircuitSource) -> CompileResult<()>;

    /// Accept one emitted instruction.
    fn accept(&mut self, instruction: &Instruction) -> CompileResult<()>;

    /// End the circuit and hand out the payload, resetting the backend.
    fn finish(&mut self) -> CompileResult<Self::Output>;
}
