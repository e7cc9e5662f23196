//! Quill Basis Unrolling
//!
//! This crate rewrites circuits into a fixed target basis. The
//! [`Unroller`] walks any [`CircuitSource`](quill_ir::CircuitSource) in
//! execution order, expands every gate outside the [`Basis`] through its
//! gate-library rule, and streams the result to an output strategy.
//!
//! # Architecture
//!
//! ```text
//! Circuit / CircuitDag / StructuredCircuit
//!       │
//!       ▼
//! ┌──────────┐
//! │ Unroller │ ◄── GateLibrary (rules), Basis (terminal names)
//! └──────────┘
//!       │
//!       ├── JsonBackend  → StructuredCircuit
//!       ├── QasmBackend  → String
//!       └── DagBackend   → CircuitDag
//! ```
//!
//! # Example
//!
//! ```rust
//! use quill_compile::{Basis, JsonBackend, Unroller};
//! use quill_ir::{Circuit, GateLibrary};
//!
//! let circuit = Circuit::bell().unwrap();
//! let mut unroller = Unroller::new(GateLibrary::standard(), Basis::default(), JsonBackend::new());
//! let payload = unroller.unroll(&circuit).unwrap();
//!
//! let names: Vec<_> = payload.operations().iter().map(|op| op.name.as_str()).collect();
//! assert_eq!(names, ["u2", "cx", "measure", "measure"]);
//! ```

pub mod backend;
pub mod basis;
pub mod error;
pub mod unroller;

pub use backend::{
    Conditional, DagBackend, JsonBackend, MAX_PAYLOAD_CLBITS, OperationRecord, QasmBackend,
    StructuredCircuit, StructuredHeader, UnrollBackend,
};
pub use basis::{Basis, DEFAULT_BASIS};
pub use error::{CompileError, CompileResult};
pub use unroller::{DEFAULT_MAX_DEPTH, Unroller};
