//! `OpenQASM` 2 Reader and Writer for Quill
//!
//! The textual form of a Quill circuit is `OpenQASM` 2.0 plus two
//! extensions: simulator commands (`load`, `save`, `noise`) and the
//! `inv @` prefix marking the adjoint of a composite gate.
//!
//! # Supported Features
//!
//! | Feature | Example |
//! |---------|---------|
//! | Version declaration | `OPENQASM 2.0;` |
//! | Standard header | `include "qelib1.inc";` |
//! | Registers | `qreg q[5];`, `creg c[5];` |
//! | Gate calls | `h q[0];`, `cx q[0],q[1];`, `u1(pi/4) q;` |
//! | Built-ins | `U(θ,φ,λ) q[0];`, `CX q[0],q[1];` |
//! | Conditions | `if(c==1) x q[0];` |
//! | Measurement | `measure q -> c;` |
//! | Reset / barrier | `reset q[0];`, `barrier q[0],q[1];` |
//! | Definitions | `gate g(a) t { u1(a) t; }`, `opaque g a,b;` |
//! | Adjoint | `inv @ g(0.5) q[0];` |
//! | Simulator commands | `load(1) q[0];`, `save(1);`, `noise(0) q[0];` |
//!
//! # Example: Round-Trip
//!
//! ```rust
//! use quill_ir::{Circuit, CircuitSource};
//! use quill_qasm::{emit, parse};
//!
//! let circuit = Circuit::bell().unwrap();
//! let qasm = emit(&circuit);
//! assert!(qasm.contains("cx q[0],q[1];"));
//!
//! let reparsed = parse(&qasm).unwrap();
//! assert_eq!(reparsed.to_qasm_lines(), circuit.to_qasm_lines());
//! assert_eq!(reparsed.ordered_instructions().len(), 4);
//! ```

mod ast;
mod emitter;
mod error;
mod lexer;
mod parser;

pub use emitter::{emit, emit_with_definitions};
pub use error::{ParseError, ParseResult};
pub use parser::{PARSED_CIRCUIT_NAME, parse, parse_ast, parse_dag, parse_with_library};

/// AST types, for callers that want the program before lowering.
pub mod syntax {
    pub use crate::ast::*;
}
