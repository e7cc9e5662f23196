//! Quill Circuit Intermediate Representation
//!
//! This crate provides the core data structures for representing quantum
//! circuits in Quill. Everything else in the stack (the QASM front end, the
//! unroller and the job assembler) is built on top of it.
//!
//! # Overview
//!
//! Circuits are built through [`Circuit::apply`], which takes an operation
//! name, its parameters, wire or whole-register arguments and an optional
//! classical condition. Register arguments are broadcast, so `h q;` on a
//! three-qubit register yields three instructions, returned together as an
//! [`InstructionSet`].
//!
//! For rewriting, a circuit is converted into a [`CircuitDag`]: one input and
//! one output node per wire, operations in between, edges labelled by wire.
//! The DAG keeps a stable topological order so that a circuit without
//! rewrites always reads back in declaration order.
//!
//! # Core Components
//!
//! - **Registers and wires**: [`Register`], [`WireRef`], [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] with closed-form inverses, [`CompositeGate`]
//!   for library-defined gates
//! - **Parameters**: [`ParameterExpression`] for symbolic angles
//! - **Instructions**: [`Instruction`], [`InstructionSet`]
//! - **Gate library**: [`GateLibrary`], [`GateDefinition`], [`GateLibraryBuilder`]
//! - **DAG**: [`CircuitDag`]
//! - **Adapter**: [`CircuitSource`], the read-only view shared by both forms
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use quill_ir::{Circuit, CircuitSource};
//!
//! let mut circuit = Circuit::new("bell");
//! circuit.add_qreg("q", 2).unwrap();
//! circuit.add_creg("c", 2).unwrap();
//!
//! circuit.h(("q", 0)).unwrap();
//! circuit.cx(("q", 0), ("q", 1)).unwrap();
//!
//! // Register arguments broadcast: two measurements.
//! let set = circuit.measure("q", "c").unwrap();
//! assert_eq!(set.len(), 2);
//!
//! let dag = circuit.to_dag().unwrap();
//! assert_eq!(dag.ordered_instructions().len(), 4);
//! ```
//!
//! # Example: Inverting a Sequence
//!
//! ```rust
//! use quill_ir::Circuit;
//!
//! let mut circuit = Circuit::new("inv");
//! circuit.add_qreg("q", 1).unwrap();
//! let set = circuit.s("q").unwrap();
//! let inverse = set.inverse().unwrap();
//! assert_eq!(inverse.instructions()[0].name(), "sdg");
//! ```

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod instruction_set;
pub mod library;
pub mod parameter;
pub mod register;
pub mod source;

pub use circuit::{Arg, Circuit};
pub use dag::{CircuitDag, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{ClassicalCondition, CompositeGate, Gate, StandardGate};
pub use instruction::{Instruction, InstructionKind, SimulatorCommand};
pub use instruction_set::InstructionSet;
pub use library::{DecompositionRule, GateDefinition, GateLibrary, GateLibraryBuilder};
pub use parameter::ParameterExpression;
pub use register::{Clbit, ClbitId, Qubit, QubitId, Register, RegisterKind, WireRef};
pub use source::CircuitSource;
