//! Quill Job Assembly
//!
//! Packages one or more circuits with run parameters into a single
//! [`Qobj`]. How each circuit's payload is produced depends on the
//! [`JobMode`]:
//!
//! | Mode | Chosen when | Payload |
//! |------|-------------|---------|
//! | `Preformatted` | `preformatted(true)` | caller's payload, verbatim |
//! | `Deferred` | `do_compile(true)` | none |
//! | `CompiledStructured` | local backend | unrolled [`StructuredCircuit`](quill_compile::StructuredCircuit) |
//! | `CompiledTextual` | remote backend | circuit text with gate definitions |
//!
//! # Example
//!
//! ```rust
//! use quill_ir::Circuit;
//! use quill_job::{BackendConfiguration, JobAssembler, QuantumJob};
//!
//! let assembler = JobAssembler::new().names(["bell"]).seed(7);
//! let job = QuantumJob::new(
//!     vec![Circuit::bell().unwrap().into()],
//!     &BackendConfiguration::remote("ibmqx5"),
//!     &assembler,
//! )
//! .unwrap();
//!
//! let record = job.qobj().circuit("bell").unwrap();
//! assert!(record.compiled_circuit.is_none());
//! assert!(record.compiled_circuit_qasm.as_deref().unwrap().contains("cx q[0],q[1];"));
//! ```

pub mod assembler;
pub mod backend;
pub mod config;
pub mod error;
pub mod ids;
pub mod job;
pub mod qobj;

pub use assembler::{JobAssembler, JobCircuit, JobMode};
pub use backend::{BackendCatalog, BackendConfiguration, BackendFilter, BackendInfo};
pub use config::{AssemblerConfig, ConfigError};
pub use error::{JobError, JobResult};
pub use ids::{IdGenerator, SequentialIds, UuidGenerator};
pub use job::{QuantumJob, Resources};
pub use qobj::{CircuitConfig, CircuitPayload, CircuitRecord, CouplingMap, Layout, Qobj, QobjConfig};
