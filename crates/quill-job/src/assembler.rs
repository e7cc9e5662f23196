//! The job assembler: circuits plus run parameters in, one [`Qobj`] out.

use std::fmt;
use std::sync::Arc;

use quill_compile::{JsonBackend, Unroller};
use quill_ir::{Circuit, CircuitDag, CircuitSource, GateLibrary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::backend::BackendInfo;
use crate::config::AssemblerConfig;
use crate::error::{JobError, JobResult};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::qobj::{CircuitConfig, CircuitPayload, CircuitRecord, Qobj, QobjConfig};

/// How the payloads of a job are produced.
///
/// Chosen once per assembly from the mode flags and the backend locality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    /// Payloads supplied by the caller and stored verbatim.
    Preformatted,
    /// Unrolled into the structured payload, for local backends.
    CompiledStructured,
    /// Circuit text, for remote backends.
    CompiledTextual,
    /// Payloads left empty for a later step.
    Deferred,
}

impl JobMode {
    /// Pick the mode. `preformatted` wins over `do_compile`.
    pub fn select(preformatted: bool, do_compile: bool, local: bool) -> Self {
        match (preformatted, do_compile, local) {
            (true, _, _) => JobMode::Preformatted,
            (false, true, _) => JobMode::Deferred,
            (false, false, true) => JobMode::CompiledStructured,
            (false, false, false) => JobMode::CompiledTextual,
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobMode::Preformatted => "preformatted",
            JobMode::CompiledStructured => "compiled-structured",
            JobMode::CompiledTextual => "compiled-textual",
            JobMode::Deferred => "deferred",
        };
        f.write_str(name)
    }
}

/// One input to the assembler.
#[derive(Debug, Clone)]
pub enum JobCircuit {
    /// A circuit as built.
    Raw(Circuit),
    /// A circuit already in DAG form.
    Dag(CircuitDag),
    /// A payload compiled elsewhere.
    Preformatted(CircuitPayload),
}

impl JobCircuit {
    fn label(&self) -> &str {
        match self {
            JobCircuit::Raw(c) => c.name(),
            JobCircuit::Dag(d) => d.name(),
            JobCircuit::Preformatted(_) => "preformatted",
        }
    }
}

impl From<Circuit> for JobCircuit {
    fn from(circuit: Circuit) -> Self {
        JobCircuit::Raw(circuit)
    }
}

impl From<CircuitDag> for JobCircuit {
    fn from(dag: CircuitDag) -> Self {
        JobCircuit::Dag(dag)
    }
}

impl From<CircuitPayload> for JobCircuit {
    fn from(payload: CircuitPayload) -> Self {
        JobCircuit::Preformatted(payload)
    }
}

/// Builder-style job assembler.
///
/// ```rust
/// use quill_ir::Circuit;
/// use quill_job::{BackendConfiguration, JobAssembler};
///
/// let qobj = JobAssembler::new()
///     .shots(512)
///     .assemble(
///         vec![Circuit::bell().unwrap().into()],
///         &BackendConfiguration::local("local_qasm_simulator"),
///     )
///     .unwrap();
/// assert_eq!(qobj.config.shots, 512);
/// assert!(qobj.circuits[0].compiled_circuit.is_some());
/// ```
#[derive(Clone)]
#[must_use]
pub struct JobAssembler {
    config: AssemblerConfig,
    seed: Option<u64>,
    names: Option<Vec<String>>,
    circuit_configs: Option<Vec<CircuitConfig>>,
    preformatted: bool,
    do_compile: bool,
    library: Arc<GateLibrary>,
    ids: Arc<dyn IdGenerator>,
}

impl fmt::Debug for JobAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobAssembler")
            .field("config", &self.config)
            .field("seed", &self.seed)
            .field("names", &self.names)
            .field("circuit_configs", &self.circuit_configs)
            .field("preformatted", &self.preformatted)
            .field("do_compile", &self.do_compile)
            .finish_non_exhaustive()
    }
}

impl Default for JobAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobAssembler {
    /// Assembler with default run parameters and random ids.
    pub fn new() -> Self {
        Self::with_config(AssemblerConfig::default())
    }

    /// Assembler with the given defaults.
    pub fn with_config(config: AssemblerConfig) -> Self {
        Self {
            config,
            seed: None,
            names: None,
            circuit_configs: None,
            preformatted: false,
            do_compile: false,
            library: GateLibrary::standard(),
            ids: Arc::new(UuidGenerator),
        }
    }

    pub fn shots(mut self, shots: u32) -> Self {
        self.config.shots = shots;
        self
    }

    /// Credit budget of the job.
    pub fn max_credits(mut self, max_credits: u32) -> Self {
        self.config.max_credits = max_credits;
        self
    }

    /// Simulator seed, copied into default circuit configs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Circuit names, one per circuit.
    pub fn names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Per-circuit configs, one per circuit.
    pub fn circuit_configs(mut self, configs: Vec<CircuitConfig>) -> Self {
        self.circuit_configs = Some(configs);
        self
    }

    /// Circuits are payloads compiled elsewhere.
    pub fn preformatted(mut self, preformatted: bool) -> Self {
        self.preformatted = preformatted;
        self
    }

    /// Leave payloads empty for a later compile step.
    pub fn do_compile(mut self, do_compile: bool) -> Self {
        self.do_compile = do_compile;
        self
    }

    /// Gate library used to unroll DAG inputs. Raw circuits use their own.
    pub fn library(mut self, library: Arc<GateLibrary>) -> Self {
        self.library = library;
        self
    }

    /// Source of circuit names and Qobj ids.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Get the run defaults.
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub(crate) fn seed_value(&self) -> Option<u64> {
        self.seed
    }

    /// The mode this assembler would use for a backend.
    pub fn mode_for(&self, backend: &dyn BackendInfo) -> JobMode {
        JobMode::select(self.preformatted, self.do_compile, backend.is_local())
    }

    /// Build the Qobj for `circuits` on `backend`.
    ///
    /// Fails without partial output on the first invalid input.
    #[instrument(skip_all, fields(backend = backend.name(), circuits = circuits.len()))]
    pub fn assemble(&self, circuits: Vec<JobCircuit>, backend: &dyn BackendInfo) -> JobResult<Qobj> {
        self.config.validate()?;
        if circuits.is_empty() {
            return Err(JobError::Validation("no circuits to assemble".into()));
        }

        let mode = self.mode_for(backend);
        info!("Assembling {} circuits in {} mode", circuits.len(), mode);

        let names = self.resolve_names(circuits.len(), mode)?;
        let configs = self.resolve_configs(circuits.len(), mode)?;

        let mut records = Vec::with_capacity(circuits.len());
        for (index, ((circuit, name), config)) in
            circuits.into_iter().zip(names).zip(configs).enumerate()
        {
            let payload = self.payload(index, circuit, &config, mode)?;
            debug!("Circuit {} '{}' assembled", index, name);
            records.push(CircuitRecord::new(name, payload, config));
        }

        let qobj = Qobj {
            id: self.ids.next_id(),
            config: QobjConfig {
                max_credits: self.config.max_credits,
                shots: self.config.shots,
                backend_name: backend.name().to_string(),
            },
            circuits: records,
        };
        info!("Assembled qobj {}", qobj.id);
        Ok(qobj)
    }

    fn resolve_names(&self, count: usize, mode: JobMode) -> JobResult<Vec<String>> {
        match &self.names {
            Some(names) if names.len() == count => Ok(names.clone()),
            Some(names) => Err(JobError::Validation(format!(
                "{} names for {count} circuits",
                names.len()
            ))),
            None if mode == JobMode::Preformatted => Err(JobError::Validation(
                "preformatted circuits need explicit names".into(),
            )),
            None => Ok((0..count).map(|_| self.ids.next_id()).collect()),
        }
    }

    fn resolve_configs(&self, count: usize, mode: JobMode) -> JobResult<Vec<CircuitConfig>> {
        match &self.circuit_configs {
            Some(configs) if configs.len() == count => Ok(configs.clone()),
            Some(configs) => Err(JobError::Validation(format!(
                "{} circuit configs for {count} circuits",
                configs.len()
            ))),
            None if mode == JobMode::Preformatted => Err(JobError::Validation(
                "preformatted circuits need explicit circuit configs".into(),
            )),
            None => Ok(vec![
                CircuitConfig {
                    basis_gates: self.config.basis_gates.clone(),
                    seed: self.seed,
                    ..CircuitConfig::default()
                };
                count
            ]),
        }
    }

    fn payload(
        &self,
        index: usize,
        circuit: JobCircuit,
        config: &CircuitConfig,
        mode: JobMode,
    ) -> JobResult<Option<CircuitPayload>> {
        let label = circuit.label().to_string();
        let ir_error = |source| JobError::Ir {
            index,
            name: label.clone(),
            source,
        };

        match (mode, circuit) {
            (JobMode::Preformatted, JobCircuit::Preformatted(payload)) => Ok(Some(payload)),
            (JobMode::Preformatted, _) => Err(JobError::Validation(format!(
                "circuit {index} ('{label}') is not a compiled payload"
            ))),
            (_, JobCircuit::Preformatted(_)) => Err(JobError::Validation(format!(
                "circuit {index} is a compiled payload but the job is not preformatted"
            ))),
            (JobMode::Deferred, _) => Ok(None),
            (JobMode::CompiledStructured, JobCircuit::Raw(c)) => {
                let dag = c.to_dag().map_err(ir_error)?;
                self.unroll(index, &label, c.library().clone(), &dag, config)
            }
            (JobMode::CompiledStructured, JobCircuit::Dag(d)) => {
                self.unroll(index, &label, self.library.clone(), &d, config)
            }
            (JobMode::CompiledTextual, JobCircuit::Raw(c)) => {
                let text = quill_qasm::emit_with_definitions(&c, c.library()).map_err(ir_error)?;
                Ok(Some(CircuitPayload::Textual(text)))
            }
            (JobMode::CompiledTextual, JobCircuit::Dag(d)) => {
                let text = quill_qasm::emit_with_definitions(&d, &self.library).map_err(ir_error)?;
                Ok(Some(CircuitPayload::Textual(text)))
            }
        }
    }

    fn unroll(
        &self,
        index: usize,
        label: &str,
        library: Arc<GateLibrary>,
        dag: &CircuitDag,
        config: &CircuitConfig,
    ) -> JobResult<Option<CircuitPayload>> {
        let mut unroller = Unroller::new(library, config.basis_gates.clone(), JsonBackend::new())
            .with_max_depth(self.config.max_unroll_depth);
        let structured = unroller
            .unroll(dag)
            .map_err(|source| JobError::Compilation {
                index,
                name: label.to_string(),
                source,
            })?;
        Ok(Some(CircuitPayload::Structured(structured)))
    }
}
