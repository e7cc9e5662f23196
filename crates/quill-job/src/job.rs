//! `QuantumJob`: an assembled Qobj plus its run context and result slot.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assembler::{JobAssembler, JobCircuit, JobMode};
use crate::backend::BackendInfo;
use crate::error::{JobError, JobResult};
use crate::qobj::Qobj;

/// Resource requirements of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub max_credits: u32,
}

impl Default for Resources {
    fn default() -> Self {
        Self { max_credits: 10 }
    }
}

/// A job ready for submission.
///
/// The Qobj is built once, in [`QuantumJob::new`], and never changes. The
/// result slot starts empty and can be written once by whoever runs the job.
#[derive(Debug)]
pub struct QuantumJob {
    qobj: Qobj,
    backend_name: String,
    mode: JobMode,
    resources: Resources,
    seed: Option<u64>,
    created_at: DateTime<Utc>,
    result: OnceLock<serde_json::Value>,
}

impl QuantumJob {
    /// Assemble `circuits` for `backend` with the assembler's parameters.
    pub fn new(
        circuits: Vec<JobCircuit>,
        backend: &dyn BackendInfo,
        assembler: &JobAssembler,
    ) -> JobResult<Self> {
        let qobj = assembler.assemble(circuits, backend)?;
        let job = Self {
            backend_name: backend.name().to_string(),
            mode: assembler.mode_for(backend),
            resources: Resources {
                max_credits: qobj.config.max_credits,
            },
            seed: assembler.seed_value(),
            created_at: Utc::now(),
            result: OnceLock::new(),
            qobj,
        };
        info!(
            "Created job {} for backend '{}' ({} circuits, {})",
            job.qobj.id,
            job.backend_name,
            job.qobj.circuits.len(),
            job.mode
        );
        Ok(job)
    }

    pub fn qobj(&self) -> &Qobj {
        &self.qobj
    }

    /// Job id, shared with the Qobj.
    pub fn id(&self) -> &str {
        &self.qobj.id
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn mode(&self) -> JobMode {
        self.mode
    }

    pub fn resources(&self) -> Resources {
        self.resources
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The result, once written.
    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.get()
    }

    /// Whether a result has been written.
    pub fn is_complete(&self) -> bool {
        self.result.get().is_some()
    }

    /// Store the execution result. Only the first write succeeds.
    pub fn set_result(&self, result: serde_json::Value) -> JobResult<()> {
        self.result
            .set(result)
            .map_err(|_| JobError::ResultAlreadySet)?;
        info!("Job {} completed", self.qobj.id);
        Ok(())
    }
}
