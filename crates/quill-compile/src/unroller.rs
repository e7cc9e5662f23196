//! Recursive basis unroller.

use std::sync::Arc;

use quill_ir::{CircuitDag, CircuitSource, GateLibrary, Instruction, IrError, ParameterExpression};
use tracing::{debug, info, instrument};

use crate::backend::UnrollBackend;
use crate::basis::Basis;
use crate::error::{CompileError, CompileResult};

/// Default bound on nested rule expansion.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Rewrites circuits into a target basis and streams the result to a backend.
///
/// Instructions are visited in the source's execution order. Basis gates and
/// directives (measure, reset, barrier, simulator commands) are emitted as
/// they are. Everything else is expanded through its library rule, depth
/// first, so the emitted stream keeps the relative order of every wire.
pub struct Unroller<B> {
    library: Arc<GateLibrary>,
    basis: Basis,
    max_depth: usize,
    backend: B,
}

impl<B: UnrollBackend> Unroller<B> {
    /// Create an unroller over a gate library.
    pub fn new(library: Arc<GateLibrary>, basis: Basis, backend: B) -> Self {
        Self {
            library,
            basis,
            max_depth: DEFAULT_MAX_DEPTH,
            backend,
        }
    }

    /// Set the bound on nested rule expansion.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Get the target basis.
    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// Get the expansion bound.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Take back the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Unroll a circuit and return the backend's payload.
    ///
    /// Fails on the first instruction that cannot be expanded; the backend
    /// is reset by the next call to `unroll`.
    #[instrument(skip_all, fields(circuit = source.name()))]
    pub fn unroll<S: CircuitSource>(&mut self, source: &S) -> CompileResult<B::Output> {
        let instructions = source.ordered_instructions();
        info!(
            "Unrolling {} instructions into basis [{}]",
            instructions.len(),
            self.basis
        );

        self.backend.begin(source)?;
        let mut emitted = 0;
        for inst in instructions {
            let expansion = self.expand(inst)?;
            for out in &expansion {
                self.backend.accept(out)?;
            }
            emitted += expansion.len();
        }

        info!("Unrolling complete, emitted {} instructions", emitted);
        self.backend.finish()
    }
}

impl<B> Unroller<B> {
    /// Whether an instruction is emitted without expansion.
    pub fn is_terminal(&self, inst: &Instruction) -> bool {
        match inst.as_gate() {
            None => true,
            Some(gate) => !gate.is_adjoint() && self.basis.contains(gate.name()),
        }
    }

    /// Fully expand one instruction into basis gates and directives.
    pub fn expand(&self, inst: &Instruction) -> CompileResult<Vec<Instruction>> {
        let mut out = Vec::new();
        self.expand_into(inst, 0, &mut out)?;
        Ok(out)
    }

    /// Replace every non-terminal node of a DAG with its full expansion.
    ///
    /// Returns the number of nodes replaced.
    #[instrument(skip_all, fields(circuit = dag.name()))]
    pub fn rewrite_dag(&self, dag: &mut CircuitDag) -> CompileResult<usize> {
        let targets: Vec<_> = dag
            .topological_ops()
            .into_iter()
            .filter(|(_, inst)| !self.is_terminal(inst))
            .map(|(node, _)| node)
            .collect();

        for &node in &targets {
            let inst = dag.get_instruction(node).cloned().ok_or(IrError::InvalidNode)?;
            let expansion = self.expand(&inst)?;
            debug!("Rewriting '{}' into {} instructions", inst.name(), expansion.len());
            dag.substitute(node, expansion)?;
        }

        info!(
            "Rewrote {} nodes, DAG now has {} ops",
            targets.len(),
            dag.num_ops()
        );
        Ok(targets.len())
    }

    fn expand_into(
        &self,
        inst: &Instruction,
        depth: usize,
        out: &mut Vec<Instruction>,
    ) -> CompileResult<()> {
        if self.is_terminal(inst) {
            out.push(inst.clone());
            return Ok(());
        }
        let Some(gate) = inst.as_gate() else {
            out.push(inst.clone());
            return Ok(());
        };
        let name = gate.name();

        if depth >= self.max_depth {
            return Err(CompileError::RecursionLimit {
                gate: name.to_string(),
                depth,
            });
        }

        let definition = self
            .library
            .get(name)
            .ok_or_else(|| CompileError::MissingRule(name.to_string()))?;
        let params: Vec<ParameterExpression> = gate.parameters().into_iter().cloned().collect();
        let mut body = definition
            .decompose(&params)?
            .ok_or_else(|| CompileError::MissingRule(name.to_string()))?;

        if gate.is_adjoint() {
            body = body
                .iter()
                .rev()
                .map(Instruction::inverse)
                .collect::<Result<Vec<_>, _>>()?;
        }

        for formal in body {
            let actual = rebind(formal, inst, name)?;
            self.expand_into(&actual, depth + 1, out)?;
        }
        Ok(())
    }
}

/// Map a rule instruction over formal qubits onto the caller's wires.
///
/// The caller's condition replaces whatever the rule instruction carried.
fn rebind(formal: Instruction, actual: &Instruction, gate: &str) -> CompileResult<Instruction> {
    if !formal.clbits.is_empty() {
        return Err(CompileError::MalformedRule {
            gate: gate.to_string(),
            reason: format!("'{}' writes classical bits", formal.name()),
        });
    }
    let qubits = formal
        .qubits
        .iter()
        .map(|q| {
            actual
                .qubits
                .get(q.0 as usize)
                .copied()
                .ok_or_else(|| CompileError::MalformedRule {
                    gate: gate.to_string(),
                    reason: format!(
                        "formal qubit {} out of range for {} qubits",
                        q.0,
                        actual.qubits.len()
                    ),
                })
        })
        .collect::<CompileResult<Vec<_>>>()?;

    Ok(Instruction {
        kind: formal.kind,
        qubits,
        clbits: vec![],
        condition: actual.condition.clone(),
    })
}
