//! Circuit instructions combining operations with operands.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::{ClassicalCondition, Gate};
use crate::register::{Clbit, ClbitId, Qubit, QubitId};

/// Simulator directives understood by local simulators.
///
/// They have no decomposition and are passed through by the unroller.
/// Each one is explicitly its own inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulatorCommand {
    /// Restore the simulator state saved in `slot`.
    Load(u32),
    /// Save the simulator state into `slot`.
    Save(u32),
    /// Switch the simulator noise model on (non-zero) or off.
    Noise(u32),
}

impl SimulatorCommand {
    /// Directive name.
    pub fn name(self) -> &'static str {
        match self {
            SimulatorCommand::Load(_) => "load",
            SimulatorCommand::Save(_) => "save",
            SimulatorCommand::Noise(_) => "noise",
        }
    }

    /// The integer argument.
    pub fn argument(self) -> u32 {
        match self {
            SimulatorCommand::Load(v) | SimulatorCommand::Save(v) | SimulatorCommand::Noise(v) => v,
        }
    }
}

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A gate operation.
    Gate(Gate),
    /// Measurement operation.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point).
    Barrier,
    /// Simulator directive.
    Simulator(SimulatorCommand),
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Classical bits this instruction writes (for measure).
    pub clbits: Vec<ClbitId>,
    /// Optional classical condition gating the instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

impl Instruction {
    /// Create a gate instruction.
    pub fn gate(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate.into()),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            condition: None,
        }
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
            condition: None,
        }
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
            clbits: vec![],
            condition: None,
        }
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            condition: None,
        }
    }

    /// Create a simulator directive.
    pub fn simulator(command: SimulatorCommand, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Simulator(command),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            condition: None,
        }
    }

    /// Attach a classical condition, replacing any existing one.
    #[must_use]
    pub fn with_condition(mut self, condition: ClassicalCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// Non-gate instructions are never decomposed.
    pub fn is_directive(&self) -> bool {
        !self.is_gate()
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
            InstructionKind::Simulator(cmd) => cmd.name(),
        }
    }

    /// Whether the instruction is its own inverse.
    pub fn is_self_inverse(&self) -> bool {
        match &self.kind {
            InstructionKind::Gate(g) => g.is_self_inverse(),
            InstructionKind::Barrier | InstructionKind::Simulator(_) => true,
            InstructionKind::Measure | InstructionKind::Reset => false,
        }
    }

    /// The inverse instruction on the same wires, keeping the condition.
    ///
    /// Measurement and reset are irreversible.
    pub fn inverse(&self) -> IrResult<Self> {
        let kind = match &self.kind {
            InstructionKind::Gate(g) => InstructionKind::Gate(g.inverse()),
            InstructionKind::Barrier | InstructionKind::Simulator(_) => self.kind.clone(),
            InstructionKind::Measure | InstructionKind::Reset => {
                return Err(IrError::NotInvertible(self.name().to_string()));
            }
        };
        Ok(Self {
            kind,
            ..self.clone()
        })
    }

    /// Render the instruction as one line of circuit text.
    ///
    /// `qubits` and `clbits` are the circuit's wire tables, indexed by id;
    /// ids outside them fall back to the bare id form.
    pub fn to_qasm(&self, qubits: &[Qubit], clbits: &[Clbit]) -> String {
        let qarg = |id: &QubitId| {
            qubits
                .get(id.0 as usize)
                .map_or_else(|| id.to_string(), ToString::to_string)
        };
        let carg = |id: &ClbitId| {
            clbits
                .get(id.0 as usize)
                .map_or_else(|| id.to_string(), ToString::to_string)
        };
        let qargs = self.qubits.iter().map(qarg).collect::<Vec<_>>().join(",");

        let body = match &self.kind {
            InstructionKind::Gate(g) => format!("{g} {qargs}"),
            InstructionKind::Measure => {
                let cargs = self.clbits.iter().map(carg).collect::<Vec<_>>().join(",");
                format!("measure {qargs} -> {cargs}")
            }
            InstructionKind::Reset => format!("reset {qargs}"),
            InstructionKind::Barrier => format!("barrier {qargs}"),
            InstructionKind::Simulator(cmd) => format!("{}({}) {qargs}", cmd.name(), cmd.argument()),
        };

        match &self.condition {
            Some(cond) => format!("{cond} {body};"),
            None => format!("{body};"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_qasm(&[], &[]))
    }
}
