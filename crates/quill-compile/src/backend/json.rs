//! Structured output strategy and the structured payload types.
//!
//! A [`StructuredCircuit`] serializes as
//!
//! ```json
//! {
//!   "header": {
//!     "name": "bell",
//!     "number_of_qubits": 2,
//!     "number_of_clbits": 2,
//!     "qubit_labels": [["q", 0], ["q", 1]],
//!     "clbit_labels": [["c", 2]]
//!   },
//!   "operations": [
//!     {"name": "u2", "params": [0.0, 3.141592653589793], "qubits": [0], "clbits": [], "conditional": null}
//!   ]
//! }
//! ```
//!
//! `qubit_labels` holds one `[register, index]` pair per qubit and
//! `clbit_labels` one `[register, size]` pair per classical register. Wire
//! numbers are flat positions in register declaration order. A condition on
//! register `c` with flat offset `o` and width `w` is encoded as
//! `mask = ((1 << w) - 1) << o` and `val = value << o`, both in hex.
//!
//! The payload is checked when it is decoded, so a deserialized value can be
//! fed back into the unroller as a [`CircuitSource`].

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use quill_ir::{
    CircuitSource, ClassicalCondition, Clbit, ClbitId, CompositeGate, Gate, Instruction,
    InstructionKind, ParameterExpression, Qubit, QubitId, Register, SimulatorCommand,
    StandardGate,
};

use super::UnrollBackend;
use crate::error::{CompileError, CompileResult};

/// Circuit-level facts of a structured payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredHeader {
    /// Circuit name.
    #[serde(default)]
    pub name: String,
    pub number_of_qubits: u32,
    pub number_of_clbits: u32,
    /// `(register, index)` for every qubit, in flat order.
    pub qubit_labels: Vec<(String, u32)>,
    /// `(register, size)` for every classical register, in declaration order.
    pub clbit_labels: Vec<(String, u32)>,
}

/// Encoded classical condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditional {
    /// Always `"equals"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Hex mask over the flat classical bits of the register.
    pub mask: String,
    /// Hex value shifted to the register offset.
    pub val: String,
}

/// One emitted instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub name: String,
    #[serde(default)]
    pub params: Vec<f64>,
    pub qubits: Vec<u32>,
    #[serde(default)]
    pub clbits: Vec<u32>,
    #[serde(default)]
    pub conditional: Option<Conditional>,
}

/// Wire form of [`StructuredCircuit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StructuredPayload {
    header: StructuredHeader,
    operations: Vec<OperationRecord>,
}

/// Flat classical layout of one register.
#[derive(Debug, Clone)]
struct ClassicalSpan {
    name: String,
    offset: u32,
    size: u32,
}

impl ClassicalSpan {
    fn mask(&self) -> CompileResult<u64> {
        if u64::from(self.offset) + u64::from(self.size) > u64::from(u64::BITS) {
            return Err(CompileError::InvalidPayload(format!(
                "classical register '{}' ends past bit {}",
                self.name,
                u64::BITS
            )));
        }
        let width = if self.size == u64::BITS {
            u64::MAX
        } else {
            (1_u64 << self.size) - 1
        };
        Ok(width << self.offset)
    }
}

fn classical_spans(labels: &[(String, u32)]) -> Vec<ClassicalSpan> {
    let mut offset = 0;
    labels
        .iter()
        .map(|(name, size)| {
            let span = ClassicalSpan {
                name: name.clone(),
                offset,
                size: *size,
            };
            offset = offset.saturating_add(*size);
            span
        })
        .collect()
}

fn parse_hex(text: &str) -> CompileResult<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16)
        .map_err(|e| CompileError::InvalidPayload(format!("bad hex value '{text}': {e}")))
}

/// Largest classical bit count a decoded payload may declare.
pub const MAX_PAYLOAD_CLBITS: u32 = 1 << 20;

/// The structured payload of one unrolled circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StructuredPayload", into = "StructuredPayload")]
pub struct StructuredCircuit {
    header: StructuredHeader,
    operations: Vec<OperationRecord>,
    registers: Vec<Register>,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    instructions: Vec<Instruction>,
}

impl StructuredCircuit {
    /// Check a header and its records and rebuild the circuit they describe.
    pub fn from_parts(
        header: StructuredHeader,
        operations: Vec<OperationRecord>,
    ) -> CompileResult<Self> {
        if header.qubit_labels.len() != header.number_of_qubits as usize {
            return Err(CompileError::InvalidPayload(format!(
                "{} qubit labels for {} qubits",
                header.qubit_labels.len(),
                header.number_of_qubits
            )));
        }
        let declared_clbits = header
            .clbit_labels
            .iter()
            .try_fold(0_u32, |total, (_, size)| {
                total
                    .checked_add(*size)
                    .filter(|&total| total <= MAX_PAYLOAD_CLBITS)
            })
            .ok_or_else(|| {
                CompileError::InvalidPayload(format!(
                    "classical registers hold more than {MAX_PAYLOAD_CLBITS} bits"
                ))
            })?;
        if declared_clbits != header.number_of_clbits {
            return Err(CompileError::InvalidPayload(format!(
                "classical registers hold {declared_clbits} bits, header says {}",
                header.number_of_clbits
            )));
        }

        let mut registers: Vec<Register> = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut qubits = Vec::with_capacity(header.qubit_labels.len());
        for (id, (name, index)) in header.qubit_labels.iter().enumerate() {
            let continues = registers
                .last()
                .is_some_and(|last| last.name == *name && last.size == *index);
            if continues {
                if let Some(last) = registers.last_mut() {
                    last.size += 1;
                }
            } else if *index == 0 && seen.insert(name.as_str()) {
                registers.push(Register::quantum(name.clone(), 1));
            } else {
                return Err(CompileError::InvalidPayload(format!(
                    "qubit label {name}[{index}] is out of sequence"
                )));
            }
            qubits.push(Qubit::new(QubitId(id as u32), name.clone(), *index));
        }

        let mut clbits = Vec::with_capacity(header.number_of_clbits as usize);
        for (name, size) in &header.clbit_labels {
            if !seen.insert(name.as_str()) {
                return Err(CompileError::InvalidPayload(format!(
                    "register '{name}' is declared twice"
                )));
            }
            for index in 0..*size {
                clbits.push(Clbit::new(ClbitId(clbits.len() as u32), name.clone(), index));
            }
            registers.push(Register::classical(name.clone(), *size));
        }

        let spans = classical_spans(&header.clbit_labels);
        let instructions = operations
            .iter()
            .map(|record| record.to_instruction(&header, &spans))
            .collect::<CompileResult<Vec<_>>>()?;

        Ok(Self {
            header,
            operations,
            registers,
            qubits,
            clbits,
            instructions,
        })
    }

    /// Circuit-level facts.
    pub fn header(&self) -> &StructuredHeader {
        &self.header
    }

    /// One record per emitted instruction, in emission order.
    pub fn operations(&self) -> &[OperationRecord] {
        &self.operations
    }

    /// Serialize to a JSON value.
    pub fn to_json(&self) -> CompileResult<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| CompileError::InvalidPayload(format!("cannot encode payload: {e}")))
    }
}

impl TryFrom<StructuredPayload> for StructuredCircuit {
    type Error = CompileError;

    fn try_from(payload: StructuredPayload) -> Result<Self, Self::Error> {
        Self::from_parts(payload.header, payload.operations)
    }
}

impl From<StructuredCircuit> for StructuredPayload {
    fn from(circuit: StructuredCircuit) -> Self {
        Self {
            header: circuit.header,
            operations: circuit.operations,
        }
    }
}

impl CircuitSource for StructuredCircuit {
    fn name(&self) -> &str {
        &self.header.name
    }

    fn registers(&self) -> &[Register] {
        &self.registers
    }

    fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    fn ordered_instructions(&self) -> Vec<&Instruction> {
        self.instructions.iter().collect()
    }
}

impl OperationRecord {
    fn from_instruction(inst: &Instruction, spans: &[ClassicalSpan]) -> CompileResult<Self> {
        let params = match &inst.kind {
            InstructionKind::Gate(gate) => {
                if gate.is_adjoint() {
                    return Err(CompileError::InvalidPayload(format!(
                        "adjoint '{}' has no structured form",
                        gate.name()
                    )));
                }
                gate.parameters()
                    .into_iter()
                    .map(|p| {
                        p.as_f64().ok_or_else(|| CompileError::UnboundParameter {
                            gate: gate.name().to_string(),
                            parameter: p.to_string(),
                        })
                    })
                    .collect::<CompileResult<Vec<_>>>()?
            }
            InstructionKind::Simulator(command) => vec![f64::from(command.argument())],
            InstructionKind::Measure | InstructionKind::Reset | InstructionKind::Barrier => {
                vec![]
            }
        };

        let conditional = match &inst.condition {
            None => None,
            Some(condition) => {
                let span = spans
                    .iter()
                    .find(|s| s.name == condition.register)
                    .ok_or_else(|| {
                        CompileError::InvalidPayload(format!(
                            "condition names unknown register '{}'",
                            condition.register
                        ))
                    })?;
                let mask = span.mask()?;
                let val = condition
                    .value
                    .checked_shl(span.offset)
                    .filter(|v| v & !mask == 0)
                    .ok_or_else(|| {
                        CompileError::InvalidPayload(format!(
                            "condition value {} does not fit register '{}'",
                            condition.value, span.name
                        ))
                    })?;
                Some(Conditional {
                    kind: "equals".to_string(),
                    mask: format!("{mask:#x}"),
                    val: format!("{val:#x}"),
                })
            }
        };

        Ok(Self {
            name: inst.name().to_string(),
            params,
            qubits: inst.qubits.iter().map(|q| q.0).collect(),
            clbits: inst.clbits.iter().map(|c| c.0).collect(),
            conditional,
        })
    }

    fn to_instruction(
        &self,
        header: &StructuredHeader,
        spans: &[ClassicalSpan],
    ) -> CompileResult<Instruction> {
        if let Some(q) = self.qubits.iter().find(|q| **q >= header.number_of_qubits) {
            return Err(CompileError::InvalidPayload(format!(
                "'{}' names qubit {q} of {}",
                self.name, header.number_of_qubits
            )));
        }
        if let Some(c) = self.clbits.iter().find(|c| **c >= header.number_of_clbits) {
            return Err(CompileError::InvalidPayload(format!(
                "'{}' names classical bit {c} of {}",
                self.name, header.number_of_clbits
            )));
        }

        let kind = match self.name.as_str() {
            "measure" => InstructionKind::Measure,
            "reset" => InstructionKind::Reset,
            "barrier" => InstructionKind::Barrier,
            "load" | "save" | "noise" => {
                let argument = match self.params.as_slice() {
                    [v] if v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX) => *v as u32,
                    _ => {
                        return Err(CompileError::InvalidPayload(format!(
                            "'{}' takes one integer argument, got {:?}",
                            self.name, self.params
                        )));
                    }
                };
                InstructionKind::Simulator(match self.name.as_str() {
                    "load" => SimulatorCommand::Load(argument),
                    "save" => SimulatorCommand::Save(argument),
                    _ => SimulatorCommand::Noise(argument),
                })
            }
            name => {
                let params: Vec<ParameterExpression> =
                    self.params.iter().map(|v| ParameterExpression::constant(*v)).collect();
                let arity = self.qubits.len() as u32;
                let gate = match StandardGate::from_name(name, &params) {
                    Some(gate) if gate.num_qubits() == arity => Gate::Standard(gate),
                    _ => Gate::Composite(CompositeGate::new(name, arity).with_params(params)),
                };
                InstructionKind::Gate(gate)
            }
        };

        let condition = match &self.conditional {
            None => None,
            Some(conditional) => Some(decode_condition(conditional, spans)?),
        };

        Ok(Instruction {
            kind,
            qubits: self.qubits.iter().copied().map(QubitId).collect(),
            clbits: self.clbits.iter().copied().map(ClbitId).collect(),
            condition,
        })
    }
}

fn decode_condition(
    conditional: &Conditional,
    spans: &[ClassicalSpan],
) -> CompileResult<ClassicalCondition> {
    if conditional.kind != "equals" {
        return Err(CompileError::InvalidPayload(format!(
            "unsupported condition type '{}'",
            conditional.kind
        )));
    }
    let mask = parse_hex(&conditional.mask)?;
    let val = parse_hex(&conditional.val)?;
    for span in spans.iter().filter(|s| s.size > 0) {
        if span.mask()? == mask {
            if val & !mask != 0 {
                break;
            }
            return Ok(ClassicalCondition::new(span.name.clone(), val >> span.offset));
        }
    }
    Err(CompileError::InvalidPayload(format!(
        "condition mask {} with value {} matches no classical register",
        conditional.mask, conditional.val
    )))
}

/// Collects the emitted stream into a [`StructuredCircuit`].
#[derive(Debug, Default)]
pub struct JsonBackend {
    header: Option<StructuredHeader>,
    spans: Vec<ClassicalSpan>,
    operations: Vec<OperationRecord>,
}

impl JsonBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnrollBackend for JsonBackend {
    type Output = StructuredCircuit;

    fn begin(&mut self, source: &dyn CircuitSource) -> CompileResult<()> {
        let clbit_labels: Vec<(String, u32)> = source
            .registers()
            .iter()
            .filter(|r| r.kind == quill_ir::RegisterKind::Classical)
            .map(|r| (r.name.clone(), r.size))
            .collect();
        self.spans = classical_spans(&clbit_labels);
        self.operations.clear();
        self.header = Some(StructuredHeader {
            name: source.name().to_string(),
            number_of_qubits: source.qubits().len() as u32,
            number_of_clbits: source.clbits().len() as u32,
            qubit_labels: source
                .qubits()
                .iter()
                .map(|q| (q.register.clone(), q.index))
                .collect(),
            clbit_labels,
        });
        Ok(())
    }

    fn accept(&mut self, instruction: &Instruction) -> CompileResult<()> {
        let record = OperationRecord::from_instruction(instruction, &self.spans)?;
        self.operations.push(record);
        Ok(())
    }

    fn finish(&mut self) -> CompileResult<StructuredCircuit> {
        let header = self.header.take().ok_or_else(|| {
            CompileError::InvalidPayload("payload finished before it was begun".into())
        })?;
        self.spans.clear();
        StructuredCircuit::from_parts(header, std::mem::take(&mut self.operations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ir::Circuit;

    fn conditioned() -> Circuit {
        let mut circuit = Circuit::new("cond");
        circuit.add_qreg("q", 2).unwrap();
        circuit.add_creg("a", 1).unwrap();
        circuit.add_creg("b", 2).unwrap();
        circuit
            .apply(
                "u1",
                &[0.25.into()],
                &[("q", 1).into()],
                Some(ClassicalCondition::new("b", 3)),
            )
            .unwrap();
        circuit.measure(("q", 0), ("b", 1)).unwrap();
        circuit.save(2).unwrap();
        circuit
    }

    fn encode(source: &impl CircuitSource) -> StructuredCircuit {
        let mut backend = JsonBackend::new();
        backend.begin(source).unwrap();
        for inst in source.ordered_instructions() {
            backend.accept(inst).unwrap();
        }
        backend.finish().unwrap()
    }

    #[test]
    fn test_header() {
        let payload = encode(&conditioned());
        let header = payload.header();
        assert_eq!(header.name, "cond");
        assert_eq!(header.number_of_qubits, 2);
        assert_eq!(header.number_of_clbits, 3);
        assert_eq!(
            header.qubit_labels,
            vec![("q".to_string(), 0), ("q".to_string(), 1)]
        );
        assert_eq!(
            header.clbit_labels,
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn test_records() {
        let payload = encode(&conditioned());
        let ops = payload.operations();
        assert_eq!(ops.len(), 3);

        assert_eq!(ops[0].name, "u1");
        assert_eq!(ops[0].params, vec![0.25]);
        assert_eq!(ops[0].qubits, vec![1]);
        let cond = ops[0].conditional.as_ref().unwrap();
        assert_eq!(cond.kind, "equals");
        assert_eq!(cond.mask, "0x6");
        assert_eq!(cond.val, "0x6");

        assert_eq!(ops[1].name, "measure");
        assert_eq!(ops[1].clbits, vec![2]);
        assert_eq!(ops[2].name, "save");
        assert_eq!(ops[2].params, vec![2.0]);
        assert_eq!(ops[2].qubits, vec![0, 1]);
    }

    #[test]
    fn test_json_shape() {
        let payload = encode(&Circuit::bell().unwrap());
        let json = payload.to_json().unwrap();
        assert_eq!(json["header"]["number_of_qubits"], 2);
        assert_eq!(json["header"]["clbit_labels"][0][0], "c");
        assert_eq!(json["operations"][0]["name"], "h");
        assert!(json["operations"][0]["conditional"].is_null());
        assert_eq!(json["operations"][2]["clbits"][0], 0);
    }

    #[test]
    fn test_decoded_payload_is_a_source() {
        let original = conditioned();
        let payload = encode(&original);
        let text = serde_json::to_string(&payload).unwrap();
        let decoded: StructuredCircuit = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, payload);

        assert_eq!(decoded.registers(), original.registers());
        assert_eq!(decoded.qubits(), original.qubits());
        assert_eq!(decoded.clbits(), original.clbits());
        let lines: Vec<String> = decoded
            .ordered_instructions()
            .iter()
            .map(|i| i.to_qasm(decoded.qubits(), decoded.clbits()))
            .collect();
        assert_eq!(lines, original.to_qasm_lines());
    }

    #[test]
    fn test_symbolic_parameter_is_rejected() {
        let mut circuit = Circuit::new("sym");
        circuit.add_qreg("q", 1).unwrap();
        circuit
            .u1(ParameterExpression::symbol("theta"), ("q", 0))
            .unwrap();
        let mut backend = JsonBackend::new();
        backend.begin(&circuit).unwrap();
        let err = backend.accept(&circuit.instructions()[0]).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnboundParameter { ref gate, ref parameter } if gate == "u1" && parameter == "theta"
        ));
    }

    #[test]
    fn test_bad_payloads() {
        let header = StructuredHeader {
            name: "bad".into(),
            number_of_qubits: 1,
            number_of_clbits: 1,
            qubit_labels: vec![("q".into(), 0)],
            clbit_labels: vec![("c".into(), 1)],
        };
        let record = |name: &str, qubits: Vec<u32>| OperationRecord {
            name: name.into(),
            params: vec![],
            qubits,
            clbits: vec![],
            conditional: None,
        };

        let out_of_range = StructuredCircuit::from_parts(header.clone(), vec![record("x", vec![3])]);
        assert!(matches!(out_of_range, Err(CompileError::InvalidPayload(_))));

        let mut wrong_mask = record("x", vec![0]);
        wrong_mask.conditional = Some(Conditional {
            kind: "equals".into(),
            mask: "0x2".into(),
            val: "0x2".into(),
        });
        let unmatched = StructuredCircuit::from_parts(header.clone(), vec![wrong_mask]);
        assert!(matches!(unmatched, Err(CompileError::InvalidPayload(_))));

        let mut shared_name = header.clone();
        shared_name.clbit_labels = vec![("q".into(), 1)];
        assert!(matches!(
            StructuredCircuit::from_parts(shared_name, vec![]),
            Err(CompileError::InvalidPayload(_))
        ));

        let mut mislabelled = header;
        mislabelled.number_of_qubits = 2;
        assert!(StructuredCircuit::from_parts(mislabelled, vec![]).is_err());
    }

    #[test]
    fn test_oversized_classical_layout_is_rejected() {
        let wrapping = serde_json::json!({
            "header": {
                "name": "wide",
                "number_of_qubits": 0,
                "number_of_clbits": 1,
                "qubit_labels": [],
                "clbit_labels": [["a", u32::MAX], ["b", 2]],
            },
            "operations": [],
        });
        let err = serde_json::from_value::<StructuredCircuit>(wrapping).unwrap_err();
        assert!(err.to_string().contains("more than"));

        let huge = StructuredHeader {
            name: "huge".into(),
            number_of_qubits: 0,
            number_of_clbits: MAX_PAYLOAD_CLBITS + 1,
            qubit_labels: vec![],
            clbit_labels: vec![("c".into(), MAX_PAYLOAD_CLBITS + 1)],
        };
        assert!(matches!(
            StructuredCircuit::from_parts(huge, vec![]),
            Err(CompileError::InvalidPayload(_))
        ));

        let at_limit = StructuredHeader {
            name: "limit".into(),
            number_of_qubits: 0,
            number_of_clbits: 64,
            qubit_labels: vec![],
            clbit_labels: vec![("c".into(), 64)],
        };
        assert!(StructuredCircuit::from_parts(at_limit, vec![]).is_ok());
    }

    #[test]
    fn test_finish_without_begin() {
        let mut backend = JsonBackend::new();
        assert!(matches!(
            backend.finish(),
            Err(CompileError::InvalidPayload(_))
        ));
    }
}
