//! High-level circuit builder API.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::{ClassicalCondition, Gate};
use crate::instruction::{Instruction, InstructionKind, SimulatorCommand};
use crate::instruction_set::InstructionSet;
use crate::library::GateLibrary;
use crate::parameter::ParameterExpression;
use crate::register::{Clbit, ClbitId, Qubit, QubitId, Register, RegisterKind, WireRef};
use crate::source::CircuitSource;

type P = ParameterExpression;

/// An operation argument: one wire, or a whole register to broadcast over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// A single wire.
    Wire(WireRef),
    /// Every wire of the named register, in index order.
    Register(String),
}

impl From<WireRef> for Arg {
    fn from(wire: WireRef) -> Self {
        Arg::Wire(wire)
    }
}

impl From<&str> for Arg {
    fn from(register: &str) -> Self {
        Arg::Register(register.to_string())
    }
}

impl From<String> for Arg {
    fn from(register: String) -> Self {
        Arg::Register(register)
    }
}

impl From<&Register> for Arg {
    fn from(register: &Register) -> Self {
        Arg::Register(register.name.clone())
    }
}

impl From<(&str, u32)> for Arg {
    fn from((register, index): (&str, u32)) -> Self {
        Arg::Wire(WireRef::new(register, index))
    }
}

#[derive(Debug, Clone, Copy)]
struct RegisterSlot {
    position: usize,
    offset: u32,
}

/// How many wires of each kind an operation takes.
#[derive(Debug, Clone, Copy)]
enum Signature {
    Fixed { qubits: u32, clbits: u32 },
    /// Any number of qubits, flattened into one instruction.
    Variadic,
}

enum Resolved {
    One(u32),
    Many(Vec<u32>),
}

/// A quantum circuit.
///
/// Registers are declared first, then operations are appended through
/// [`Circuit::apply`] or the named helpers. Every wire argument is checked
/// against the registers before anything is attached, and instructions are
/// never changed once appended.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Registers in declaration order.
    registers: Vec<Register>,
    /// Lookup from register name to position and flat offset.
    slots: FxHashMap<String, RegisterSlot>,
    /// Qubits, indexed by id.
    qubits: Vec<Qubit>,
    /// Classical bits, indexed by id.
    clbits: Vec<Clbit>,
    /// Appended instructions.
    instructions: Vec<Instruction>,
    /// Capability table used to resolve operation names.
    library: Arc<GateLibrary>,
}

impl Circuit {
    /// Create an empty circuit backed by the standard gate library.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_library(name, GateLibrary::standard())
    }

    /// Create an empty circuit backed by a custom gate library.
    pub fn with_library(name: impl Into<String>, library: Arc<GateLibrary>) -> Self {
        Self {
            name: name.into(),
            registers: vec![],
            slots: FxHashMap::default(),
            qubits: vec![],
            clbits: vec![],
            instructions: vec![],
            library,
        }
    }

    /// Register a quantum or classical register.
    pub fn add_register(&mut self, register: Register) -> IrResult<()> {
        if self.slots.contains_key(&register.name) {
            return Err(IrError::DuplicateRegister(register.name));
        }
        let offset = match register.kind {
            RegisterKind::Quantum => {
                let offset = self.qubits.len() as u32;
                for i in 0..register.size {
                    self.qubits
                        .push(Qubit::new(QubitId(offset + i), &register.name, i));
                }
                offset
            }
            RegisterKind::Classical => {
                let offset = self.clbits.len() as u32;
                for i in 0..register.size {
                    self.clbits
                        .push(Clbit::new(ClbitId(offset + i), &register.name, i));
                }
                offset
            }
        };
        self.slots.insert(
            register.name.clone(),
            RegisterSlot {
                position: self.registers.len(),
                offset,
            },
        );
        self.registers.push(register);
        Ok(())
    }

    /// Add a quantum register and return its qubits.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<QubitId>> {
        let offset = self.qubits.len() as u32;
        self.add_register(Register::quantum(name, size))?;
        Ok((offset..offset + size).map(QubitId).collect())
    }

    /// Add a classical register and return its bits.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> IrResult<Vec<ClbitId>> {
        let offset = self.clbits.len() as u32;
        self.add_register(Register::classical(name, size))?;
        Ok((offset..offset + size).map(ClbitId).collect())
    }

    // =========================================================================
    // Generic entry points
    // =========================================================================

    /// Apply an operation by name.
    ///
    /// Wire arguments produce one instruction. Register arguments broadcast:
    /// one instruction per index, in register order, with any wire arguments
    /// repeated. All register arguments of one call must have the same size.
    /// `barrier`, `load` and `save` instead gather every argument into one
    /// instruction, and `load`/`save` without arguments cover all qubits.
    ///
    /// Nothing is appended when validation fails.
    pub fn apply(
        &mut self,
        name: &str,
        params: &[P],
        args: &[Arg],
        condition: Option<ClassicalCondition>,
    ) -> IrResult<InstructionSet> {
        let set = self.prepare(name, params, args, condition)?;
        self.instructions.extend(set.iter().cloned());
        Ok(set)
    }

    /// Validate and expand an operation exactly like [`Circuit::apply`],
    /// without appending it.
    pub fn prepare(
        &self,
        name: &str,
        params: &[P],
        args: &[Arg],
        condition: Option<ClassicalCondition>,
    ) -> IrResult<InstructionSet> {
        if let Some(cond) = &condition {
            self.check_condition(cond)?;
        }
        let (template, signature) = self.template(name, params)?;
        let instructions = match signature {
            Signature::Fixed { qubits, clbits } => {
                self.broadcast(name, &template, qubits, clbits, args)?
            }
            Signature::Variadic => {
                let mut qubits = Vec::new();
                for arg in args {
                    match self.resolve(name, arg, RegisterKind::Quantum)? {
                        Resolved::One(id) => qubits.push(QubitId(id)),
                        Resolved::Many(ids) => qubits.extend(ids.into_iter().map(QubitId)),
                    }
                }
                if qubits.is_empty() && !matches!(template, InstructionKind::Barrier) {
                    qubits = self.qubits.iter().map(|q| q.id).collect();
                }
                if qubits.is_empty() {
                    vec![]
                } else {
                    vec![Instruction {
                        kind: template,
                        qubits,
                        clbits: vec![],
                        condition: None,
                    }]
                }
            }
        };
        let mut set = InstructionSet::new(instructions)?;
        if let Some(cond) = &condition {
            set = set.with_condition(cond);
        }
        for inst in &set {
            check_distinct(inst)?;
        }
        Ok(set)
    }

    /// Append an existing instruction set, such as an inverse or a
    /// conditioned copy. Every member is validated before any is appended.
    pub fn append(&mut self, set: &InstructionSet) -> IrResult<()> {
        for inst in set {
            self.check_instruction(inst)?;
        }
        self.instructions.extend(set.iter().cloned());
        Ok(())
    }

    fn template(&self, name: &str, params: &[P]) -> IrResult<(InstructionKind, Signature)> {
        let fixed = |qubits, clbits| Signature::Fixed { qubits, clbits };
        let no_params = || {
            if params.is_empty() {
                Ok(())
            } else {
                Err(IrError::ParameterCountMismatch {
                    gate_name: name.to_string(),
                    expected: 0,
                    got: params.len(),
                })
            }
        };
        Ok(match name {
            "measure" => {
                no_params()?;
                (InstructionKind::Measure, fixed(1, 1))
            }
            "reset" => {
                no_params()?;
                (InstructionKind::Reset, fixed(1, 0))
            }
            "barrier" => {
                no_params()?;
                (InstructionKind::Barrier, Signature::Variadic)
            }
            "load" => {
                let slot = directive_argument(name, params)?;
                (
                    InstructionKind::Simulator(SimulatorCommand::Load(slot)),
                    Signature::Variadic,
                )
            }
            "save" => {
                let slot = directive_argument(name, params)?;
                (
                    InstructionKind::Simulator(SimulatorCommand::Save(slot)),
                    Signature::Variadic,
                )
            }
            "noise" => {
                let switch = directive_argument(name, params)?;
                (
                    InstructionKind::Simulator(SimulatorCommand::Noise(switch)),
                    fixed(1, 0),
                )
            }
            _ => {
                let gate = self.library.instantiate(name, params)?;
                let qubits = gate.num_qubits();
                (InstructionKind::Gate(gate), fixed(qubits, 0))
            }
        })
    }

    fn broadcast(
        &self,
        name: &str,
        template: &InstructionKind,
        num_qubits: u32,
        num_clbits: u32,
        args: &[Arg],
    ) -> IrResult<Vec<Instruction>> {
        let expected = (num_qubits + num_clbits) as usize;
        if args.len() != expected {
            return Err(if args.len() < num_qubits as usize || num_clbits == 0 {
                IrError::QubitCountMismatch {
                    gate_name: name.to_string(),
                    expected: num_qubits,
                    got: args.len().min(u32::MAX as usize) as u32,
                }
            } else {
                IrError::ClbitCountMismatch {
                    gate_name: name.to_string(),
                    expected: num_clbits,
                    got: (args.len() - num_qubits as usize) as u32,
                }
            });
        }

        let mut resolved = Vec::with_capacity(args.len());
        let mut width: Option<u32> = None;
        for (i, arg) in args.iter().enumerate() {
            let kind = if i < num_qubits as usize {
                RegisterKind::Quantum
            } else {
                RegisterKind::Classical
            };
            let r = self.resolve(name, arg, kind)?;
            if let Resolved::Many(ids) = &r {
                let size = ids.len() as u32;
                match width {
                    Some(w) if w != size => {
                        return Err(IrError::RegisterSizeMismatch {
                            gate_name: name.to_string(),
                            first: w,
                            second: size,
                        });
                    }
                    _ => width = Some(size),
                }
            }
            resolved.push(r);
        }

        let n = width.unwrap_or(1);
        let pick = |r: &Resolved, i: usize| match r {
            Resolved::One(id) => *id,
            Resolved::Many(ids) => ids[i],
        };
        Ok((0..n as usize)
            .map(|i| Instruction {
                kind: template.clone(),
                qubits: resolved[..num_qubits as usize]
                    .iter()
                    .map(|r| QubitId(pick(r, i)))
                    .collect(),
                clbits: resolved[num_qubits as usize..]
                    .iter()
                    .map(|r| ClbitId(pick(r, i)))
                    .collect(),
                condition: None,
            })
            .collect())
    }

    fn resolve(&self, gate_name: &str, arg: &Arg, kind: RegisterKind) -> IrResult<Resolved> {
        let register_name = match arg {
            Arg::Wire(wire) => &wire.register,
            Arg::Register(name) => name,
        };
        let (register, slot) = self.lookup(register_name, Some(gate_name))?;
        if register.kind != kind {
            return Err(IrError::WrongWireKind {
                register: register.name.clone(),
                expected: kind,
                gate_name: Some(gate_name.to_string()),
            });
        }
        Ok(match arg {
            Arg::Wire(wire) => {
                if wire.index >= register.size {
                    return Err(IrError::WireOutOfRange {
                        register: register.name.clone(),
                        index: wire.index,
                        size: register.size,
                    });
                }
                Resolved::One(slot.offset + wire.index)
            }
            Arg::Register(_) => {
                Resolved::Many((slot.offset..slot.offset + register.size).collect())
            }
        })
    }

    fn lookup(&self, name: &str, gate_name: Option<&str>) -> IrResult<(&Register, RegisterSlot)> {
        let slot = self
            .slots
            .get(name)
            .copied()
            .ok_or_else(|| IrError::UnknownRegister {
                name: name.to_string(),
                gate_name: gate_name.map(str::to_string),
            })?;
        Ok((&self.registers[slot.position], slot))
    }

    fn check_condition(&self, cond: &ClassicalCondition) -> IrResult<()> {
        let invalid = |reason: &str| IrError::InvalidCondition {
            register: cond.register.clone(),
            value: cond.value,
            reason: reason.to_string(),
        };
        let Some(slot) = self.slots.get(&cond.register) else {
            return Err(invalid("register is not registered"));
        };
        let register = &self.registers[slot.position];
        if register.kind != RegisterKind::Classical {
            return Err(invalid("register is not classical"));
        }
        if register.size < 64 && cond.value >> register.size != 0 {
            return Err(invalid("value does not fit in the register"));
        }
        Ok(())
    }

    fn check_instruction(&self, inst: &Instruction) -> IrResult<()> {
        let gate_name = Some(inst.name().to_string());
        if let InstructionKind::Gate(gate) = &inst.kind {
            check_gate_signature(&self.library, gate, inst)?;
        }
        for &qubit in &inst.qubits {
            if qubit.0 as usize >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        for &clbit in &inst.clbits {
            if clbit.0 as usize >= self.clbits.len() {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        check_distinct(inst)?;
        if let Some(cond) = &inst.condition {
            self.check_condition(cond)?;
        }
        Ok(())
    }

    // =========================================================================
    // Named helpers
    // =========================================================================

    /// Apply a gate by name without a condition.
    pub fn gate(&mut self, name: &str, params: &[P], args: &[Arg]) -> IrResult<InstructionSet> {
        self.apply(name, params, args, None)
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("h", &[], &[q.into()])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("x", &[], &[q.into()])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("y", &[], &[q.into()])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("z", &[], &[q.into()])
    }

    /// Apply S gate.
    pub fn s(&mut self, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("s", &[], &[q.into()])
    }

    /// Apply T gate.
    pub fn t(&mut self, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("t", &[], &[q.into()])
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, phi: impl Into<P>, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("rz", &[phi.into()], &[q.into()])
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: impl Into<P>, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("rx", &[theta.into()], &[q.into()])
    }

    /// Apply U1(λ).
    pub fn u1(&mut self, lambda: impl Into<P>, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("u1", &[lambda.into()], &[q.into()])
    }

    /// Apply U2(φ, λ).
    pub fn u2(
        &mut self,
        phi: impl Into<P>,
        lambda: impl Into<P>,
        q: impl Into<Arg>,
    ) -> IrResult<InstructionSet> {
        self.gate("u2", &[phi.into(), lambda.into()], &[q.into()])
    }

    /// Apply U3(θ, φ, λ).
    pub fn u3(
        &mut self,
        theta: impl Into<P>,
        phi: impl Into<P>,
        lambda: impl Into<P>,
        q: impl Into<Arg>,
    ) -> IrResult<InstructionSet> {
        self.gate("u3", &[theta.into(), phi.into(), lambda.into()], &[q.into()])
    }

    /// Apply CNOT.
    pub fn cx(&mut self, control: impl Into<Arg>, target: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("cx", &[], &[control.into(), target.into()])
    }

    /// Apply controlled-Z.
    pub fn cz(&mut self, control: impl Into<Arg>, target: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("cz", &[], &[control.into(), target.into()])
    }

    /// Apply SWAP.
    pub fn swap(&mut self, a: impl Into<Arg>, b: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.gate("swap", &[], &[a.into(), b.into()])
    }

    /// Apply Toffoli.
    pub fn ccx(
        &mut self,
        c1: impl Into<Arg>,
        c2: impl Into<Arg>,
        target: impl Into<Arg>,
    ) -> IrResult<InstructionSet> {
        self.gate("ccx", &[], &[c1.into(), c2.into(), target.into()])
    }

    /// Measure a qubit into a bit, or a register into a register pairwise.
    pub fn measure(&mut self, q: impl Into<Arg>, c: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.apply("measure", &[], &[q.into(), c.into()], None)
    }

    /// Reset a qubit or every qubit of a register.
    pub fn reset(&mut self, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.apply("reset", &[], &[q.into()], None)
    }

    /// Place one barrier across all given wires.
    pub fn barrier(&mut self, args: &[Arg]) -> IrResult<InstructionSet> {
        self.apply("barrier", &[], args, None)
    }

    /// Restore simulator state from `slot` on every qubit.
    pub fn load(&mut self, slot: u32) -> IrResult<InstructionSet> {
        self.apply("load", &[P::from(f64::from(slot))], &[], None)
    }

    /// Save simulator state into `slot` on every qubit.
    pub fn save(&mut self, slot: u32) -> IrResult<InstructionSet> {
        self.apply("save", &[P::from(f64::from(slot))], &[], None)
    }

    /// Toggle simulator noise on a qubit or register.
    pub fn noise(&mut self, switch: u32, q: impl Into<Arg>) -> IrResult<InstructionSet> {
        self.apply("noise", &[P::from(f64::from(switch))], &[q.into()], None)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Appended instructions, in declaration order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Look up a register by name.
    pub fn register(&self, name: &str) -> Option<&Register> {
        self.lookup(name, None).ok().map(|(r, _)| r)
    }

    /// The gate library this circuit resolves names against.
    pub fn library(&self) -> &Arc<GateLibrary> {
        &self.library
    }

    /// Resolve a wire reference to its qubit id.
    pub fn qubit(&self, wire: &WireRef) -> IrResult<QubitId> {
        match self.resolve("qubit", &Arg::Wire(wire.clone()), RegisterKind::Quantum)? {
            Resolved::One(id) => Ok(QubitId(id)),
            Resolved::Many(_) => Err(IrError::InvalidNode),
        }
    }

    /// Build the DAG form of this circuit.
    pub fn to_dag(&self) -> IrResult<CircuitDag> {
        CircuitDag::from_source(self)
    }

    /// The text form of the whole circuit, one instruction per line.
    pub fn to_qasm_lines(&self) -> Vec<String> {
        self.instructions
            .iter()
            .map(|inst| inst.to_qasm(&self.qubits, &self.clbits))
            .collect()
    }

    // =========================================================================
    // Common circuits
    // =========================================================================

    /// Create a measured Bell pair on `q[0]`, `q[1]`.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Circuit::new("bell");
        circuit.add_qreg("q", 2)?;
        circuit.add_creg("c", 2)?;
        circuit.h(("q", 0))?;
        circuit.cx(("q", 0), ("q", 1))?;
        circuit.measure("q", "c")?;
        Ok(circuit)
    }

    /// Create a measured uniform superposition over `n` qubits.
    pub fn superposition(n: u32) -> IrResult<Self> {
        let mut circuit = Circuit::new("superposition");
        circuit.add_qreg("q", n)?;
        circuit.add_creg("c", n)?;
        circuit.h("q")?;
        circuit.measure("q", "c")?;
        Ok(circuit)
    }
}

impl CircuitSource for Circuit {
    fn name(&self) -> &str {
        &self.name
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

/// Check a gate instruction against its library definition.
pub(crate) fn check_gate_signature(
    library: &GateLibrary,
    gate: &Gate,
    inst: &Instruction,
) -> IrResult<()> {
    let def = library
        .get(gate.name())
        .ok_or_else(|| IrError::UnknownOperation(gate.name().to_string()))?;
    if def.num_qubits != gate.num_qubits() || inst.qubits.len() != def.num_qubits as usize {
        return Err(IrError::QubitCountMismatch {
            gate_name: gate.name().to_string(),
            expected: def.num_qubits,
            got: inst.qubits.len() as u32,
        });
    }
    let got = gate.parameters().len();
    if got != def.num_params {
        return Err(IrError::ParameterCountMismatch {
            gate_name: gate.name().to_string(),
            expected: def.num_params,
            got,
        });
    }
    Ok(())
}

fn check_distinct(inst: &Instruction) -> IrResult<()> {
    let mut seen = FxHashSet::default();
    for &qubit in &inst.qubits {
        if !seen.insert(qubit) {
            return Err(IrError::DuplicateQubit {
                qubit,
                gate_name: Some(inst.name().to_string()),
            });
        }
    }
    Ok(())
}

fn directive_argument(name: &str, params: &[P]) -> IrResult<u32> {
    let [param] = params else {
        return Err(IrError::ParameterCountMismatch {
            gate_name: name.to_string(),
            expected: 1,
            got: params.len(),
        });
    };
    match param.as_f64() {
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) => Ok(v as u32),
        _ => Err(IrError::InvalidParameter {
            gate_name: name.to_string(),
            reason: format!("expected a non-negative integer, got {param}"),
        }),
    }
}
