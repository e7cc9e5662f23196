//! `OpenQASM` 2 emitter.

use std::borrow::Cow;

use quill_ir::{
    CircuitSource, CompositeGate, Gate, GateLibrary, Instruction, InstructionKind, IrError,
    IrResult, ParameterExpression, RegisterKind,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Emit a circuit as `OpenQASM` 2.0 text.
///
/// Instructions are written in the source's execution order. Gates outside
/// `qelib1.inc` are referenced by name only; see [`emit_with_definitions`].
pub fn emit(source: &impl CircuitSource) -> String {
    let mut emitter = Emitter::new();
    emitter.emit_header(source);
    emitter.emit_body(source);
    emitter.output
}

/// Emit a circuit with `gate`/`opaque` declarations for every non-standard
/// gate it uses, so the text can be read back without the library.
///
/// An adjoint composite `g` is declared as its own gate `g_dg`, whose body is
/// the reversed and inverted body of `g`, and is called by that name.
pub fn emit_with_definitions(
    source: &impl CircuitSource,
    library: &GateLibrary,
) -> IrResult<String> {
    let mut emitter = Emitter::new();
    emitter.emit_header(source);

    let standard = GateLibrary::standard();
    let mut done = FxHashSet::default();
    for inst in source.ordered_instructions() {
        if let InstructionKind::Gate(Gate::Composite(gate)) = &inst.kind {
            emitter.emit_call_definition(library, &standard, gate, &mut done)?;
        }
    }

    for inst in source.ordered_instructions() {
        let line = emitter.plain(inst).to_qasm(source.qubits(), source.clbits());
        emitter.writeln(&line);
    }
    Ok(emitter.output)
}

/// QASM2 emitter.
struct Emitter {
    output: String,
    /// Declared name of each adjoint composite, keyed by the gate it inverts.
    adjoints: FxHashMap<String, String>,
}

impl Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
            adjoints: FxHashMap::default(),
        }
    }

    fn emit_header(&mut self, source: &impl CircuitSource) {
        self.writeln("OPENQASM 2.0;");
        self.writeln("include \"qelib1.inc\";");
        for register in source.registers() {
            let keyword = match register.kind {
                RegisterKind::Quantum => "qreg",
                RegisterKind::Classical => "creg",
            };
            self.writeln(&format!("{keyword} {}[{}];", register.name, register.size));
        }
    }

    fn emit_body(&mut self, source: &impl CircuitSource) {
        for inst in source.ordered_instructions() {
            self.writeln(&inst.to_qasm(source.qubits(), source.clbits()));
        }
    }

    fn emit_call_definition(
        &mut self,
        library: &GateLibrary,
        standard: &GateLibrary,
        gate: &CompositeGate,
        done: &mut FxHashSet<String>,
    ) -> IrResult<()> {
        if gate.adjoint {
            self.emit_adjoint_definition(library, standard, &gate.name, done)
        } else {
            self.emit_definition(library, standard, &gate.name, done)
        }
    }

    /// Declare `name` after everything its rule depends on.
    fn emit_definition(
        &mut self,
        library: &GateLibrary,
        standard: &GateLibrary,
        name: &str,
        done: &mut FxHashSet<String>,
    ) -> IrResult<()> {
        if standard.contains(name) || done.contains(name) {
            return Ok(());
        }
        done.insert(name.to_string());

        let def = library
            .get(name)
            .ok_or_else(|| IrError::UnknownOperation(name.to_string()))?;
        let (params, signature) = signature(name, def.num_qubits, def.num_params);

        let Some(body) = def.decompose(&params)? else {
            self.writeln(&format!("opaque {signature};"));
            return Ok(());
        };
        self.emit_gate(library, standard, &signature, &body, done)
    }

    /// Declare the adjoint of `name` under a fresh `<name>_dg` gate.
    fn emit_adjoint_definition(
        &mut self,
        library: &GateLibrary,
        standard: &GateLibrary,
        name: &str,
        done: &mut FxHashSet<String>,
    ) -> IrResult<()> {
        if self.adjoints.contains_key(name) {
            return Ok(());
        }
        self.emit_definition(library, standard, name, done)?;

        let def = library
            .get(name)
            .ok_or_else(|| IrError::UnknownOperation(name.to_string()))?;
        let mut declared = format!("{name}_dg");
        while library.contains(&declared) || standard.contains(&declared) || done.contains(&declared)
        {
            declared.push_str("_dg");
        }
        done.insert(declared.clone());
        self.adjoints.insert(name.to_string(), declared.clone());

        let (params, signature) = signature(&declared, def.num_qubits, def.num_params);
        let Some(body) = def.decompose(&params)? else {
            self.writeln(&format!("opaque {signature};"));
            return Ok(());
        };
        let inverse = body
            .iter()
            .rev()
            .map(Instruction::inverse)
            .collect::<IrResult<Vec<_>>>()?;
        self.emit_gate(library, standard, &signature, &inverse, done)
    }

    fn emit_gate(
        &mut self,
        library: &GateLibrary,
        standard: &GateLibrary,
        signature: &str,
        body: &[Instruction],
        done: &mut FxHashSet<String>,
    ) -> IrResult<()> {
        for inst in body {
            if let InstructionKind::Gate(Gate::Composite(gate)) = &inst.kind {
                self.emit_call_definition(library, standard, gate, done)?;
            }
        }
        let lines = body
            .iter()
            .map(|inst| body_line(&self.plain(inst)))
            .collect::<Vec<_>>()
            .join(" ");
        self.writeln(&format!("gate {signature} {{ {lines} }}"));
        Ok(())
    }

    /// `inst` with an adjoint composite replaced by a call to its declared
    /// adjoint gate.
    fn plain<'a>(&self, inst: &'a Instruction) -> Cow<'a, Instruction> {
        match &inst.kind {
            InstructionKind::Gate(Gate::Composite(gate)) if gate.adjoint => {
                match self.adjoints.get(&gate.name) {
                    Some(declared) => {
                        let mut renamed = inst.clone();
                        renamed.kind = InstructionKind::Gate(Gate::Composite(CompositeGate {
                            name: declared.clone(),
                            adjoint: false,
                            ..gate.clone()
                        }));
                        Cow::Owned(renamed)
                    }
                    None => Cow::Borrowed(inst),
                }
            }
            _ => Cow::Borrowed(inst),
        }
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

/// Formal parameters and the `name(p0,..) a0,..` head of a declaration.
fn signature(name: &str, num_qubits: u32, num_params: usize) -> (Vec<ParameterExpression>, String) {
    let params: Vec<ParameterExpression> = (0..num_params)
        .map(|i| ParameterExpression::symbol(format!("p{i}")))
        .collect();
    let qubits = (0..num_qubits)
        .map(|i| format!("a{i}"))
        .collect::<Vec<_>>()
        .join(",");
    let head = if params.is_empty() {
        format!("{name} {qubits}")
    } else {
        let formals = params.iter().map(ToString::to_string).collect::<Vec<_>>();
        format!("{name}({}) {qubits}", formals.join(","))
    };
    (params, head)
}

/// One gate-body statement over the formal qubits `a0, a1, ...`.
fn body_line(inst: &Instruction) -> String {
    let qubits = inst
        .qubits
        .iter()
        .map(|q| format!("a{}", q.0))
        .collect::<Vec<_>>()
        .join(",");
    match &inst.kind {
        InstructionKind::Gate(gate) => format!("{gate} {qubits};"),
        _ => format!("{} {qubits};", inst.name()),
    }
}
