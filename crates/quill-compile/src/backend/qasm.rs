//! Textual output strategy.

use quill_ir::{CircuitSource, Clbit, Instruction, Qubit, RegisterKind};

use super::UnrollBackend;
use crate::error::CompileResult;

/// Writes the unrolled circuit as `OpenQASM` 2.0 text.
#[derive(Debug, Default)]
pub struct QasmBackend {
    output: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
}

impl QasmBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

impl UnrollBackend for QasmBackend {
    type Output = String;

    fn begin(&mut self, source: &dyn CircuitSource) -> CompileResult<()> {
        self.output.clear();
        self.qubits = source.qubits().to_vec();
        self.clbits = source.clbits().to_vec();

        self.writeln("OPENQASM 2.0;");
        self.writeln("include \"qelib1.inc\";");
        for register in source.registers() {
            let keyword = match register.kind {
                RegisterKind::Quantum => "qreg",
                RegisterKind::Classical => "creg",
            };
            let line = format!("{keyword} {}[{}];", register.name, register.size);
            self.writeln(&line);
        }
        Ok(())
    }

    fn accept(&mut self, instruction: &Instruction) -> CompileResult<()> {
        let line = instruction.to_qasm(&self.qubits, &self.clbits);
        self.writeln(&line);
        Ok(())
    }

    fn finish(&mut self) -> CompileResult<String> {
        self.qubits.clear();
        self.clbits.clear();
        Ok(std::mem::take(&mut self.output))
    }
}
