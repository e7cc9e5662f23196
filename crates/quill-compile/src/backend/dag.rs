//! DAG output strategy.

use quill_ir::{CircuitDag, CircuitSource, Instruction};

use super::UnrollBackend;
use crate::error::CompileResult;

/// Rebuilds a [`CircuitDag`] from the emitted stream.
#[derive(Debug, Default)]
pub struct DagBackend {
    dag: Option<CircuitDag>,
}

impl DagBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> &mut CircuitDag {
        self.dag.get_or_insert_with(|| CircuitDag::new("unrolled"))
    }
}

impl UnrollBackend for DagBackend {
    type Output = CircuitDag;

    fn begin(&mut self, source: &dyn CircuitSource) -> CompileResult<()> {
        let mut dag = CircuitDag::new(source.name());
        for register in source.registers() {
            dag.add_register(register.clone())?;
        }
        self.dag = Some(dag);
        Ok(())
    }

    fn accept(&mut self, instruction: &Instruction) -> CompileResult<()> {
        self.current().apply(instruction.clone())?;
        Ok(())
    }

    fn finish(&mut self) -> CompileResult<CircuitDag> {
        Ok(self
            .dag
            .take()
            .unwrap_or_else(|| CircuitDag::new("unrolled")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ir::{Circuit, QubitId, StandardGate};

    #[test]
    fn test_rebuilds_wires() {
        let circuit = Circuit::bell().unwrap();
        let mut backend = DagBackend::new();
        backend.begin(&circuit).unwrap();
        backend
            .accept(&Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(1)]))
            .unwrap();
        let dag = backend.finish().unwrap();
        assert_eq!(dag.name(), "bell");
        assert_eq!(dag.num_qubits(), 2);
        assert_eq!(dag.num_clbits(), 2);
        assert_eq!(dag.num_ops(), 1);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_rejects_foreign_wire() {
        let circuit = Circuit::bell().unwrap();
        let mut backend = DagBackend::new();
        backend.begin(&circuit).unwrap();
        let err = backend
            .accept(&Instruction::gate(StandardGate::H, [QubitId(5)]))
            .unwrap_err();
        assert!(matches!(err, crate::CompileError::Ir(_)));
    }
}
