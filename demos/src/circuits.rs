//! Circuits used by the demos.

use std::sync::Arc;

use quill_ir::{
    Circuit, ClassicalCondition, GateDefinition, GateLibrary, GateLibraryBuilder, Instruction,
    IrResult, QubitId, StandardGate,
};

/// Standard gates plus `bellprep a,b = h a; cx a,b`.
pub fn demo_library() -> IrResult<Arc<GateLibrary>> {
    GateLibraryBuilder::standard()
        .define(GateDefinition::composite("bellprep", 2, 0, |_| {
            vec![
                Instruction::gate(StandardGate::H, [QubitId(0)]),
                Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(1)]),
            ]
        }))
        .build()
}

/// Bell pair on a 2-qubit register, measured into `c`.
pub fn bell() -> IrResult<Circuit> {
    Circuit::bell()
}

/// Hadamard on every qubit of a 2-qubit register, measured into `c`.
pub fn superpositions() -> IrResult<Circuit> {
    Circuit::superposition(2)
}

/// Teleport the state of `q[0]` to `q[2]` with classically controlled
/// corrections.
pub fn teleport(library: Arc<GateLibrary>) -> IrResult<Circuit> {
    let mut circuit = Circuit::with_library("teleport", library);
    circuit.add_qreg("q", 3)?;
    circuit.add_creg("c0", 1)?;
    circuit.add_creg("c1", 1)?;
    circuit.add_creg("c2", 1)?;

    circuit.u3(0.3, 0.2, 0.1, ("q", 0))?;
    circuit.gate("bellprep", &[], &[("q", 1).into(), ("q", 2).into()])?;
    circuit.barrier(&["q".into()])?;
    circuit.cx(("q", 0), ("q", 1))?;
    circuit.h(("q", 0))?;
    circuit.measure(("q", 0), ("c0", 0))?;
    circuit.measure(("q", 1), ("c1", 0))?;
    circuit.apply(
        "z",
        &[],
        &[("q", 2).into()],
        Some(ClassicalCondition::new("c0", 1)),
    )?;
    circuit.apply(
        "x",
        &[],
        &[("q", 2).into()],
        Some(ClassicalCondition::new("c1", 1)),
    )?;
    circuit.measure(("q", 2), ("c2", 0))?;
    Ok(circuit)
}
