//! Property tests for the unroller.

use std::sync::Arc;

use proptest::prelude::*;
use quill_compile::{Basis, DagBackend, JsonBackend, QasmBackend, Unroller};
use quill_ir::{
    Circuit, CircuitDag, ClassicalCondition, CompositeGate, GateDefinition, GateLibrary,
    GateLibraryBuilder, Instruction, QubitId, StandardGate, WireId,
};
use quill_qasm::{emit, parse};

/// `rot2(a,b)` on one qubit and `ent(a)` on two, built only from basis gates
/// and each other.
fn library() -> Arc<GateLibrary> {
    GateLibraryBuilder::standard()
        .define(GateDefinition::composite("rot2", 1, 2, |p| {
            vec![
                Instruction::gate(StandardGate::U1(p[0].clone()), [QubitId(0)]),
                Instruction::gate(
                    StandardGate::U3(p[1].clone(), 0.5.into(), 0.into()),
                    [QubitId(0)],
                ),
            ]
        }))
        .define(GateDefinition::composite("ent", 2, 1, |p| {
            vec![
                Instruction::gate(
                    CompositeGate::new("rot2", 1).with_params(vec![p[0].clone(), 0.3.into()]),
                    [QubitId(0)],
                ),
                Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(1)]),
                Instruction::gate(StandardGate::U2(p[0].clone(), 0.1.into()), [QubitId(1)]),
            ]
        }))
        .build()
        .unwrap()
}

#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    T(u32),
    Rz(u32, f64),
    U2(u32, f64, f64),
    CX(u32, u32),
    Ccx(u32, u32, u32),
    Rot2(u32, f64, f64),
    Ent(u32, u32, f64),
    Measure(u32),
    Barrier,
    CondX(u32, u64),
}

impl GateOp {
    fn apply(&self, circuit: &mut Circuit) {
        let _ = match *self {
            GateOp::H(q) => circuit.h(("q", q)),
            GateOp::T(q) => circuit.t(("q", q)),
            GateOp::Rz(q, v) => circuit.rz(v, ("q", q)),
            GateOp::U2(q, a, b) => circuit.u2(a, b, ("q", q)),
            GateOp::CX(a, b) => circuit.cx(("q", a), ("q", b)),
            GateOp::Ccx(a, b, c) => circuit.ccx(("q", a), ("q", b), ("q", c)),
            GateOp::Rot2(q, a, b) => circuit.gate("rot2", &[a.into(), b.into()], &[("q", q).into()]),
            GateOp::Ent(a, b, v) => {
                circuit.gate("ent", &[v.into()], &[("q", a).into(), ("q", b).into()])
            }
            GateOp::Measure(q) => circuit.measure(("q", q), ("c", q)),
            GateOp::Barrier => circuit.barrier(&["q".into()]),
            GateOp::CondX(q, v) => circuit.apply(
                "x",
                &[],
                &[("q", q).into()],
                Some(ClassicalCondition::new("c", v)),
            ),
        };
    }
}

fn angle() -> impl Strategy<Value = f64> {
    -3.2_f64..3.2
}

fn arb_gate_op(n: u32) -> impl Strategy<Value = GateOp> {
    let max_value = (1_u64 << n) - 1;
    let pair = (0..n, 0..n).prop_filter("Wires must differ", |(a, b)| a != b);
    let triple = (0..n, 0..n, 0..n)
        .prop_filter("Wires must differ", |(a, b, c)| a != b && b != c && a != c);
    prop_oneof![
        (0..n).prop_map(GateOp::H),
        (0..n).prop_map(GateOp::T),
        (0..n, angle()).prop_map(|(q, v)| GateOp::Rz(q, v)),
        (0..n, angle(), angle()).prop_map(|(q, a, b)| GateOp::U2(q, a, b)),
        pair.clone().prop_map(|(a, b)| GateOp::CX(a, b)),
        triple.prop_map(|(a, b, c)| GateOp::Ccx(a, b, c)),
        (0..n, angle(), angle()).prop_map(|(q, a, b)| GateOp::Rot2(q, a, b)),
        (pair, angle()).prop_map(|((a, b), v)| GateOp::Ent(a, b, v)),
        (0..n).prop_map(GateOp::Measure),
        Just(GateOp::Barrier),
        (0..n, 0..=max_value).prop_map(|(q, v)| GateOp::CondX(q, v)),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (3_u32..=4).prop_flat_map(|n| {
        prop::collection::vec(arb_gate_op(n), 0..=15).prop_map(move |ops| {
            let mut circuit = Circuit::with_library("prop", library());
            circuit.add_qreg("q", n).unwrap();
            circuit.add_creg("c", n).unwrap();
            for op in &ops {
                op.apply(&mut circuit);
            }
            circuit
        })
    })
}

/// Circuits that only use default-basis gates and directives.
fn arb_basis_circuit() -> impl Strategy<Value = Circuit> {
    let op = prop_oneof![
        (0_u32..3, angle()).prop_map(|(q, v)| (0_u8, q, 0_u32, v)),
        (0_u32..3, angle()).prop_map(|(q, v)| (1_u8, q, 0_u32, v)),
        (0_u32..3, 0_u32..3).prop_map(|(a, b)| (2_u8, a, b, 0.0)),
        (0_u32..3).prop_map(|q| (3_u8, q, 0_u32, 0.0)),
        (0_u32..3, 0_u32..8).prop_map(|(q, v)| (4_u8, q, v, 0.0)),
    ];
    prop::collection::vec(op, 0..=20).prop_map(|ops| {
        let mut circuit = Circuit::new("basis");
        circuit.add_qreg("q", 3).unwrap();
        circuit.add_creg("c", 3).unwrap();
        for (kind, a, b, v) in ops {
            let _ = match kind {
                0 => circuit.u1(v, ("q", a)),
                1 => circuit.u3(v, -v, 0.25, ("q", a)),
                2 if a != b => circuit.cx(("q", a), ("q", b)),
                2 => circuit.gate("id", &[], &[("q", a).into()]),
                3 => circuit.measure(("q", a), ("c", a)),
                _ => circuit.apply(
                    "u2",
                    &[0.5.into(), v.into()],
                    &[("q", a).into()],
                    Some(ClassicalCondition::new("c", u64::from(b))),
                ),
            };
        }
        circuit
    })
}

fn wire_text(dag: &CircuitDag, wire: WireId) -> Vec<String> {
    dag.wire_ops(wire)
        .into_iter()
        .map(|(_, inst)| inst.to_string())
        .collect()
}

proptest! {
    /// A circuit already in the basis comes out unchanged.
    #[test]
    fn test_unroll_is_idempotent(circuit in arb_basis_circuit()) {
        let mut unroller = Unroller::new(GateLibrary::standard(), Basis::default(), DagBackend::new());
        let unrolled = unroller.unroll(&circuit).unwrap();
        let got: Vec<_> = unrolled.topological_order().into_iter().cloned().collect();
        prop_assert_eq!(got, circuit.instructions().to_vec());

        let again = unroller.unroll(&unrolled).unwrap();
        prop_assert_eq!(again.topological_order(), unrolled.topological_order());
    }

    /// Every wire sees the expansions of its instructions in declaration order.
    #[test]
    fn test_unroll_preserves_wire_order(circuit in arb_circuit()) {
        let mut unroller = Unroller::new(library(), Basis::default(), DagBackend::new());
        let unrolled = unroller.unroll(&circuit).unwrap();
        unrolled.verify_integrity().unwrap();

        for i in 0..circuit.num_qubits() as u32 {
            let wire = WireId::Qubit(QubitId(i));
            let expected: Vec<String> = circuit
                .instructions()
                .iter()
                .flat_map(|inst| unroller.expand(inst).unwrap())
                .filter(|inst| inst.qubits.contains(&QubitId(i)))
                .map(|inst| inst.to_string())
                .collect();
            prop_assert_eq!(wire_text(&unrolled, wire), expected);
        }
    }

    /// The in-place DAG rewrite and the streamed rebuild agree.
    #[test]
    fn test_rewrite_matches_stream(circuit in arb_circuit()) {
        let mut unroller = Unroller::new(library(), Basis::default(), DagBackend::new());
        let streamed = unroller.unroll(&circuit).unwrap();

        let mut dag = circuit.to_dag().unwrap();
        unroller.rewrite_dag(&mut dag).unwrap();
        dag.verify_integrity().unwrap();
        prop_assert_eq!(dag.topological_order(), streamed.topological_order());
    }

    /// Unrolling a composite and then its adjoint gives mirrored wires.
    #[test]
    fn test_adjoint_mirrors_expansion(a in angle(), b in angle(), v in angle()) {
        let unroller = Unroller::new(library(), Basis::default(), QasmBackend::new());
        for inst in [
            Instruction::gate(
                CompositeGate::new("rot2", 1).with_params(vec![a.into(), b.into()]),
                [QubitId(0)],
            ),
            Instruction::gate(
                CompositeGate::new("ent", 2).with_params(vec![v.into()]),
                [QubitId(1), QubitId(0)],
            ),
        ] {
            let forward = unroller.expand(&inst).unwrap();
            let backward = unroller.expand(&inst.inverse().unwrap()).unwrap();
            let mirrored: Vec<Instruction> = forward
                .iter()
                .rev()
                .map(|i| i.inverse().unwrap())
                .collect();
            prop_assert_eq!(backward, mirrored);
        }
    }

    /// Structured payloads match whether the circuit is unrolled directly or
    /// shipped as text and unrolled on the other side.
    #[test]
    fn test_local_remote_equivalence(circuit in arb_circuit()) {
        let lib = library();
        let mut local = Unroller::new(lib.clone(), Basis::default(), JsonBackend::new());
        let structured = local.unroll(&circuit).unwrap();

        let text = quill_qasm::emit_with_definitions(&circuit, &lib).unwrap();
        let remote_circuit = parse(&text).unwrap();
        let mut remote = Unroller::new(
            remote_circuit.library().clone(),
            Basis::default(),
            JsonBackend::new(),
        );
        let rederived = remote.unroll(&remote_circuit).unwrap();

        prop_assert_eq!(rederived.operations(), structured.operations());
        prop_assert_eq!(&rederived.header().qubit_labels, &structured.header().qubit_labels);
    }
}

#[test]
fn test_self_inverse_gates_return_themselves() {
    let unroller = Unroller::new(GateLibrary::standard(), Basis::default(), QasmBackend::new());
    for gate in [StandardGate::H, StandardGate::X, StandardGate::CX, StandardGate::Swap] {
        let qubits: Vec<QubitId> = (0..gate.num_qubits()).map(QubitId).collect();
        let inst = Instruction::gate(gate, qubits);
        assert!(inst.is_self_inverse());
        assert_eq!(inst.inverse().unwrap(), inst);
        assert_eq!(
            unroller.expand(&inst.inverse().unwrap()).unwrap(),
            unroller.expand(&inst).unwrap()
        );
    }
}

#[test]
fn test_textual_payload_reads_back() {
    let mut circuit = Circuit::with_library("text", library());
    circuit.add_qreg("q", 2).unwrap();
    circuit.add_creg("c", 2).unwrap();
    circuit
        .gate("ent", &[0.7.into()], &[("q", 0).into(), ("q", 1).into()])
        .unwrap();
    circuit.measure("q", "c").unwrap();

    let mut unroller = Unroller::new(library(), Basis::default(), QasmBackend::new());
    let text = unroller.unroll(&circuit).unwrap();
    let reparsed = parse(&text).unwrap();
    assert!(reparsed
        .instructions()
        .iter()
        .all(|inst| inst.is_directive() || Basis::default().contains(inst.name())));
    assert_eq!(emit(&reparsed), text);
}
