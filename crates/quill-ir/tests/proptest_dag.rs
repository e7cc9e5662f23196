//! Property-based tests for the circuit DAG.
//!
//! A DAG built from a circuit must give back the circuit's operations per
//! wire, in the order they were applied, and stay consistent under
//! substitution.

use proptest::prelude::*;
use quill_ir::{
    Circuit, CircuitDag, CircuitSource, ClassicalCondition, Instruction, QubitId, StandardGate,
    WireId,
};

/// Operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    U1(u32, f64),
    CX(u32, u32),
    Measure(u32),
    CondX(u32, u64),
}

impl GateOp {
    fn apply(&self, circuit: &mut Circuit) {
        let _ = match *self {
            GateOp::H(q) => circuit.h(("q", q)),
            GateOp::U1(q, v) => circuit.u1(v, ("q", q)),
            GateOp::CX(a, b) => circuit.cx(("q", a), ("q", b)),
            GateOp::Measure(q) => circuit.measure(("q", q), ("c", q)),
            GateOp::CondX(q, v) => circuit.apply(
                "x",
                &[],
                &[("q", q).into()],
                Some(ClassicalCondition::new("c", v)),
            ),
        };
    }
}

fn arb_gate_op(n: u32) -> impl Strategy<Value = GateOp> {
    let max_value = (1_u64 << n) - 1;
    prop_oneof![
        (0..n).prop_map(GateOp::H),
        (0..n, -3.0_f64..3.0).prop_map(|(q, v)| GateOp::U1(q, v)),
        (0..n, 0..n)
            .prop_filter("Control and target must differ", |(c, t)| c != t)
            .prop_map(|(c, t)| GateOp::CX(c, t)),
        (0..n).prop_map(GateOp::Measure),
        (0..n, 0..=max_value).prop_map(|(q, v)| GateOp::CondX(q, v)),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=5).prop_flat_map(|n| {
        prop::collection::vec(arb_gate_op(n), 0..=25).prop_map(move |ops| {
            let mut circuit = Circuit::new("prop");
            circuit.add_qreg("q", n).unwrap();
            circuit.add_creg("c", n).unwrap();
            for op in &ops {
                op.apply(&mut circuit);
            }
            circuit
        })
    })
}

/// Instructions of a circuit touching `qubit`, in declaration order.
fn declared_on(circuit: &Circuit, qubit: QubitId) -> Vec<Instruction> {
    circuit
        .instructions()
        .iter()
        .filter(|inst| inst.qubits.contains(&qubit))
        .cloned()
        .collect()
}

fn dag_on(dag: &CircuitDag, qubit: QubitId) -> Vec<Instruction> {
    dag.wire_ops(WireId::Qubit(qubit))
        .into_iter()
        .map(|(_, inst)| inst.clone())
        .collect()
}

proptest! {
    /// Without rewrites the DAG reads back in declaration order.
    #[test]
    fn test_dag_order_is_declaration_order(circuit in arb_circuit()) {
        let dag = circuit.to_dag().unwrap();
        let declared: Vec<_> = circuit.instructions().iter().collect();
        prop_assert_eq!(dag.ordered_instructions(), declared);
        dag.verify_integrity().unwrap();
    }

    /// Every qubit wire carries exactly its operations, in order.
    #[test]
    fn test_per_wire_order_preserved(circuit in arb_circuit()) {
        let dag = circuit.to_dag().unwrap();
        for i in 0..circuit.num_qubits() as u32 {
            prop_assert_eq!(dag_on(&dag, QubitId(i)), declared_on(&circuit, QubitId(i)));
        }
    }

    /// Rebuilding a DAG from a DAG is the identity on its order.
    #[test]
    fn test_dag_from_dag(circuit in arb_circuit()) {
        let dag = circuit.to_dag().unwrap();
        let again = CircuitDag::from_source(&dag).unwrap();
        prop_assert_eq!(again.ordered_instructions(), dag.ordered_instructions());
        prop_assert_eq!(again.depth(), dag.depth());
    }

    /// Splitting every Hadamard into two gates keeps the DAG sound and
    /// puts the pair exactly where the Hadamard was.
    #[test]
    fn test_substitution_keeps_wire_order(circuit in arb_circuit()) {
        let mut dag = circuit.to_dag().unwrap();
        let targets: Vec<_> = dag
            .topological_ops()
            .into_iter()
            .filter(|(_, inst)| inst.name() == "h")
            .map(|(node, inst)| (node, inst.qubits[0]))
            .collect();
        for (node, q) in targets {
            dag.substitute(node, vec![
                Instruction::gate(StandardGate::U2(0.0.into(), std::f64::consts::PI.into()), [q]),
                Instruction::gate(StandardGate::Id, [q]),
            ]).unwrap();
        }
        dag.verify_integrity().unwrap();

        for i in 0..circuit.num_qubits() as u32 {
            let expected: Vec<String> = declared_on(&circuit, QubitId(i))
                .iter()
                .flat_map(|inst| match inst.name() {
                    "h" => vec!["u2".to_string(), "id".to_string()],
                    other => vec![other.to_string()],
                })
                .collect();
            let got: Vec<String> = dag_on(&dag, QubitId(i))
                .iter()
                .map(|inst| inst.name().to_string())
                .collect();
            prop_assert_eq!(got, expected);
        }
    }
}
