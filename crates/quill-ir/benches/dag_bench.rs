//! Benchmarks for Quill circuit and DAG operations
//!
//! Run with: cargo bench -p quill-ir

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use quill_ir::{Circuit, CircuitDag, Instruction, StandardGate};

fn layered_circuit(n: u32, layers: usize) -> Circuit {
    let mut circuit = Circuit::new("bench");
    circuit.add_qreg("q", n).unwrap();
    for _layer in 0..layers {
        circuit.h("q").unwrap();
        for i in (0..n - 1).step_by(2) {
            circuit.cx(("q", i), ("q", i + 1)).unwrap();
        }
    }
    circuit
}

/// Benchmark broadcast application of gates
fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    for num_qubits in &[2, 10, 50] {
        group.bench_with_input(
            BenchmarkId::new("h_register", num_qubits),
            num_qubits,
            |b, &n| {
                let mut circuit = Circuit::new("bench");
                circuit.add_qreg("q", n).unwrap();
                b.iter(|| {
                    circuit.h(black_box("q")).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark DAG construction and ordered readout
fn bench_dag(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag");

    for num_qubits in &[5, 20, 50] {
        let circuit = layered_circuit(*num_qubits, 10);

        group.bench_with_input(
            BenchmarkId::new("from_circuit", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| black_box(circuit.to_dag().unwrap()));
            },
        );

        let dag = circuit.to_dag().unwrap();
        group.bench_with_input(
            BenchmarkId::new("topological_order", num_qubits),
            &dag,
            |b, dag| {
                b.iter(|| black_box(dag.topological_order().len()));
            },
        );
        group.bench_with_input(BenchmarkId::new("depth", num_qubits), &dag, |b, dag| {
            b.iter(|| black_box(dag.depth()));
        });
    }

    group.finish();
}

/// Benchmark substituting every Hadamard with a two-gate sequence
fn bench_substitute(c: &mut Criterion) {
    let circuit = layered_circuit(20, 10);
    let dag = circuit.to_dag().unwrap();

    c.bench_function("substitute_all_h", |b| {
        b.iter(|| {
            let mut dag: CircuitDag = dag.clone();
            let targets: Vec<_> = dag
                .topological_ops()
                .into_iter()
                .filter(|(_, inst)| inst.name() == "h")
                .map(|(node, inst)| (node, inst.qubits[0]))
                .collect();
            for (node, q) in targets {
                dag.substitute(
                    node,
                    vec![
                        Instruction::gate(StandardGate::S, [q]),
                        Instruction::gate(StandardGate::Sdg, [q]),
                    ],
                )
                .unwrap();
            }
            black_box(dag.num_ops())
        });
    });
}

criterion_group!(benches, bench_apply, bench_dag, bench_substitute);

criterion_main!(benches);
