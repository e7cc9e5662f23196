//! DAG-based circuit representation.

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex as PetNodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::register::{Clbit, ClbitId, Qubit, QubitId, Register, RegisterKind};
use crate::source::CircuitSource;

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// Position of an operation in the stable order.
///
/// Operations appended to the DAG get `[n]`; the i-th replacement of a
/// substituted node gets the parent's key extended by `[i]`, so it sorts
/// exactly where its parent was.
type OrderKey = Vec<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an input node.
    #[inline]
    pub fn is_input(&self) -> bool {
        matches!(self, DagNode::In(_))
    }

    /// Check if this is an output node.
    #[inline]
    pub fn is_output(&self) -> bool {
        matches!(self, DagNode::Out(_))
    }

    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG representing a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// DAG-based circuit representation.
///
/// The circuit is represented as a directed acyclic graph where:
/// - Nodes are either input nodes, output nodes, or operation nodes
/// - Edges represent wires (quantum or classical)
/// - Each wire has exactly one input and one output node
/// - An edge `a -> b` on wire `w` means `a` happens before `b` on `w`
///
/// A conditioned operation also sits on every classical wire of its
/// condition register, so it is ordered after any write to that register.
///
/// Node indices stay valid across removals, and [`CircuitDag::topological_ops`]
/// is stable: without rewrites it is exactly the declaration order, and a
/// substituted node's replacements take the parent's place.
#[derive(Debug, Clone)]
pub struct CircuitDag {
    /// Circuit name.
    name: String,
    /// Registers in declaration order.
    registers: Vec<Register>,
    /// Qubit table, indexed by id.
    qubits: Vec<Qubit>,
    /// Classical bit table, indexed by id.
    clbits: Vec<Clbit>,
    /// The underlying graph.
    graph: StableDiGraph<DagNode, DagEdge, u32>,
    /// Map from wire to its input node.
    inputs: FxHashMap<WireId, NodeIndex>,
    /// Map from wire to its output node.
    outputs: FxHashMap<WireId, NodeIndex>,
    /// Wire front: maps each wire to the node just before the output node.
    wire_front: FxHashMap<WireId, NodeIndex>,
    /// Stable-order key of every operation node.
    order: FxHashMap<NodeIndex, OrderKey>,
    /// Next top-level order key.
    next_seq: u32,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registers: vec![],
            qubits: vec![],
            clbits: vec![],
            graph: StableDiGraph::default(),
            inputs: FxHashMap::default(),
            outputs: FxHashMap::default(),
            wire_front: FxHashMap::default(),
            order: FxHashMap::default(),
            next_seq: 0,
        }
    }

    /// Build the DAG of a circuit.
    pub fn from_circuit(circuit: &Circuit) -> IrResult<Self> {
        Self::from_source(circuit)
    }

    /// Build the DAG of any circuit representation.
    ///
    /// Registers are declared in the source's order, then every instruction
    /// is applied in the source's execution order.
    pub fn from_source(source: &impl CircuitSource) -> IrResult<Self> {
        let mut dag = Self::new(source.name());
        for register in source.registers() {
            dag.add_register(register.clone())?;
        }
        for inst in source.ordered_instructions() {
            dag.apply(inst.clone())?;
        }
        Ok(dag)
    }

    /// Declare a register, adding an input and output node per wire.
    pub fn add_register(&mut self, register: Register) -> IrResult<()> {
        if self.registers.iter().any(|r| r.name == register.name) {
            return Err(IrError::DuplicateRegister(register.name));
        }
        for i in 0..register.size {
            let wire = match register.kind {
                RegisterKind::Quantum => {
                    let id = QubitId(self.qubits.len() as u32);
                    self.qubits.push(Qubit::new(id, &register.name, i));
                    WireId::Qubit(id)
                }
                RegisterKind::Classical => {
                    let id = ClbitId(self.clbits.len() as u32);
                    self.clbits.push(Clbit::new(id, &register.name, i));
                    WireId::Clbit(id)
                }
            };
            let in_node = self.graph.add_node(DagNode::In(wire));
            let out_node = self.graph.add_node(DagNode::Out(wire));
            self.graph.add_edge(in_node, out_node, DagEdge { wire });
            self.inputs.insert(wire, in_node);
            self.outputs.insert(wire, out_node);
            self.wire_front.insert(wire, in_node);
        }
        self.registers.push(register);
        Ok(())
    }

    /// Every wire an instruction sits on: qubits, clbits, then the bits of
    /// its condition register.
    fn wires_of(&self, instruction: &Instruction) -> IrResult<Vec<WireId>> {
        let gate_name = Some(instruction.name().to_string());

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = instruction.qubits.len() as u32;
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        let mut wires = Vec::with_capacity(instruction.qubits.len() + instruction.clbits.len());
        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !self.inputs.contains_key(&WireId::Qubit(qubit)) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
            if !seen.insert(WireId::Qubit(qubit)) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
            wires.push(WireId::Qubit(qubit));
        }
        for &clbit in &instruction.clbits {
            if !self.inputs.contains_key(&WireId::Clbit(clbit)) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
            if seen.insert(WireId::Clbit(clbit)) {
                wires.push(WireId::Clbit(clbit));
            }
        }
        if let Some(cond) = &instruction.condition {
            let bits = self.register_clbits(&cond.register);
            if bits.is_empty() {
                return Err(IrError::InvalidCondition {
                    register: cond.register.clone(),
                    value: cond.value,
                    reason: "register is not a classical register of this circuit".into(),
                });
            }
            for clbit in bits {
                if seen.insert(WireId::Clbit(clbit)) {
                    wires.push(WireId::Clbit(clbit));
                }
            }
        }
        Ok(wires)
    }

    fn wire_edge(&self, from: NodeIndex, to: NodeIndex, wire: WireId) -> IrResult<petgraph::stable_graph::EdgeIndex<u32>> {
        self.graph
            .edges_directed(from, Direction::Outgoing)
            .find(|e| e.weight().wire == wire && e.target() == to)
            .map(|e| e.id())
            .ok_or_else(|| {
                IrError::InvalidDag(format!("Missing edge on wire {wire:?} from {from:?} to {to:?}"))
            })
    }

    /// Append an instruction after everything already on its wires.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        let wires = self.wires_of(&instruction)?;

        let op_node = self.graph.add_node(DagNode::Op(instruction));
        self.order.insert(op_node, vec![self.next_seq]);
        self.next_seq += 1;

        for wire in wires {
            let out_node = self.outputs[&wire];
            let prev_node = self.wire_front[&wire];
            let eid = self.wire_edge(prev_node, out_node, wire)?;
            self.graph.remove_edge(eid);
            self.graph.add_edge(prev_node, op_node, DagEdge { wire });
            self.graph.add_edge(op_node, out_node, DagEdge { wire });
            self.wire_front.insert(wire, op_node);
        }

        Ok(op_node)
    }

    /// Operations in stable topological order.
    ///
    /// Among the operations whose predecessors are all done, the one with
    /// the smallest order key goes first.
    pub fn topological_ops(&self) -> Vec<(NodeIndex, &Instruction)> {
        let mut pending: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut ready = BinaryHeap::new();

        for (&node, key) in &self.order {
            let blockers = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .filter(|e| self.graph[e.source()].is_op())
                .count();
            if blockers == 0 {
                ready.push(Reverse((key, node)));
            } else {
                pending.insert(node, blockers);
            }
        }

        let mut sorted = Vec::with_capacity(self.order.len());
        while let Some(Reverse((_, node))) = ready.pop() {
            if let DagNode::Op(inst) = &self.graph[node] {
                sorted.push((node, inst));
            }
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let target = edge.target();
                if let Some(count) = pending.get_mut(&target) {
                    *count -= 1;
                    if *count == 0 {
                        pending.remove(&target);
                        ready.push(Reverse((&self.order[&target], target)));
                    }
                }
            }
        }
        sorted
    }

    /// Instructions in stable topological order.
    pub fn topological_order(&self) -> Vec<&Instruction> {
        self.topological_ops().into_iter().map(|(_, inst)| inst).collect()
    }

    /// The node right before `node` on `wire`.
    pub fn predecessor_on(&self, wire: WireId, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.source())
    }

    /// The node right after `node` on `wire`.
    pub fn successor_on(&self, wire: WireId, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.target())
    }

    /// Operations on one wire, first to last.
    pub fn wire_ops(&self, wire: WireId) -> Vec<(NodeIndex, &Instruction)> {
        let mut ops = Vec::new();
        let Some(&start) = self.inputs.get(&wire) else {
            return ops;
        };
        let mut current = start;
        while let Some(next) = self.successor_on(wire, current) {
            match &self.graph[next] {
                DagNode::Op(inst) => ops.push((next, inst)),
                _ => break,
            }
            current = next;
        }
        ops
    }

    /// Replace one operation node with an ordered sequence of instructions.
    ///
    /// Each replacement instruction is chained onto the wires it touches,
    /// starting from the old node's predecessor on that wire; the last one
    /// on each wire is linked to the old node's successor. Replacements may
    /// only touch wires of the old node. Returns the new nodes in order.
    /// Nothing changes when validation fails.
    pub fn substitute(
        &mut self,
        node: NodeIndex,
        replacement: impl IntoIterator<Item = Instruction>,
    ) -> IrResult<Vec<NodeIndex>> {
        let Some(DagNode::Op(old)) = self.graph.node_weight(node) else {
            return Err(IrError::InvalidNode);
        };
        let old_wires = self.wires_of(old)?;
        let allowed: FxHashSet<WireId> = old_wires.iter().copied().collect();

        let mut staged = Vec::new();
        for inst in replacement {
            let wires = self.wires_of(&inst)?;
            if let Some(w) = wires.iter().find(|w| !allowed.contains(w)) {
                return Err(IrError::InvalidDag(format!(
                    "Replacement '{}' touches wire {w:?} outside the substituted node",
                    inst.name()
                )));
            }
            staged.push((inst, wires));
        }

        let mut front = FxHashMap::default();
        let mut successors = Vec::with_capacity(old_wires.len());
        for &wire in &old_wires {
            let pred = self.predecessor_on(wire, node).ok_or_else(|| {
                IrError::InvalidDag(format!("Node {node:?} has no predecessor on {wire:?}"))
            })?;
            let succ = self.successor_on(wire, node).ok_or_else(|| {
                IrError::InvalidDag(format!("Node {node:?} has no successor on {wire:?}"))
            })?;
            front.insert(wire, pred);
            successors.push((wire, succ));
        }

        let parent_key = self.order.remove(&node).unwrap_or_default();
        self.graph.remove_node(node);

        let mut new_nodes = Vec::with_capacity(staged.len());
        for (i, (inst, wires)) in staged.into_iter().enumerate() {
            let idx = self.graph.add_node(DagNode::Op(inst));
            let mut key = parent_key.clone();
            key.push(i as u32);
            self.order.insert(idx, key);
            for wire in wires {
                if let Some(prev) = front.insert(wire, idx) {
                    self.graph.add_edge(prev, idx, DagEdge { wire });
                }
            }
            new_nodes.push(idx);
        }

        for (wire, succ) in successors {
            let last = front[&wire];
            self.graph.add_edge(last, succ, DagEdge { wire });
            if self.wire_front.get(&wire) == Some(&node) {
                self.wire_front.insert(wire, last);
            }
        }

        Ok(new_nodes)
    }

    /// Replace one operation node with the operations of another DAG.
    ///
    /// `sub` must be declared over the same wires as this DAG.
    pub fn substitute_dag(&mut self, node: NodeIndex, sub: &CircuitDag) -> IrResult<Vec<NodeIndex>> {
        let replacement: Vec<Instruction> = sub.topological_order().into_iter().cloned().collect();
        self.substitute(node, replacement)
    }

    /// Remove an operation node, reconnecting its wires.
    pub fn remove_op(&mut self, node: NodeIndex) -> IrResult<Instruction> {
        let instruction = self
            .get_instruction(node)
            .cloned()
            .ok_or(IrError::InvalidNode)?;
        self.substitute(node, std::iter::empty())?;
        Ok(instruction)
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// Get a node by index.
    #[inline]
    pub fn node(&self, node: NodeIndex) -> Option<&DagNode> {
        self.graph.node_weight(node)
    }

    /// Input node of a wire.
    #[inline]
    pub fn input_node(&self, wire: WireId) -> Option<NodeIndex> {
        self.inputs.get(&wire).copied()
    }

    /// Output node of a wire.
    #[inline]
    pub fn output_node(&self, wire: WireId) -> Option<NodeIndex> {
        self.outputs.get(&wire).copied()
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.order.len()
    }

    /// Calculate the circuit depth: the longest chain of operations.
    pub fn depth(&self) -> usize {
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(self.order.len(), Default::default());
        let mut max_depth = 0;
        for (node, _) in self.topological_ops() {
            let d = 1 + self
                .graph
                .edges_directed(node, Direction::Incoming)
                .filter_map(|e| depths.get(&e.source()).copied())
                .max()
                .unwrap_or(0);
            max_depth = max_depth.max(d);
            depths.insert(node, d);
        }
        max_depth
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &StableDiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that:
    /// - The graph is acyclic
    /// - Every wire has an In node and an Out node
    /// - Each wire forms one path from In to Out
    /// - Order keys increase along every wire
    /// - Every operation node lies on some wire
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        let mut visited = FxHashSet::default();
        for (&wire, &in_node) in &self.inputs {
            let out_node = *self.outputs.get(&wire).ok_or_else(|| {
                IrError::InvalidDag(format!("Wire {wire:?} has an In node but no Out node"))
            })?;

            let mut current = in_node;
            let mut last_key: Option<&OrderKey> = None;
            let max_steps = self.graph.node_count();
            let mut steps = 0;
            while current != out_node {
                let next = self.successor_on(wire, current).ok_or_else(|| {
                    IrError::InvalidDag(format!(
                        "Wire {wire:?} is broken: no outgoing edge from node {current:?}"
                    ))
                })?;
                if let Some(key) = self.order.get(&next) {
                    if last_key.is_some_and(|prev| prev >= key) {
                        return Err(IrError::InvalidDag(format!(
                            "Order keys out of sequence on wire {wire:?}"
                        )));
                    }
                    last_key = Some(key);
                    visited.insert(next);
                }
                current = next;
                steps += 1;
                if steps > max_steps {
                    return Err(IrError::InvalidDag(format!(
                        "Wire {wire:?} has too many steps (possible infinite loop)"
                    )));
                }
            }
        }
        if self.outputs.len() != self.inputs.len() {
            return Err(IrError::InvalidDag("Unpaired output node".into()));
        }

        if visited.len() != self.order.len() {
            return Err(IrError::InvalidDag(
                "Operation node not reachable along any wire".into(),
            ));
        }

        Ok(())
    }
}

impl CircuitSource for CircuitDag {
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
        self.topological_order()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{ClassicalCondition, StandardGate};
    use crate::parameter::ParameterExpression;

    fn dag_with(qubits: u32, clbits: u32) -> CircuitDag {
        let mut dag = CircuitDag::new("test");
        dag.add_register(Register::quantum("q", qubits)).unwrap();
        if clbits > 0 {
            dag.add_register(Register::classical("c", clbits)).unwrap();
        }
        dag
    }

    fn names(dag: &CircuitDag) -> Vec<String> {
        dag.topological_order()
            .iter()
            .map(|i| i.name().to_string())
            .collect()
    }

    fn h(q: u32) -> Instruction {
        Instruction::gate(StandardGate::H, [QubitId(q)])
    }

    fn cx(a: u32, b: u32) -> Instruction {
        Instruction::gate(StandardGate::CX, [QubitId(a), QubitId(b)])
    }

    fn u1(q: u32, v: f64) -> Instruction {
        Instruction::gate(StandardGate::U1(ParameterExpression::constant(v)), [QubitId(q)])
    }

    #[test]
    fn test_empty_dag() {
        let dag = CircuitDag::new("empty");
        assert_eq!(dag.num_qubits(), 0);
        assert_eq!(dag.num_clbits(), 0);
        assert_eq!(dag.num_ops(), 0);
        assert_eq!(dag.depth(), 0);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_bell_state_depth() {
        let mut dag = dag_with(2, 0);
        dag.apply(h(0)).unwrap();
        dag.apply(cx(0, 1)).unwrap();
        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 2);
    }

    #[test]
    fn test_parallel_gates_depth() {
        let mut dag = dag_with(2, 0);
        dag.apply(h(0)).unwrap();
        dag.apply(h(1)).unwrap();
        assert_eq!(dag.depth(), 1);
    }

    #[test]
    fn test_order_matches_declaration() {
        let mut dag = dag_with(3, 0);
        // Independent ops on different wires keep declaration order.
        dag.apply(h(2)).unwrap();
        dag.apply(u1(0, 0.1)).unwrap();
        dag.apply(cx(1, 2)).unwrap();
        dag.apply(h(0)).unwrap();
        assert_eq!(names(&dag), ["h", "u1", "cx", "h"]);
        let first = dag.topological_order()[0];
        assert_eq!(first.qubits, vec![QubitId(2)]);
    }

    #[test]
    fn test_predecessor_and_successor_on_wire() {
        let mut dag = dag_with(2, 0);
        let a = dag.apply(h(0)).unwrap();
        let b = dag.apply(cx(0, 1)).unwrap();
        let q0 = WireId::Qubit(QubitId(0));
        let q1 = WireId::Qubit(QubitId(1));

        assert_eq!(dag.predecessor_on(q0, b), Some(a));
        assert_eq!(dag.successor_on(q0, a), Some(b));
        assert_eq!(dag.predecessor_on(q1, b), dag.input_node(q1));
        assert_eq!(dag.successor_on(q1, b), dag.output_node(q1));
        assert_eq!(dag.predecessor_on(q1, a), None);
    }

    #[test]
    fn test_conditioned_op_sits_on_condition_bits() {
        let mut dag = dag_with(1, 2);
        let m = dag.apply(Instruction::measure(QubitId(0), ClbitId(1))).unwrap();
        let x = dag
            .apply(
                Instruction::gate(StandardGate::X, [QubitId(0)])
                    .with_condition(ClassicalCondition::new("c", 1)),
            )
            .unwrap();
        assert_eq!(dag.predecessor_on(WireId::Clbit(ClbitId(1)), x), Some(m));
        assert_eq!(
            dag.predecessor_on(WireId::Clbit(ClbitId(0)), x),
            dag.input_node(WireId::Clbit(ClbitId(0)))
        );
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_unknown_condition_register() {
        let mut dag = dag_with(1, 0);
        let result = dag.apply(h(0).with_condition(ClassicalCondition::new("c", 0)));
        assert!(matches!(result, Err(IrError::InvalidCondition { .. })));
    }

    #[test]
    fn test_gate_arity_mismatch() {
        let mut dag = dag_with(2, 0);
        let result = dag.apply(Instruction::gate(StandardGate::CX, [QubitId(0)]));
        match result {
            Err(IrError::QubitCountMismatch {
                gate_name,
                expected,
                got,
            }) => {
                assert_eq!(gate_name, "cx");
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            _ => panic!("Expected QubitCountMismatch error"),
        }
    }

    #[test]
    fn test_qubit_not_found_with_context() {
        let mut dag = dag_with(1, 0);
        match dag.apply(cx(0, 99)) {
            Err(IrError::QubitNotFound { qubit, gate_name }) => {
                assert_eq!(qubit, QubitId(99));
                assert_eq!(gate_name, Some("cx".to_string()));
            }
            _ => panic!("Expected QubitNotFound error"),
        }
    }

    #[test]
    fn test_substitute_keeps_position_and_neighbours() {
        let mut dag = dag_with(2, 0);
        dag.apply(u1(0, 0.1)).unwrap();
        let target = dag.apply(Instruction::gate(StandardGate::CZ, [QubitId(0), QubitId(1)])).unwrap();
        dag.apply(u1(1, 0.2)).unwrap();
        dag.apply(u1(0, 0.3)).unwrap();

        let new_nodes = dag.substitute(target, vec![h(1), cx(0, 1), h(1)]).unwrap();
        assert_eq!(new_nodes.len(), 3);
        assert_eq!(names(&dag), ["u1", "h", "cx", "h", "u1", "u1"]);

        let q1 = WireId::Qubit(QubitId(1));
        let wire: Vec<_> = dag.wire_ops(q1).iter().map(|(_, i)| i.name().to_string()).collect();
        assert_eq!(wire, ["h", "cx", "h", "u1"]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_substitute_then_append() {
        let mut dag = dag_with(1, 0);
        let target = dag.apply(h(0)).unwrap();
        dag.substitute(target, vec![u1(0, 0.5), u1(0, 0.6)]).unwrap();
        dag.apply(u1(0, 0.7)).unwrap();
        let params: Vec<_> = dag
            .topological_order()
            .iter()
            .map(|i| i.as_gate().unwrap().parameters()[0].as_f64().unwrap())
            .collect();
        assert_eq!(params, [0.5, 0.6, 0.7]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_substitute_rejects_foreign_wire() {
        let mut dag = dag_with(2, 0);
        let target = dag.apply(h(0)).unwrap();
        let result = dag.substitute(target, vec![h(1)]);
        assert!(matches!(result, Err(IrError::InvalidDag(_))));
        assert_eq!(dag.num_ops(), 1);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_substitute_dag() {
        let mut dag = dag_with(2, 0);
        let target = dag.apply(Instruction::gate(StandardGate::Swap, [QubitId(0), QubitId(1)])).unwrap();
        let mut sub = dag_with(2, 0);
        sub.apply(cx(0, 1)).unwrap();
        sub.apply(cx(1, 0)).unwrap();
        sub.apply(cx(0, 1)).unwrap();
        dag.substitute_dag(target, &sub).unwrap();
        assert_eq!(names(&dag), ["cx", "cx", "cx"]);
        assert_eq!(dag.depth(), 3);
    }

    #[test]
    fn test_remove_op() {
        let mut dag = dag_with(2, 0);
        dag.apply(h(0)).unwrap();
        let mid = dag.apply(cx(0, 1)).unwrap();
        dag.apply(h(1)).unwrap();
        let removed = dag.remove_op(mid).unwrap();
        assert_eq!(removed.name(), "cx");
        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 1);
        dag.verify_integrity().unwrap();
        assert!(matches!(dag.remove_op(mid), Err(IrError::InvalidNode)));
    }

    #[test]
    fn test_verify_integrity_with_measurement() {
        let mut dag = dag_with(3, 3);
        dag.apply(h(0)).unwrap();
        dag.apply(cx(0, 1)).unwrap();
        dag.apply(cx(1, 2)).unwrap();
        for i in 0..3 {
            dag.apply(Instruction::measure(QubitId(i), ClbitId(i))).unwrap();
        }
        dag.verify_integrity().unwrap();
    }
}
