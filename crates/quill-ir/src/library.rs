//! The gate library: capability table and decomposition rules.
//!
//! A [`GateLibrary`] maps operation names to a [`GateDefinition`] holding the
//! arity, the parameter count and an optional decomposition rule. Circuits
//! query it by name when an operation is applied, and the unroller uses the
//! rules to rewrite gates into a target basis.
//!
//! Libraries are frozen once built. The standard library (the `qelib1` set,
//! with `u3` and `cx` as the only opaque gates) is created once per process
//! and shared through an [`Arc`]. Custom libraries are assembled with
//! [`GateLibraryBuilder`], which rejects malformed or cyclic rules.

use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;
use crate::register::QubitId;

type P = ParameterExpression;

/// A decomposition rule: parameters in, instructions over formal qubits
/// `0..arity` out.
pub type DecompositionRule = Arc<dyn Fn(&[P]) -> Vec<Instruction> + Send + Sync>;

/// Signature and optional decomposition of one named gate.
#[derive(Clone)]
pub struct GateDefinition {
    /// Gate name.
    pub name: String,
    /// Number of qubits.
    pub num_qubits: u32,
    /// Number of parameters.
    pub num_params: usize,
    rule: Option<DecompositionRule>,
}

impl GateDefinition {
    /// A gate without a decomposition.
    pub fn opaque(name: impl Into<String>, num_qubits: u32, num_params: usize) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_params,
            rule: None,
        }
    }

    /// A gate defined by a decomposition rule.
    pub fn composite(
        name: impl Into<String>,
        num_qubits: u32,
        num_params: usize,
        rule: impl Fn(&[P]) -> Vec<Instruction> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_params,
            rule: Some(Arc::new(rule)),
        }
    }

    /// Whether the gate has no decomposition.
    pub fn is_opaque(&self) -> bool {
        self.rule.is_none()
    }

    /// Whether both definitions are the same shared rule with the same
    /// signature. Rules compare by identity, so only copies of one
    /// definition match.
    fn is_same_as(&self, other: &GateDefinition) -> bool {
        self.num_qubits == other.num_qubits
            && self.num_params == other.num_params
            && match (&self.rule, &other.rule) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }

    /// Expand the rule for concrete parameters.
    ///
    /// Returns `Ok(None)` for opaque gates.
    pub fn decompose(&self, params: &[P]) -> IrResult<Option<Vec<Instruction>>> {
        if params.len() != self.num_params {
            return Err(IrError::ParameterCountMismatch {
                gate_name: self.name.clone(),
                expected: self.num_params,
                got: params.len(),
            });
        }
        Ok(self.rule.as_ref().map(|rule| rule(params)))
    }
}

impl fmt::Debug for GateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateDefinition")
            .field("name", &self.name)
            .field("num_qubits", &self.num_qubits)
            .field("num_params", &self.num_params)
            .field("opaque", &self.is_opaque())
            .finish()
    }
}

/// Read-only table of gate definitions.
#[derive(Debug, Clone, Default)]
pub struct GateLibrary {
    definitions: FxHashMap<String, GateDefinition>,
}

impl GateLibrary {
    /// The shared standard library.
    pub fn standard() -> Arc<GateLibrary> {
        static STANDARD: OnceLock<Arc<GateLibrary>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                let definitions = standard_definitions()
                    .into_iter()
                    .map(|def| (def.name.clone(), def))
                    .collect();
                Arc::new(GateLibrary { definitions })
            })
            .clone()
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&GateDefinition> {
        self.definitions.get(name)
    }

    /// Check whether a name is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Defined names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Build the gate value for a call by name.
    ///
    /// Standard names yield a [`StandardGate`]; anything else defined here
    /// yields a composite.
    pub fn instantiate(&self, name: &str, params: &[P]) -> IrResult<Gate> {
        let def = self
            .get(name)
            .ok_or_else(|| IrError::UnknownOperation(name.to_string()))?;
        if params.len() != def.num_params {
            return Err(IrError::ParameterCountMismatch {
                gate_name: name.to_string(),
                expected: def.num_params,
                got: params.len(),
            });
        }
        Ok(match StandardGate::from_name(name, params) {
            Some(gate) if gate.num_qubits() == def.num_qubits => Gate::Standard(gate),
            _ => Gate::Composite(
                crate::gate::CompositeGate::new(name, def.num_qubits).with_params(params.to_vec()),
            ),
        })
    }
}

/// Builder for custom gate libraries.
#[derive(Debug, Default)]
pub struct GateLibraryBuilder {
    definitions: FxHashMap<String, GateDefinition>,
}

impl GateLibraryBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder seeded with the standard definitions.
    pub fn standard() -> Self {
        Self::from_library(&GateLibrary::standard())
    }

    /// A builder seeded with the definitions of `library`.
    pub fn from_library(library: &GateLibrary) -> Self {
        Self {
            definitions: library.definitions.clone(),
        }
    }

    /// Add or replace a definition.
    ///
    /// Standard gate names keep their standard meaning: [`build`](Self::build)
    /// rejects any other definition under one of those names.
    #[must_use]
    pub fn define(mut self, definition: GateDefinition) -> Self {
        self.definitions.insert(definition.name.clone(), definition);
        self
    }

    /// Validate every rule and freeze the library.
    ///
    /// Rules are expanded once over placeholder parameters. Each produced
    /// instruction must be a gate or barrier on formal qubits of the rule,
    /// must name a defined gate with the right arity and parameter count,
    /// and no rule may reach its own gate transitively. Standard names must
    /// carry the standard definition.
    pub fn build(self) -> IrResult<Arc<GateLibrary>> {
        let standard = GateLibrary::standard();
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        for name in names {
            if let (Some(def), Some(std_def)) = (self.definitions.get(name), standard.get(name)) {
                if !def.is_same_as(std_def) {
                    return Err(IrError::InvalidRule {
                        gate: name.to_string(),
                        reason: "redefines a standard gate".to_string(),
                    });
                }
            }
        }

        let mut edges: FxHashMap<&str, Vec<String>> = FxHashMap::default();
        for def in self.definitions.values() {
            let placeholders: Vec<P> = (0..def.num_params)
                .map(|i| P::symbol(format!("p{i}")))
                .collect();
            let Some(body) = def.decompose(&placeholders)? else {
                continue;
            };
            let mut callees = Vec::new();
            for inst in &body {
                self.check_rule_instruction(def, inst)?;
                if let InstructionKind::Gate(gate) = &inst.kind {
                    callees.push(gate.name().to_string());
                }
            }
            edges.insert(def.name.as_str(), callees);
        }

        let mut names: Vec<&str> = edges.keys().copied().collect();
        names.sort_unstable();
        let mut done = FxHashSet::default();
        for name in names {
            let mut path = Vec::new();
            find_cycle(name, &edges, &mut path, &mut done)?;
        }

        Ok(Arc::new(GateLibrary {
            definitions: self.definitions,
        }))
    }

    fn check_rule_instruction(&self, def: &GateDefinition, inst: &Instruction) -> IrResult<()> {
        let malformed = |reason: String| IrError::InvalidRule {
            gate: def.name.clone(),
            reason,
        };
        if !inst.clbits.is_empty() || inst.condition.is_some() {
            return Err(malformed(format!("'{}' touches classical wires", inst.name())));
        }
        if let Some(q) = inst.qubits.iter().find(|q| q.0 >= def.num_qubits) {
            return Err(malformed(format!(
                "'{}' uses formal qubit {} of {}",
                inst.name(),
                q.0,
                def.num_qubits
            )));
        }
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let callee = self
                    .definitions
                    .get(gate.name())
                    .ok_or_else(|| malformed(format!("unknown gate '{}'", gate.name())))?;
                if callee.num_qubits != gate.num_qubits()
                    || callee.num_qubits as usize != inst.qubits.len()
                    || callee.num_params != gate.parameters().len()
                {
                    return Err(malformed(format!(
                        "call to '{}' does not match its signature",
                        gate.name()
                    )));
                }
                Ok(())
            }
            InstructionKind::Barrier => Ok(()),
            _ => Err(malformed(format!("'{}' is not allowed in a rule", inst.name()))),
        }
    }
}

fn find_cycle<'a>(
    name: &'a str,
    edges: &'a FxHashMap<&'a str, Vec<String>>,
    path: &mut Vec<&'a str>,
    done: &mut FxHashSet<&'a str>,
) -> IrResult<()> {
    if done.contains(name) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|&n| n == name) {
        let mut cycle: Vec<&str> = path[start..].to_vec();
        cycle.push(name);
        return Err(IrError::CyclicRule(cycle.join(" -> ")));
    }
    path.push(name);
    if let Some(callees) = edges.get(name) {
        for callee in callees {
            find_cycle(callee, edges, path, done)?;
        }
    }
    path.pop();
    done.insert(name);
    Ok(())
}

fn op(gate: StandardGate, qubits: &[u32]) -> Instruction {
    Instruction::gate(gate, qubits.iter().map(|&i| QubitId(i)))
}

fn half(p: &P) -> P {
    (p.clone() / P::constant(2.0)).simplify()
}

fn neg(p: &P) -> P {
    (-p.clone()).simplify()
}

fn c(v: f64) -> P {
    P::constant(v)
}

#[allow(clippy::too_many_lines)]
fn standard_definitions() -> Vec<GateDefinition> {
    use StandardGate::{CCX, CX, H, S, Sdg, T, Tdg, U1, U2, U3, X};

    let pi = P::pi;
    vec![
        GateDefinition::opaque("u3", 1, 3),
        GateDefinition::opaque("cx", 2, 0),
        GateDefinition::composite("u2", 1, 2, move |p| {
            vec![op(U3(pi() / c(2.0), p[0].clone(), p[1].clone()), &[0])]
        }),
        GateDefinition::composite("u1", 1, 1, |p| {
            vec![op(U3(c(0.0), c(0.0), p[0].clone()), &[0])]
        }),
        GateDefinition::composite("id", 1, 0, |_| vec![op(U3(c(0.0), c(0.0), c(0.0)), &[0])]),
        GateDefinition::composite("x", 1, 0, move |_| vec![op(U3(pi(), c(0.0), pi()), &[0])]),
        GateDefinition::composite("y", 1, 0, move |_| {
            vec![op(U3(pi(), pi() / c(2.0), pi() / c(2.0)), &[0])]
        }),
        GateDefinition::composite("z", 1, 0, move |_| vec![op(U1(pi()), &[0])]),
        GateDefinition::composite("h", 1, 0, move |_| vec![op(U2(c(0.0), pi()), &[0])]),
        GateDefinition::composite("s", 1, 0, move |_| vec![op(U1(pi() / c(2.0)), &[0])]),
        GateDefinition::composite("sdg", 1, 0, move |_| vec![op(U1(-pi() / c(2.0)), &[0])]),
        GateDefinition::composite("t", 1, 0, move |_| vec![op(U1(pi() / c(4.0)), &[0])]),
        GateDefinition::composite("tdg", 1, 0, move |_| vec![op(U1(-pi() / c(4.0)), &[0])]),
        GateDefinition::composite("rx", 1, 1, move |p| {
            vec![op(U3(p[0].clone(), -pi() / c(2.0), pi() / c(2.0)), &[0])]
        }),
        GateDefinition::composite("ry", 1, 1, |p| {
            vec![op(U3(p[0].clone(), c(0.0), c(0.0)), &[0])]
        }),
        GateDefinition::composite("rz", 1, 1, |p| vec![op(U1(p[0].clone()), &[0])]),
        GateDefinition::composite("cz", 2, 0, |_| {
            vec![op(H, &[1]), op(CX, &[0, 1]), op(H, &[1])]
        }),
        GateDefinition::composite("cy", 2, 0, |_| {
            vec![op(Sdg, &[1]), op(CX, &[0, 1]), op(S, &[1])]
        }),
        GateDefinition::composite("swap", 2, 0, |_| {
            vec![op(CX, &[0, 1]), op(CX, &[1, 0]), op(CX, &[0, 1])]
        }),
        GateDefinition::composite("ch", 2, 0, |_| {
            vec![
                op(H, &[1]),
                op(Sdg, &[1]),
                op(CX, &[0, 1]),
                op(H, &[1]),
                op(T, &[1]),
                op(CX, &[0, 1]),
                op(T, &[1]),
                op(H, &[1]),
                op(S, &[1]),
                op(X, &[1]),
                op(S, &[0]),
            ]
        }),
        GateDefinition::composite("crz", 2, 1, |p| {
            vec![
                op(U1(half(&p[0])), &[1]),
                op(CX, &[0, 1]),
                op(U1(neg(&half(&p[0]))), &[1]),
                op(CX, &[0, 1]),
            ]
        }),
        GateDefinition::composite("cu1", 2, 1, |p| {
            vec![
                op(U1(half(&p[0])), &[0]),
                op(CX, &[0, 1]),
                op(U1(neg(&half(&p[0]))), &[1]),
                op(CX, &[0, 1]),
                op(U1(half(&p[0])), &[1]),
            ]
        }),
        GateDefinition::composite("cu3", 2, 3, |p| {
            let (theta, phi, lambda) = (&p[0], &p[1], &p[2]);
            vec![
                op(U1(half(&(lambda.clone() - phi.clone()))), &[1]),
                op(CX, &[0, 1]),
                op(
                    U3(neg(&half(theta)), c(0.0), neg(&half(&(phi.clone() + lambda.clone())))),
                    &[1],
                ),
                op(CX, &[0, 1]),
                op(U3(half(theta), phi.clone(), c(0.0)), &[1]),
            ]
        }),
        GateDefinition::composite("ccx", 3, 0, |_| {
            vec![
                op(H, &[2]),
                op(CX, &[1, 2]),
                op(Tdg, &[2]),
                op(CX, &[0, 2]),
                op(T, &[2]),
                op(CX, &[1, 2]),
                op(Tdg, &[2]),
                op(CX, &[0, 2]),
                op(T, &[1]),
                op(T, &[2]),
                op(H, &[2]),
                op(CX, &[0, 1]),
                op(T, &[0]),
                op(Tdg, &[1]),
                op(CX, &[0, 1]),
            ]
        }),
        GateDefinition::composite("cswap", 3, 0, |_| {
            vec![op(CX, &[2, 1]), op(CCX, &[0, 1, 2]), op(CX, &[2, 1])]
        }),
    ]
}
