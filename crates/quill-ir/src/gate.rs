//! Gate types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parameter::ParameterExpression;

type P = ParameterExpression;

/// The `qelib1` gate set.
///
/// Every variant knows its arity, its parameters and its closed-form
/// inverse. Decomposition rules for these gates live in the gate library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    Id,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// Rotation around X axis.
    Rx(P),
    /// Rotation around Y axis.
    Ry(P),
    /// Rotation around Z axis.
    Rz(P),
    /// Phase gate U1(λ).
    U1(P),
    /// U2(φ, λ) = U3(π/2, φ, λ).
    U2(P, P),
    /// Universal single-qubit gate U3(θ, φ, λ).
    U3(P, P, P),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around Z.
    CRz(P),
    /// Controlled phase gate.
    CU1(P),
    /// Controlled U3.
    CU3(P, P, P),
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

impl StandardGate {
    /// Look up a standard gate by name, consuming its parameters.
    ///
    /// Returns `None` for unknown names or a wrong parameter count.
    pub fn from_name(name: &str, params: &[P]) -> Option<Self> {
        let gate = match (name, params) {
            ("id", []) => StandardGate::Id,
            ("x", []) => StandardGate::X,
            ("y", []) => StandardGate::Y,
            ("z", []) => StandardGate::Z,
            ("h", []) => StandardGate::H,
            ("s", []) => StandardGate::S,
            ("sdg", []) => StandardGate::Sdg,
            ("t", []) => StandardGate::T,
            ("tdg", []) => StandardGate::Tdg,
            ("rx", [a]) => StandardGate::Rx(a.clone()),
            ("ry", [a]) => StandardGate::Ry(a.clone()),
            ("rz", [a]) => StandardGate::Rz(a.clone()),
            ("u1", [a]) => StandardGate::U1(a.clone()),
            ("u2", [a, b]) => StandardGate::U2(a.clone(), b.clone()),
            ("u3", [a, b, c]) => StandardGate::U3(a.clone(), b.clone(), c.clone()),
            ("cx", []) => StandardGate::CX,
            ("cy", []) => StandardGate::CY,
            ("cz", []) => StandardGate::CZ,
            ("ch", []) => StandardGate::CH,
            ("swap", []) => StandardGate::Swap,
            ("crz", [a]) => StandardGate::CRz(a.clone()),
            ("cu1", [a]) => StandardGate::CU1(a.clone()),
            ("cu3", [a, b, c]) => StandardGate::CU3(a.clone(), b.clone(), c.clone()),
            ("ccx", []) => StandardGate::CCX,
            ("cswap", []) => StandardGate::CSwap,
            _ => return None,
        };
        Some(gate)
    }

    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::Id => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::U1(_) => "u1",
            StandardGate::U2(_, _) => "u2",
            StandardGate::U3(_, _, _) => "u3",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CRz(_) => "crz",
            StandardGate::CU1(_) => "cu1",
            StandardGate::CU3(_, _, _) => "cu3",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::Id
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::U1(_)
            | StandardGate::U2(_, _)
            | StandardGate::U3(_, _, _) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRz(_)
            | StandardGate::CU1(_)
            | StandardGate::CU3(_, _, _) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<&P> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::U1(p)
            | StandardGate::CRz(p)
            | StandardGate::CU1(p) => vec![p],
            StandardGate::U2(a, b) => vec![a, b],
            StandardGate::U3(a, b, c) | StandardGate::CU3(a, b, c) => vec![a, b, c],
            _ => vec![],
        }
    }

    /// Whether the gate is its own inverse.
    ///
    /// Listed per gate; nothing is inferred from the parameters.
    pub fn is_self_inverse(&self) -> bool {
        matches!(
            self,
            StandardGate::Id
                | StandardGate::X
                | StandardGate::Y
                | StandardGate::Z
                | StandardGate::H
                | StandardGate::CX
                | StandardGate::CY
                | StandardGate::CZ
                | StandardGate::CH
                | StandardGate::Swap
                | StandardGate::CCX
                | StandardGate::CSwap
        )
    }

    /// The adjoint gate, by closed-form parameter transforms.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let neg = |p: &P| (-p.clone()).simplify();
        match self {
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            StandardGate::Rx(t) => StandardGate::Rx(neg(t)),
            StandardGate::Ry(t) => StandardGate::Ry(neg(t)),
            StandardGate::Rz(t) => StandardGate::Rz(neg(t)),
            StandardGate::U1(l) => StandardGate::U1(neg(l)),
            StandardGate::CRz(t) => StandardGate::CRz(neg(t)),
            StandardGate::CU1(l) => StandardGate::CU1(neg(l)),
            // u2(φ, λ)† = u2(-λ - π, -φ + π)
            StandardGate::U2(phi, lambda) => StandardGate::U2(
                (-lambda.clone() - P::pi()).simplify(),
                (-phi.clone() + P::pi()).simplify(),
            ),
            StandardGate::U3(theta, phi, lambda) => {
                StandardGate::U3(neg(theta), neg(lambda), neg(phi))
            }
            StandardGate::CU3(theta, phi, lambda) => {
                StandardGate::CU3(neg(theta), neg(lambda), neg(phi))
            }
            StandardGate::Id
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CCX
            | StandardGate::CSwap => self.clone(),
        }
    }

    /// Rewrite every parameter through `f`.
    #[must_use]
    pub fn map_params(&self, f: &dyn Fn(&P) -> P) -> Self {
        match self {
            StandardGate::Rx(a) => StandardGate::Rx(f(a)),
            StandardGate::Ry(a) => StandardGate::Ry(f(a)),
            StandardGate::Rz(a) => StandardGate::Rz(f(a)),
            StandardGate::U1(a) => StandardGate::U1(f(a)),
            StandardGate::U2(a, b) => StandardGate::U2(f(a), f(b)),
            StandardGate::U3(a, b, c) => StandardGate::U3(f(a), f(b), f(c)),
            StandardGate::CRz(a) => StandardGate::CRz(f(a)),
            StandardGate::CU1(a) => StandardGate::CU1(f(a)),
            StandardGate::CU3(a, b, c) => StandardGate::CU3(f(a), f(b), f(c)),
            _ => self.clone(),
        }
    }
}

/// A gate whose meaning is given by a decomposition rule in the gate library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeGate {
    /// The name of the gate.
    pub name: String,
    /// The number of qubits it operates on.
    pub num_qubits: u32,
    /// Parameters of the gate.
    pub params: Vec<P>,
    /// Set when this is the adjoint of the named gate.
    #[serde(default)]
    pub adjoint: bool,
}

impl CompositeGate {
    /// Create a new composite gate.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            params: vec![],
            adjoint: false,
        }
    }

    /// Add parameters to the gate.
    #[must_use]
    pub fn with_params(mut self, params: Vec<P>) -> Self {
        self.params = params;
        self
    }
}

/// A gate, either from the standard set or a library composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// A standard gate.
    Standard(StandardGate),
    /// A composite gate.
    Composite(CompositeGate),
}

impl Gate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            Gate::Standard(g) => g.name(),
            Gate::Composite(g) => &g.name,
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            Gate::Standard(g) => g.num_qubits(),
            Gate::Composite(g) => g.num_qubits,
        }
    }

    /// Get the parameter vector.
    pub fn parameters(&self) -> Vec<&P> {
        match self {
            Gate::Standard(g) => g.parameters(),
            Gate::Composite(g) => g.params.iter().collect(),
        }
    }

    /// Whether the gate is its own inverse.
    pub fn is_self_inverse(&self) -> bool {
        match self {
            Gate::Standard(g) => g.is_self_inverse(),
            Gate::Composite(_) => false,
        }
    }

    /// Whether this is the adjoint form of a composite gate.
    pub fn is_adjoint(&self) -> bool {
        matches!(self, Gate::Composite(g) if g.adjoint)
    }

    /// Rewrite every parameter through `f`.
    #[must_use]
    pub fn map_params(&self, f: &dyn Fn(&P) -> P) -> Self {
        match self {
            Gate::Standard(g) => Gate::Standard(g.map_params(f)),
            Gate::Composite(g) => Gate::Composite(CompositeGate {
                params: g.params.iter().map(f).collect(),
                ..g.clone()
            }),
        }
    }

    /// The adjoint gate.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Gate::Standard(g) => Gate::Standard(g.inverse()),
            Gate::Composite(g) => Gate::Composite(CompositeGate {
                adjoint: !g.adjoint,
                ..g.clone()
            }),
        }
    }
}

/// Renders `name(params)`, with an `inv @ ` prefix for an adjoint composite.
impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_adjoint() {
            write!(f, "inv @ ")?;
        }
        write!(f, "{}", self.name())?;
        let params = self.parameters();
        if !params.is_empty() {
            write!(f, "(")?;
            for (i, p) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::Standard(gate)
    }
}

impl From<CompositeGate> for Gate {
    fn from(gate: CompositeGate) -> Self {
        Gate::Composite(gate)
    }
}

/// Classical condition gating an instruction: `if(register==value)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicalCondition {
    /// The name of the classical register.
    pub register: String,
    /// The value to compare against.
    pub value: u64,
}

impl ClassicalCondition {
    /// Create a new classical condition.
    pub fn new(register: impl Into<String>, value: u64) -> Self {
        Self {
            register: register.into(),
            value,
        }
    }
}

impl fmt::Display for ClassicalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if({}=={})", self.register, self.value)
    }
}
