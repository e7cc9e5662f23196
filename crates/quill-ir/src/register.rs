//! Registers, wires and wire references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat identifier of a qubit within a circuit.
///
/// Qubits are numbered in register declaration order. Inside a decomposition
/// rule the same type names *formal* wires `0..arity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Flat identifier of a classical bit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// Whether a register holds quantum or classical wires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterKind {
    /// Qubits.
    Quantum,
    /// Classical bits.
    Classical,
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterKind::Quantum => write!(f, "quantum"),
            RegisterKind::Classical => write!(f, "classical"),
        }
    }
}

/// A named, fixed-size register.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Register {
    /// Register name, unique per circuit.
    pub name: String,
    /// Number of wires.
    pub size: u32,
    /// Quantum or classical.
    pub kind: RegisterKind,
}

impl Register {
    /// Create a quantum register.
    pub fn quantum(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
            kind: RegisterKind::Quantum,
        }
    }

    /// Create a classical register.
    pub fn classical(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size,
            kind: RegisterKind::Classical,
        }
    }

    /// Reference the wire at `index`.
    pub fn wire(&self, index: u32) -> WireRef {
        WireRef::new(&self.name, index)
    }
}

/// A reference to one wire by register name and index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireRef {
    /// Register name.
    pub register: String,
    /// Index within the register.
    pub index: u32,
}

impl WireRef {
    /// Create a new wire reference.
    pub fn new(register: impl Into<String>, index: u32) -> Self {
        Self {
            register: register.into(),
            index,
        }
    }
}

impl fmt::Display for WireRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

impl<S: Into<String>> From<(S, u32)> for WireRef {
    fn from((register, index): (S, u32)) -> Self {
        WireRef::new(register, index)
    }
}

/// A quantum bit and the register slot it occupies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qubit {
    /// The flat identifier.
    pub id: QubitId,
    /// The name of the register this qubit belongs to.
    pub register: String,
    /// The index within the register.
    pub index: u32,
}

impl Qubit {
    /// Create a qubit with register membership.
    pub fn new(id: QubitId, register: impl Into<String>, index: u32) -> Self {
        Self {
            id,
            register: register.into(),
            index,
        }
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

/// A classical bit and the register slot it occupies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clbit {
    /// The flat identifier.
    pub id: ClbitId,
    /// The name of the register this bit belongs to.
    pub register: String,
    /// The index within the register.
    pub index: u32,
}

impl Clbit {
    /// Create a classical bit with register membership.
    pub fn new(id: ClbitId, register: impl Into<String>, index: u32) -> Self {
        Self {
            id,
            register: register.into(),
            index,
        }
    }
}

impl fmt::Display for Clbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_display() {
        assert_eq!(WireRef::new("qr", 3).to_string(), "qr[3]");
        assert_eq!(Qubit::new(QubitId(4), "q", 1).to_string(), "q[1]");
        assert_eq!(Clbit::new(ClbitId(0), "cr", 0).to_string(), "cr[0]");
    }

    #[test]
    fn test_register_wire() {
        let reg = Register::classical("c", 2);
        assert_eq!(reg.kind, RegisterKind::Classical);
        assert_eq!(reg.wire(1), WireRef::from(("c", 1)));
    }
}
