//! Target basis: the gate names the unroller treats as terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CompileError, CompileResult};

/// Basis used when a circuit config does not name one.
pub const DEFAULT_BASIS: &str = "u1,u2,u3,cx,id";

/// An ordered set of terminal gate names.
///
/// Serialized as its comma-joined config string, e.g. `"u1,u2,u3,cx,id"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Basis {
    gates: Vec<String>,
}

impl Basis {
    /// Create a basis from gate names. Repeated names are kept once.
    pub fn new(gates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut basis = Self { gates: vec![] };
        for gate in gates {
            let gate = gate.into();
            if !basis.contains(&gate) {
                basis.gates.push(gate);
            }
        }
        basis
    }

    /// Read a comma-separated basis string.
    pub fn parse(spec: &str) -> CompileResult<Self> {
        let mut names = Vec::new();
        for name in spec.split(',') {
            let name = name.trim();
            if name.is_empty() {
                return Err(CompileError::InvalidBasis(format!(
                    "empty gate name in '{spec}'"
                )));
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(CompileError::InvalidBasis(format!(
                    "'{name}' is not a gate name"
                )));
            }
            names.push(name);
        }
        Ok(Self::new(names))
    }

    /// Check if a gate is in the basis.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Get the basis gates.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::new(DEFAULT_BASIS.split(','))
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.gates.join(","))
    }
}

impl FromStr for Basis {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Basis {
    type Error = CompileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Basis> for String {
    fn from(basis: Basis) -> Self {
        basis.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_basis() {
        let basis = Basis::default();
        assert_eq!(basis.to_string(), DEFAULT_BASIS);
        assert_eq!(basis.len(), 5);
        assert!(basis.contains("u2"));
        assert!(!basis.contains("h"));
    }

    #[test]
    fn test_parse_trims_and_dedups() {
        let basis = Basis::parse(" u3, cx ,u3").unwrap();
        assert_eq!(basis.gates(), ["u3", "cx"]);
    }

    #[test]
    fn test_parse_rejects_bad_entries() {
        assert!(matches!(Basis::parse(""), Err(CompileError::InvalidBasis(_))));
        assert!(matches!(Basis::parse("u1,,cx"), Err(CompileError::InvalidBasis(_))));
        assert!(matches!(Basis::parse("u1;cx"), Err(CompileError::InvalidBasis(_))));
    }

    #[test]
    fn test_serde_as_string() {
        let basis: Basis = serde_json::from_str("\"u1,cx\"").unwrap();
        assert_eq!(basis, Basis::new(["u1", "cx"]));
        assert_eq!(serde_json::to_string(&basis).unwrap(), "\"u1,cx\"");
        assert!(serde_json::from_str::<Basis>("\"u1,\"").is_err());
    }
}
