//! The Qobj: one submittable job descriptor.

use std::collections::BTreeMap;

use quill_compile::{Basis, StructuredCircuit};
use serde::{Deserialize, Serialize};

use crate::error::{JobError, JobResult};

/// Job descriptor handed to an execution backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qobj {
    pub id: String,
    pub config: QobjConfig,
    pub circuits: Vec<CircuitRecord>,
}

/// Run parameters shared by every circuit of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QobjConfig {
    pub max_credits: u32,
    pub shots: u32,
    pub backend_name: String,
}

/// One circuit of a job.
///
/// Exactly one payload is set, except for deferred jobs where both are empty.
/// Decoding rejects a record carrying both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct CircuitRecord {
    pub name: String,
    pub compiled_circuit: Option<StructuredCircuit>,
    pub compiled_circuit_qasm: Option<String>,
    pub config: CircuitConfig,
}

impl CircuitRecord {
    pub(crate) fn new(name: String, payload: Option<CircuitPayload>, config: CircuitConfig) -> Self {
        let (compiled_circuit, compiled_circuit_qasm) = match payload {
            Some(CircuitPayload::Structured(circuit)) => (Some(circuit), None),
            Some(CircuitPayload::Textual(text)) => (None, Some(text)),
            None => (None, None),
        };
        Self {
            name,
            compiled_circuit,
            compiled_circuit_qasm,
            config,
        }
    }

    /// Whether the payload was left for a later step.
    pub fn is_deferred(&self) -> bool {
        self.compiled_circuit.is_none() && self.compiled_circuit_qasm.is_none()
    }
}

#[derive(Deserialize)]
struct RecordFields {
    name: String,
    compiled_circuit: Option<StructuredCircuit>,
    compiled_circuit_qasm: Option<String>,
    config: CircuitConfig,
}

impl TryFrom<RecordFields> for CircuitRecord {
    type Error = JobError;

    fn try_from(fields: RecordFields) -> Result<Self, Self::Error> {
        if fields.compiled_circuit.is_some() && fields.compiled_circuit_qasm.is_some() {
            return Err(JobError::Validation(format!(
                "circuit '{}' carries both a structured and a textual payload",
                fields.name
            )));
        }
        Ok(Self {
            name: fields.name,
            compiled_circuit: fields.compiled_circuit,
            compiled_circuit_qasm: fields.compiled_circuit_qasm,
            config: fields.config,
        })
    }
}

/// A compiled circuit in one of its two forms.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitPayload {
    /// Structured payload, for local backends.
    Structured(StructuredCircuit),
    /// Circuit text, for remote backends.
    Textual(String),
}

impl From<StructuredCircuit> for CircuitPayload {
    fn from(circuit: StructuredCircuit) -> Self {
        CircuitPayload::Structured(circuit)
    }
}

impl From<String> for CircuitPayload {
    fn from(text: String) -> Self {
        CircuitPayload::Textual(text)
    }
}

/// Per-circuit run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub coupling_map: Option<CouplingMap>,
    pub basis_gates: Basis,
    pub layout: Option<Layout>,
    pub seed: Option<u64>,
}

impl CircuitConfig {
    /// Default config carrying a seed.
    pub fn with_seed(seed: Option<u64>) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            coupling_map: None,
            basis_gates: Basis::default(),
            layout: None,
            seed: None,
        }
    }
}

/// Directed qubit connectivity, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouplingMap(pub Vec<(u32, u32)>);

/// Logical to physical qubit assignment, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout(pub BTreeMap<u32, u32>);

impl Qobj {
    /// Encode as a JSON value.
    pub fn to_json(&self) -> JobResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Encode as pretty-printed JSON text.
    pub fn to_json_string(&self) -> JobResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON text.
    pub fn from_json_str(text: &str) -> JobResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Find a circuit record by name.
    pub fn circuit(&self, name: &str) -> Option<&CircuitRecord> {
        self.circuits.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Qobj {
        let mut config = CircuitConfig::with_seed(Some(7));
        config.coupling_map = Some(CouplingMap(vec![(0, 1), (1, 2)]));
        config.layout = Some(Layout([(0, 2), (1, 0)].into_iter().collect()));
        Qobj {
            id: "qobj-1".into(),
            config: QobjConfig {
                max_credits: 10,
                shots: 1024,
                backend_name: "remote".into(),
            },
            circuits: vec![
                CircuitRecord::new(
                    "text".into(),
                    Some(CircuitPayload::Textual("OPENQASM 2.0;\n".into())),
                    config,
                ),
                CircuitRecord::new("later".into(), None, CircuitConfig::default()),
            ],
        }
    }

    #[test]
    fn test_json_shape() {
        let json = sample().to_json().unwrap();
        assert_eq!(json["id"], "qobj-1");
        assert_eq!(json["config"]["shots"], 1024);
        assert_eq!(json["config"]["max_credits"], 10);
        assert_eq!(json["config"]["backend_name"], "remote");

        let first = &json["circuits"][0];
        assert!(first["compiled_circuit"].is_null());
        assert_eq!(first["compiled_circuit_qasm"], "OPENQASM 2.0;\n");
        assert_eq!(first["config"]["basis_gates"], "u1,u2,u3,cx,id");
        assert_eq!(first["config"]["seed"], 7);
        assert_eq!(first["config"]["coupling_map"][1][0], 1);
        assert_eq!(first["config"]["layout"]["0"], 2);

        let second = &json["circuits"][1];
        assert!(second["compiled_circuit"].is_null());
        assert!(second["compiled_circuit_qasm"].is_null());
        assert!(second["config"]["layout"].is_null());
    }

    #[test]
    fn test_json_text_roundtrip() {
        let qobj = sample();
        let decoded = Qobj::from_json_str(&qobj.to_json_string().unwrap()).unwrap();
        assert_eq!(decoded, qobj);
    }

    #[test]
    fn test_decode_rejects_two_payloads() {
        let mut json = sample().to_json().unwrap();
        let structured = serde_json::json!({
            "header": {
                "name": "one",
                "number_of_qubits": 1,
                "number_of_clbits": 0,
                "qubit_labels": [["q", 0]],
                "clbit_labels": [],
            },
            "operations": [],
        });
        json["circuits"][0]["compiled_circuit"] = structured;
        let err = Qobj::from_json_str(&json.to_string()).unwrap_err();
        assert!(err.to_string().contains("both"));

        json["circuits"][0]["compiled_circuit_qasm"] = serde_json::Value::Null;
        let decoded = Qobj::from_json_str(&json.to_string()).unwrap();
        assert!(decoded.circuits[0].compiled_circuit.is_some());
        assert!(decoded.circuits[0].compiled_circuit_qasm.is_none());
    }

    #[test]
    fn test_record_payload_slots() {
        let qobj = sample();
        assert!(!qobj.circuit("text").unwrap().is_deferred());
        assert!(qobj.circuit("later").unwrap().is_deferred());
        assert!(qobj.circuit("missing").is_none());
    }
}
