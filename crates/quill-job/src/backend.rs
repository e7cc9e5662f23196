//! Backend descriptors.
//!
//! The assembler only needs a backend's name and whether it runs locally:
//! local backends receive the structured payload, remote ones receive text.

use serde::{Deserialize, Serialize};

/// What the assembler needs to know about an execution target.
pub trait BackendInfo: Send + Sync {
    /// Backend name, copied into the Qobj config.
    fn name(&self) -> &str;

    /// Whether circuits are executed in-process.
    fn is_local(&self) -> bool;

    /// Whether the backend is a simulator.
    fn is_simulator(&self) -> bool {
        false
    }
}

/// Static backend description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfiguration {
    pub name: String,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub simulator: bool,
}

impl BackendConfiguration {
    /// An in-process backend.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: true,
            simulator: false,
        }
    }

    /// A backend reached over the network.
    pub fn remote(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: false,
            simulator: false,
        }
    }

    #[must_use]
    pub fn with_simulator(mut self, simulator: bool) -> Self {
        self.simulator = simulator;
        self
    }
}

impl BackendInfo for BackendConfiguration {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_local(&self) -> bool {
        self.local
    }

    fn is_simulator(&self) -> bool {
        self.simulator
    }
}

/// Filter for [`BackendCatalog::available`]. `None` matches anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendFilter {
    pub local: Option<bool>,
    pub simulator: Option<bool>,
}

impl BackendFilter {
    fn matches(&self, backend: &BackendConfiguration) -> bool {
        self.local.is_none_or(|v| v == backend.local)
            && self.simulator.is_none_or(|v| v == backend.simulator)
    }
}

/// A named set of backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendCatalog {
    backends: Vec<BackendConfiguration>,
}

impl BackendCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The in-process simulators shipped with Quill.
    pub fn local_simulators() -> Self {
        let mut catalog = Self::new();
        for name in ["local_qasm_simulator", "local_unitary_simulator"] {
            catalog.register(BackendConfiguration::local(name).with_simulator(true));
        }
        catalog
    }

    /// Add a backend, replacing one with the same name.
    pub fn register(&mut self, backend: BackendConfiguration) {
        match self.backends.iter_mut().find(|b| b.name == backend.name) {
            Some(existing) => *existing = backend,
            None => self.backends.push(backend),
        }
    }

    /// Look up a backend by name.
    pub fn get(&self, name: &str) -> Option<&BackendConfiguration> {
        self.backends.iter().find(|b| b.name == name)
    }

    /// Names of the backends matching `filter`, in registration order.
    pub fn available(&self, filter: BackendFilter) -> Vec<&str> {
        self.backends
            .iter()
            .filter(|b| filter.matches(b))
            .map(|b| b.name.as_str())
            .collect()
    }
}
