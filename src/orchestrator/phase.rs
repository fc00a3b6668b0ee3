//! Phase descriptors and implementations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Implementation-defined phase result
pub type PhaseValue = serde_json::Value;

/// Static phase descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: String,
    pub display_name: String,
    pub priority_order: u32,
    pub is_critical: bool,
}

impl Phase {
    /// Create a non-critical phase
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, priority_order: u32) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            priority_order,
            is_critical: false,
        }
    }

    /// Mark the phase as critical
    pub fn critical(mut self) -> Self {
        self.is_critical = true;
        self
    }

    /// Override criticality
    pub fn with_critical(mut self, is_critical: bool) -> Self {
        self.is_critical = is_critical;
        self
    }
}

/// Work performed by one phase
///
/// The orchestrator only looks at success/failure and elapsed time.
#[async_trait]
pub trait PhaseImplementation: Send + Sync {
    async fn run(&self) -> anyhow::Result<PhaseValue>;
}

#[async_trait]
impl<F, Fut> PhaseImplementation for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<PhaseValue>> + Send + 'static,
{
    async fn run(&self) -> anyhow::Result<PhaseValue> {
        (self)().await
    }
}

/// Phase id → implementation
#[derive(Clone, Default)]
pub struct PhaseImplementations {
    entries: HashMap<String, Arc<dyn PhaseImplementation>>,
}

impl PhaseImplementations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the implementation for a phase
    pub fn register(
        mut self,
        phase_id: impl Into<String>,
        implementation: impl PhaseImplementation + 'static,
    ) -> Self {
        self.entries.insert(phase_id.into(), Arc::new(implementation));
        self
    }

    pub fn get(&self, phase_id: &str) -> Option<Arc<dyn PhaseImplementation>> {
        self.entries.get(phase_id).cloned()
    }

    pub fn contains(&self, phase_id: &str) -> bool {
        self.entries.contains_key(phase_id)
    }
}
