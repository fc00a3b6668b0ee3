//! Corpus validator: rule/category validation engine and phase orchestrator
//!
//! Discovers textual artifacts (Markdown, JSON, scripts), runs independent
//! checks grouped into categories, drives the work through retried,
//! criticality-aware phases, and ranks the findings into recommendations.

pub mod aggregator;
pub mod artifacts;
pub mod checks;
pub mod cli;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;
pub mod report;
pub mod validation;

// Re-export the core for convenience
pub use aggregator::{recommend, AggregatedReport, Recommendation};
pub use artifacts::{discover, Artifact, ArtifactKind, ArtifactReader};
pub use config::PipelineConfig;
pub use orchestrator::{OrchestrationError, OrchestrationState, Phase, PhaseOrchestrator};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use validation::{Category, Check, Detail, Metrics, ValidationEngine, ValidationResult};
