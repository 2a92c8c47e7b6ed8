//! Finding / Recommendation model shared by every agent.
//!
//! - [`finding`] and [`recommendation`]: immutable value objects
//! - [`specialized`]: one agent's output ([`SpecializedAnalysis`]) and the
//!   model-annotated [`AgentResult`]
//! - [`classify`]: keyword heuristics assigning domain sub-types
//! - [`feedback`]: typed refinement feedback and its application
//! - [`validation`]: rule-based self-validation of an analysis
//! - [`plugin`]: auxiliary findings from heuristic plugins

pub mod classify;
pub mod feedback;
pub mod finding;
pub mod plugin;
pub mod recommendation;
pub mod specialized;
pub mod validation;

pub use classify::{classify_finding, classify_message, is_domain_specific};
pub use feedback::{Feedback, REFINEMENT_CONFIDENCE_DELTA, apply_feedback};
pub use finding::{BROAD_SCOPE, Finding, Severity};
pub use plugin::PluginFinding;
pub use recommendation::{Effort, Priority, Recommendation};
pub use specialized::{
    ANALYSIS_ERROR_TYPE, AgentResult, AnalysisType, FALLBACK_CONFIDENCE, RiskLevel,
    SpecializedAnalysis,
};
pub use validation::{AgentValidation, validate_analysis};
