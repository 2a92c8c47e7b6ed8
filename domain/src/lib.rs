//! Domain layer for review-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A review council runs several specialized agents over one change and
//! reconciles what they report:
//!
//! - **Analysis**: each agent returns findings and recommendations for one
//!   domain (architectural, security, performance, testing)
//! - **Cross-validation**: every pair of results is compared for agreement
//!   and conflicts, and the union becomes the consensus
//! - **Quality gates**: the consensus is scored on four dimensions and
//!   either accepted or sent back for refinement
//!
//! Everything here is pure and synchronous. LLM calls, concurrency and
//! timeouts live in the application layer.

pub mod analysis;
pub mod comparison;
pub mod core;
pub mod parsing;
pub mod prompt;
pub mod quality;
pub mod refinement;

// Re-export commonly used types
pub use analysis::{
    AgentResult, AgentValidation, AnalysisType, Effort, FALLBACK_CONFIDENCE, Feedback, Finding,
    PluginFinding, Priority, Recommendation, RiskLevel, Severity, SpecializedAnalysis,
    apply_feedback, validate_analysis,
};
pub use comparison::{
    ComparisonResult, ConflictType, ConsensusAnalysis, CrossValidationConfig, CrossValidator,
    PairwiseComparison,
};
pub use core::{
    context::{ChangedFile, PrContext},
    error::DomainError,
    model::Model,
};
pub use parsing::{LlmAnalysis, parse_analysis, parse_critique};
pub use prompt::PromptTemplate;
pub use quality::{
    QualityConfig, QualityDimension, QualityGates, QualityThresholds, QualityValidation,
    QualityWeights,
};
pub use refinement::{
    Critique, RefinedAnalysisResult, RefinementConfig, RefinementPhase, RefinementRound,
};
