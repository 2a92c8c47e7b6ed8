//! Cross-validation of agent results and the consensus built from them.

pub mod config;
pub mod consensus;
pub mod key;
pub mod result;
pub mod similarity;
pub mod validator;

pub use config::CrossValidationConfig;
pub use consensus::ConsensusAnalysis;
pub use key::{FindingKey, RecommendationKey, create_finding_key, create_recommendation_key};
pub use result::{
    ComparisonResult, Conflict, ConflictSeverity, ConflictType, FindingComparison, FindingMatch,
    Insight, InsightKind, RecommendationComparison, RecommendationMatch,
};
pub use validator::{CrossValidator, PairwiseComparison, ValidationMetrics};
