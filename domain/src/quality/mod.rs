//! Quality gates over a refined result set.
//!
//! Four dimension scorers ([`scorers`]), hard and soft rules ([`rules`]),
//! the pass/fail decision and improvement proposals ([`gates`]), and the
//! bounded repairs applied by `ensure_standards` ([`repair`]).

pub mod config;
pub mod gates;
pub mod repair;
pub mod rules;
pub mod scorers;
pub mod types;

pub use config::{QualityConfig, QualityThresholds, QualityWeights};
pub use gates::{QualityGates, gate_passes};
pub use repair::{dedup_findings, repair_analysis};
pub use rules::{RuleSeverity, RuleViolation, ValidationRule, check_rules};
pub use types::{
    DimensionScore, DimensionScores, Improvement, QualityDimension, QualityValidation,
    TargetedFeedback,
};
