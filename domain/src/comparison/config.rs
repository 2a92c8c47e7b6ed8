//! Tunable thresholds for cross-validation.
//!
//! The defaults are starting points, not derived optima; deployments are
//! expected to override them from the config file.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    /// Similarity at or above which two keyed items match
    pub similarity_threshold: f64,
    /// Confidence difference above which a confidence conflict is raised
    pub confidence_conflict_threshold: f64,
    /// Confidence difference at which that conflict becomes `high`
    pub high_confidence_conflict_threshold: f64,
    /// Agreement above which a high-agreement insight is emitted
    pub high_agreement_threshold: f64,
    /// Agreement below which a low-agreement insight is emitted
    pub low_agreement_threshold: f64,
    /// Finding-count ratio above which coverage is imbalanced
    pub coverage_imbalance_ratio: f64,
    /// Lines within which two findings count as near each other
    pub line_proximity: u32,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            confidence_conflict_threshold: 0.3,
            high_confidence_conflict_threshold: 0.5,
            high_agreement_threshold: 0.8,
            low_agreement_threshold: 0.4,
            coverage_imbalance_ratio: 2.0,
            line_proximity: 5,
        }
    }
}

impl CrossValidationConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            (
                "confidence_conflict_threshold",
                self.confidence_conflict_threshold,
            ),
            (
                "high_confidence_conflict_threshold",
                self.high_confidence_conflict_threshold,
            ),
            ("high_agreement_threshold", self.high_agreement_threshold),
            ("low_agreement_threshold", self.low_agreement_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        if self.coverage_imbalance_ratio < 1.0 {
            return Err(DomainError::InvalidThreshold {
                name: "coverage_imbalance_ratio".to_string(),
                value: self.coverage_imbalance_ratio,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(CrossValidationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let config = CrossValidationConfig {
            similarity_threshold: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DomainError::InvalidThreshold { .. })
        ));
    }
}
