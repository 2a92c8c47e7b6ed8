//! Quality gate thresholds and score weights.

use crate::analysis::AnalysisType;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Minimum score each dimension must reach for the gate to pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub completeness: f64,
    pub consistency: f64,
    pub actionability: f64,
    pub evidence: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            completeness: 0.7,
            consistency: 0.7,
            actionability: 0.7,
            evidence: 0.6,
        }
    }
}

/// Weights of the overall score; they are not required to sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub completeness: f64,
    pub consistency: f64,
    pub actionability: f64,
    pub evidence: f64,
    pub confidence: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.25,
            consistency: 0.20,
            actionability: 0.25,
            evidence: 0.15,
            confidence: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub thresholds: QualityThresholds,
    pub weights: QualityWeights,
    /// Analysis types a complete review covers
    pub expected_types: Vec<AnalysisType>,
    /// Implementation text at least this long counts as actionable
    pub min_implementation_chars: usize,
    /// Evidence items a critical finding needs to avoid the penalty
    pub critical_evidence_min: usize,
    /// Evidence-score multiplier per under-evidenced critical finding
    pub critical_evidence_penalty: f64,
    /// Lowest value the accumulated multiplier can reach
    pub critical_penalty_floor: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            thresholds: QualityThresholds::default(),
            weights: QualityWeights::default(),
            expected_types: AnalysisType::ALL.to_vec(),
            min_implementation_chars: 20,
            critical_evidence_min: 2,
            critical_evidence_penalty: 0.8,
            critical_penalty_floor: 0.5,
        }
    }
}

impl QualityConfig {
    pub fn with_expected_types(mut self, types: Vec<AnalysisType>) -> Self {
        self.expected_types = types;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let t = &self.thresholds;
        for (name, value) in [
            ("thresholds.completeness", t.completeness),
            ("thresholds.consistency", t.consistency),
            ("thresholds.actionability", t.actionability),
            ("thresholds.evidence", t.evidence),
            ("critical_evidence_penalty", self.critical_evidence_penalty),
            ("critical_penalty_floor", self.critical_penalty_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        let w = &self.weights;
        for (name, value) in [
            ("weights.completeness", w.completeness),
            ("weights.consistency", w.consistency),
            ("weights.actionability", w.actionability),
            ("weights.evidence", w.evidence),
            ("weights.confidence", w.confidence),
        ] {
            if value < 0.0 {
                return Err(DomainError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}
