//! Weighted similarity of two keyed items.

use crate::analysis::{Finding, Recommendation};
use crate::core::string::word_overlap;

const TYPE_WEIGHT: f64 = 0.4;
const FILE_WEIGHT: f64 = 0.3;
const EXACT_LINE_WEIGHT: f64 = 0.2;
const NEAR_LINE_WEIGHT: f64 = 0.1;
const SEVERITY_WEIGHT: f64 = 0.1;

const CATEGORY_WEIGHT: f64 = 0.4;
const PRIORITY_WEIGHT: f64 = 0.3;
const DESCRIPTION_WEIGHT: f64 = 0.3;

/// Type 0.4, file 0.3, line proximity up to 0.2, severity 0.1; capped at 1.0.
///
/// Two findings without a line number are on the same (unknown) line.
pub fn finding_similarity(a: &Finding, b: &Finding, line_proximity: u32) -> f64 {
    let mut score = 0.0;
    if a.finding_type.eq_ignore_ascii_case(&b.finding_type) {
        score += TYPE_WEIGHT;
    }
    if a.file == b.file {
        score += FILE_WEIGHT;
    }
    score += match (a.line, b.line) {
        (None, None) => EXACT_LINE_WEIGHT,
        (Some(x), Some(y)) if x == y => EXACT_LINE_WEIGHT,
        (Some(x), Some(y)) if x.abs_diff(y) <= line_proximity => NEAR_LINE_WEIGHT,
        _ => 0.0,
    };
    if a.severity == b.severity {
        score += SEVERITY_WEIGHT;
    }
    score.min(1.0)
}

/// Category 0.4, priority 0.3, description word overlap scaled to 0.3.
pub fn recommendation_similarity(a: &Recommendation, b: &Recommendation) -> f64 {
    let mut score = 0.0;
    if a.category.eq_ignore_ascii_case(&b.category) {
        score += CATEGORY_WEIGHT;
    }
    if a.effective_priority() == b.effective_priority() {
        score += PRIORITY_WEIGHT;
    }
    score += word_overlap(&a.description, &b.description) * DESCRIPTION_WEIGHT;
    score.min(1.0)
}
