//! Parsing model output into the analysis model.
//!
//! Pure text handling, no I/O. Structured JSON is preferred; when the model
//! ignores the format the response is mined line by line instead.
//!
//! | Function | Input | Fallback |
//! |----------|-------|----------|
//! | [`parse_analysis`] | Analysis response | Keyword line extraction |
//! | [`parse_critique`] | Self-critique response | `None` (caller uses an empty critique) |
//! | [`extract_json`] | Any response | `None` |

use crate::analysis::{AnalysisType, Effort, Finding, Priority, Recommendation, Severity};
use crate::refinement::Critique;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Confidence of findings and recommendations mined from free text.
pub const HEURISTIC_CONFIDENCE: f64 = 0.4;
/// Confidence assumed when a structured response omits one.
pub const DEFAULT_RESPONSE_CONFIDENCE: f64 = 0.5;

const FINDING_KEYWORDS: [&str; 5] = ["issue", "problem", "concern", "warning", "error"];
const RECOMMENDATION_KEYWORDS: [&str; 4] = ["recommend", "suggest", "should", "consider"];

/// Structured result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmAnalysis {
    /// Free-text summary
    pub analysis: String,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub confidence: f64,
    /// `true` when the response was mined heuristically rather than parsed
    #[serde(default)]
    pub heuristic: bool,
}

/// Parse an analysis response.
///
/// Returns `None` only for a blank response; anything else yields at least
/// a summary.
pub fn parse_analysis(response: &str, analysis_type: AnalysisType) -> Option<LlmAnalysis> {
    if response.trim().is_empty() {
        return None;
    }
    if let Some(json) = extract_json(response)
        && let Some(parsed) = parse_analysis_json(&json, analysis_type)
    {
        return Some(parsed);
    }
    Some(extract_heuristically(response, analysis_type))
}

/// Find a JSON object in a response.
///
/// Tries, in order: a ` ```json ` (or bare ` ``` `) fenced block, the whole
/// response, and the span from the first `{` to the last `}`.
pub fn extract_json(response: &str) -> Option<Value> {
    let mut in_block = false;
    let mut block = String::new();
    for line in response.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```json" || trimmed == "```") {
            in_block = true;
            block.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            if let Ok(value) = serde_json::from_str::<Value>(&block)
                && value.is_object()
            {
                return Some(value);
            }
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    if let Ok(value) = serde_json::from_str::<Value>(response.trim())
        && value.is_object()
    {
        return Some(value);
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&response[start..=end])
        .ok()
        .filter(Value::is_object)
}

/// Non-empty string, or a number rendered as one.
fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First present key among `keys`, as a string.
fn field(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(json_string))
}

fn number(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| {
        let v = obj.get(*k)?;
        v.as_f64()
            .or_else(|| v.as_str()?.trim().parse().ok())
            .filter(|n: &f64| n.is_finite())
    })
}

fn strings(obj: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .map(|v| match v {
            Value::Array(items) => items.iter().filter_map(json_string).collect(),
            other => json_string(other).into_iter().collect(),
        })
        .unwrap_or_default()
}

/// Parse the documented analysis JSON schema.
///
/// ```json
/// {
///   "analysis": "summary",
///   "confidence": 0.8,
///   "findings": [{"id", "type", "severity", "message", "file", "line", "evidence", "confidence"}],
///   "recommendations": [{"id", "priority", "category", "description", "rationale",
///                        "implementation", "effort", "confidence", "relatedFindings"}]
/// }
/// ```
///
/// Returns `None` when the object has neither findings nor recommendations
/// arrays, so prose that merely contains braces falls through to heuristics.
pub fn parse_analysis_json(json: &Value, analysis_type: AnalysisType) -> Option<LlmAnalysis> {
    let raw_findings = json.get("findings").and_then(Value::as_array);
    let raw_recs = json.get("recommendations").and_then(Value::as_array);
    if raw_findings.is_none() && raw_recs.is_none() {
        return None;
    }
    let prefix = analysis_type.as_str();

    let findings: Vec<Finding> = raw_findings
        .into_iter()
        .flatten()
        .enumerate()
        .filter_map(|(i, f)| {
            let message = field(f, &["message", "description", "title"])?;
            let id = field(f, &["id"]).unwrap_or_else(|| format!("{}-f{}", prefix, i + 1));
            let finding_type = field(f, &["type", "category"]).unwrap_or_else(|| "general".to_string());
            let severity = field(f, &["severity"])
                .and_then(|s| Severity::parse_lenient(&s))
                .unwrap_or_default();
            let mut finding = Finding::new(id, finding_type, severity, message)
                .with_confidence(number(f, &["confidence"]).unwrap_or(DEFAULT_RESPONSE_CONFIDENCE));
            if let Some(file) = field(f, &["file", "filePath", "file_path"]) {
                let line = number(f, &["line", "lineNumber", "line_number"])
                    .filter(|n| *n >= 1.0)
                    .map(|n| n as u32);
                finding = finding.at(file, line);
            }
            for e in strings(f, &["evidence"]) {
                finding = finding.with_evidence(e);
            }
            Some(finding)
        })
        .collect();

    let recommendations: Vec<Recommendation> = raw_recs
        .into_iter()
        .flatten()
        .enumerate()
        .filter_map(|(i, r)| {
            let description = field(r, &["description", "title", "recommendation"])?;
            let id = field(r, &["id"]).unwrap_or_else(|| format!("{}-r{}", prefix, i + 1));
            let category = field(r, &["category", "type"]).unwrap_or_else(|| prefix.to_string());
            let mut rec = Recommendation::new(id, Priority::default(), category, description)
                .with_priority(field(r, &["priority"]).and_then(|p| Priority::parse_lenient(&p)))
                .with_effort(field(r, &["effort"]).and_then(|e| Effort::parse_lenient(&e)))
                .with_rationale(field(r, &["rationale", "reason"]).unwrap_or_default())
                .with_implementation(field(r, &["implementation", "fix"]).unwrap_or_default())
                .with_confidence(number(r, &["confidence"]).unwrap_or(DEFAULT_RESPONSE_CONFIDENCE));
            for id in strings(r, &["relatedFindings", "related_findings"]) {
                rec = rec.related_to(id);
            }
            Some(rec)
        })
        .collect();

    let confidence = number(json, &["confidence"]).unwrap_or_else(|| {
        if findings.is_empty() {
            DEFAULT_RESPONSE_CONFIDENCE
        } else {
            findings.iter().map(|f| f.confidence).sum::<f64>() / findings.len() as f64
        }
    });

    Some(LlmAnalysis {
        analysis: field(json, &["analysis", "summary"]).unwrap_or_default(),
        findings,
        recommendations,
        confidence: confidence.clamp(0.0, 1.0),
        heuristic: false,
    })
}

fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();
    let trimmed = trimmed.trim_start_matches(['-', '*', '•', '#', '>']).trim_start();
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }
    trimmed
}

fn contains_word(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Mine findings and recommendations from free text.
///
/// Lines mentioning an issue keyword become low-severity findings; other
/// lines mentioning a recommendation keyword become `consider`
/// recommendations. Both carry [`HEURISTIC_CONFIDENCE`].
pub fn extract_heuristically(response: &str, analysis_type: AnalysisType) -> LlmAnalysis {
    let prefix = analysis_type.as_str();
    let mut findings = Vec::new();
    let mut recommendations = Vec::new();

    for line in response.lines() {
        let text = strip_list_marker(line);
        if text.is_empty() {
            continue;
        }
        if contains_word(text, &FINDING_KEYWORDS) {
            findings.push(
                Finding::new(
                    format!("{}-h{}", prefix, findings.len() + 1),
                    "general",
                    Severity::Low,
                    text,
                )
                .with_confidence(HEURISTIC_CONFIDENCE),
            );
        } else if contains_word(text, &RECOMMENDATION_KEYWORDS) {
            recommendations.push(
                Recommendation::new(
                    format!("{}-hr{}", prefix, recommendations.len() + 1),
                    Priority::Consider,
                    prefix,
                    text,
                )
                .with_confidence(HEURISTIC_CONFIDENCE),
            );
        }
    }

    LlmAnalysis {
        analysis: response.trim().to_string(),
        findings,
        recommendations,
        confidence: HEURISTIC_CONFIDENCE,
        heuristic: true,
    }
}

/// Parse a self-critique response; `None` when it holds no critique JSON.
pub fn parse_critique(response: &str) -> Option<Critique> {
    let json = extract_json(response)?;
    let critique = Critique {
        blind_spots: strings(&json, &["blindSpots", "blind_spots"]),
        weak_assumptions: strings(&json, &["weakAssumptions", "weak_assumptions"]),
        deeper_investigation: strings(&json, &["deeperInvestigation", "deeper_investigation"]),
        low_confidence_findings: strings(&json, &["lowConfidenceFindings", "low_confidence_findings"]),
        vague_recommendations: strings(&json, &["vagueRecommendations", "vague_recommendations"]),
        is_complete: ["isComplete", "is_complete"]
            .iter()
            .find_map(|k| json.get(*k).and_then(Value::as_bool))
            .unwrap_or(false),
    };
    let recognized = [
        "blindSpots",
        "blind_spots",
        "weakAssumptions",
        "weak_assumptions",
        "deeperInvestigation",
        "deeper_investigation",
        "isComplete",
        "is_complete",
    ]
    .iter()
    .any(|k| json.get(*k).is_some());
    recognized.then_some(critique)
}
