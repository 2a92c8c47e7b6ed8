//! Auxiliary findings produced by heuristic plugins.

use super::finding::{Finding, Severity};
use serde::{Deserialize, Serialize};

/// Confidence given to plugin findings that do not state one.
pub const DEFAULT_PLUGIN_CONFIDENCE: f64 = 0.6;

/// Finding reported by a plugin, before it joins the shared finding model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginFinding {
    pub plugin: String,
    pub rule: String,
    pub message: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl PluginFinding {
    /// Convert into a [`Finding`] located in `file_path`.
    ///
    /// `index` keeps ids unique when a plugin reports the same rule twice.
    pub fn into_finding(self, file_path: &str, index: usize) -> Finding {
        let severity = self
            .severity
            .as_deref()
            .and_then(Severity::parse_lenient)
            .unwrap_or(Severity::Low);
        let mut finding = Finding::new(
            format!("plugin-{}-{}-{}", self.plugin, self.rule, index),
            self.rule,
            severity,
            self.message,
        )
        .at(file_path, self.line)
        .with_confidence(self.confidence.unwrap_or(DEFAULT_PLUGIN_CONFIDENCE));
        if let Some(snippet) = self.snippet.filter(|s| !s.trim().is_empty()) {
            finding = finding.with_evidence(snippet);
        }
        finding
    }
}
