//! Pipeline loop configuration from TOML (`[pipeline]` section)

use council_domain::AnalysisType;
use council_domain::analysis::REFINEMENT_CONFIDENCE_DELTA;
use serde::{Deserialize, Serialize};

/// Raw pipeline configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Timeout in seconds for each LLM call
    pub timeout_seconds: u64,
    /// Upper bound on critique/refine rounds
    pub max_iterations: u32,
    /// Gate-driven feedback rounds after refinement
    pub max_feedback_rounds: u32,
    /// Confidence added per refinement feedback item
    pub confidence_delta: f64,
    /// Enabled agents by name; empty enables all of them
    pub agents: Vec<String>,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            max_iterations: 2,
            max_feedback_rounds: 1,
            confidence_delta: REFINEMENT_CONFIDENCE_DELTA,
            agents: Vec::new(),
        }
    }
}

impl FilePipelineConfig {
    /// Parse agent names, de-duplicated in declaration order.
    pub fn parse_agents(&self) -> Result<Vec<AnalysisType>, String> {
        if self.agents.is_empty() {
            return Ok(AnalysisType::ALL.to_vec());
        }
        let mut parsed = Vec::with_capacity(self.agents.len());
        for name in &self.agents {
            let agent: AnalysisType = name.parse()?;
            if !parsed.contains(&agent) {
                parsed.push(agent);
            }
        }
        Ok(parsed)
    }
}
