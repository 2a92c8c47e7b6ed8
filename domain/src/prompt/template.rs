//! Prompt templates for analysis and self-critique

use crate::analysis::{AnalysisType, SpecializedAnalysis, classify::domain_finding_types};
use crate::core::context::PrContext;
use crate::core::string::truncate;

/// Diff text beyond this many bytes is cut before prompting.
pub const MAX_DIFF_BYTES: usize = 48_000;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for one analysis domain
    pub fn analysis_system(analysis_type: AnalysisType) -> String {
        let focus = match analysis_type {
            AnalysisType::Architectural => {
                "module boundaries, coupling, layering violations, abstractions and API design"
            }
            AnalysisType::Security => {
                "injection, authentication and authorization, secrets handling, input validation and unsafe data flows"
            }
            AnalysisType::Performance => {
                "algorithmic complexity, N+1 queries, blocking I/O, memory growth and caching"
            }
            AnalysisType::Testing => {
                "missing tests, weak assertions, untested edge cases and brittle test design"
            }
        };
        format!(
            r#"You are a senior {} reviewer examining a pull request.
Focus on {}.
Report only problems you can point to in the diff. Cite the code you rely on as evidence.
Answer with a single JSON object and nothing else."#,
            analysis_type.as_str(),
            focus
        )
    }

    /// User prompt asking for a structured analysis of the change
    pub fn analysis_prompt(analysis_type: AnalysisType, context: &PrContext) -> String {
        let types: Vec<&str> = domain_finding_types(analysis_type).collect();
        let mut prompt = format!("Pull request: {}\n", context.title);
        if !context.description.trim().is_empty() {
            prompt.push_str(&format!("\nDescription:\n{}\n", context.description.trim()));
        }
        let files: Vec<&str> = context.file_paths().collect();
        if !files.is_empty() {
            prompt.push_str(&format!("\nChanged files:\n- {}\n", files.join("\n- ")));
        }
        prompt.push_str(&format!(
            "\nDiff:\n```diff\n{}\n```\n",
            truncate(&context.diff_text(), MAX_DIFF_BYTES)
        ));
        prompt.push_str(&format!(
            r#"
Respond with JSON in this shape:
{{
  "analysis": "two or three sentence summary",
  "confidence": 0.0-1.0,
  "findings": [
    {{"id": "f1", "type": "one of: {}", "severity": "low|medium|high|critical",
      "message": "...", "file": "path", "line": 42, "evidence": ["code excerpt"], "confidence": 0.0-1.0}}
  ],
  "recommendations": [
    {{"id": "r1", "priority": "must-fix|should-fix|consider", "category": "...", "description": "...",
      "rationale": "...", "implementation": "concrete steps", "effort": "low|medium|high",
      "confidence": 0.0-1.0, "relatedFindings": ["f1"]}}
  ]
}}"#,
            types.join(", ")
        ));
        prompt
    }

    /// System prompt for the self-critique step
    pub fn critique_system() -> &'static str {
        r#"You are reviewing another reviewer's findings for blind spots.
Be specific. Do not repeat findings that are already reported.
Answer with a single JSON object and nothing else."#
    }

    /// User prompt asking for a critique of one analysis
    pub fn critique_prompt(analysis: &SpecializedAnalysis, context: &PrContext) -> String {
        let mut prompt = format!(
            "Pull request: {}\nAnalysis type: {}\nRisk level: {}\nConfidence: {:.2}\n\nFindings:\n",
            context.title, analysis.analysis_type, analysis.risk_level, analysis.confidence
        );
        if analysis.findings.is_empty() {
            prompt.push_str("(none)\n");
        }
        for f in &analysis.findings {
            prompt.push_str(&format!(
                "- [{}] {} {} at {} (confidence {:.2}, {} evidence item(s)): {}\n",
                f.id,
                f.severity,
                f.finding_type,
                f.location(),
                f.confidence,
                f.evidence.len(),
                f.message
            ));
        }
        prompt.push_str("\nRecommendations:\n");
        if analysis.recommendations.is_empty() {
            prompt.push_str("(none)\n");
        }
        for r in &analysis.recommendations {
            prompt.push_str(&format!(
                "- [{}] {} {}: {} | implementation: {}\n",
                r.id,
                r.effective_priority(),
                r.category,
                r.description,
                if r.implementation.trim().is_empty() {
                    "(none)"
                } else {
                    r.implementation.trim()
                }
            ));
        }
        prompt.push_str(
            r#"
Respond with JSON:
{
  "blindSpots": ["areas the analysis missed"],
  "weakAssumptions": ["claims that need more support"],
  "deeperInvestigation": ["what to check next"],
  "lowConfidenceFindings": ["ids of findings you doubt"],
  "vagueRecommendations": ["ids of recommendations lacking concrete steps"],
  "isComplete": true
}"#,
        );
        prompt
    }
}
