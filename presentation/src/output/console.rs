//! Console output formatter for review results

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use council_application::ReviewOutput;
use council_domain::analysis::BROAD_SCOPE;
use council_domain::quality::RuleSeverity;
use council_domain::{Finding, Priority, QualityDimension, Recommendation, RiskLevel, Severity};

/// Formats review results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete review output
    pub fn format(output: &ReviewOutput) -> String {
        let mut text = String::new();

        text.push_str(&Self::header("Review Council Results"));
        text.push('\n');

        text.push_str(&Self::verdict(output));

        // Quality gates
        text.push_str(&Self::section_header("Quality Gates"));
        let scores = output.validation.scores();
        for dimension in QualityDimension::ALL {
            text.push_str(&format!(
                "  {:<14} {}\n",
                dimension.to_string(),
                Self::score(scores.get(dimension))
            ));
        }
        text.push_str(&format!(
            "  {:<14} {}\n",
            "overall",
            Self::score(output.validation.overall_score)
        ));
        for violation in &output.validation.violations {
            let mark = match violation.severity {
                RuleSeverity::Error => "x".red(),
                RuleSeverity::Warning => "!".yellow(),
            };
            text.push_str(&format!(
                "  {} {}: {}\n",
                mark, violation.rule, violation.message
            ));
        }
        for improvement in &output.validation.improvements {
            text.push_str(&format!(
                "  {} {}: {}\n",
                "->".cyan(),
                improvement.dimension,
                improvement.description
            ));
        }

        // Agents
        text.push_str(&Self::section_header("Agents"));
        for result in &output.analyses {
            let label = if result.analysis.is_fallback() {
                result.label().as_str().red().bold()
            } else {
                result.label().as_str().yellow().bold()
            };
            text.push_str(&format!(
                "\n{} {} risk, confidence {:.2}, {} finding(s)\n",
                label,
                Self::risk(result.analysis.risk_level),
                result.confidence(),
                result.analysis.findings.len()
            ));
            if !result.analysis.summary.is_empty() {
                text.push_str(&Self::indent(&result.analysis.summary, "  "));
                text.push('\n');
            }
        }

        // Consensus findings
        let consensus = &output.consensus;
        text.push_str(&Self::section_header(&format!(
            "Consensus Findings ({})",
            consensus.findings.len()
        )));
        if consensus.findings.is_empty() {
            text.push_str(&format!("  {}\n", "No findings".dimmed()));
        }
        for finding in &consensus.findings {
            text.push_str(&Self::finding(finding));
        }

        // Recommendations
        if !consensus.recommendations.is_empty() {
            text.push_str(&Self::section_header(&format!(
                "Recommendations ({})",
                consensus.recommendations.len()
            )));
            for rec in &consensus.recommendations {
                text.push_str(&Self::recommendation(rec));
            }
        }

        text.push_str(&format!(
            "\n{} {} refinement round(s), {} feedback round(s){}\n",
            "Process:".dimmed(),
            output.rounds.len(),
            output.feedback_rounds,
            if output.repaired {
                ", standards repair applied"
            } else {
                ""
            }
        ));

        text.push_str(&Self::footer());
        text
    }

    /// Format as JSON
    pub fn format_json(output: &ReviewOutput) -> String {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    }

    fn verdict(output: &ReviewOutput) -> String {
        let status = if output.passed() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };
        format!(
            "{} {}   {} {}   {} {:.2}   {} {:.2}\n",
            "Gates:".cyan().bold(),
            status,
            "Risk:".cyan().bold(),
            Self::risk(output.consensus.risk_level),
            "Confidence:".cyan().bold(),
            output.consensus.confidence,
            "Agreement:".cyan().bold(),
            output.consensus.agreement_score
        )
    }

    fn finding(finding: &Finding) -> String {
        let location = match (finding.file.as_str(), finding.line) {
            (BROAD_SCOPE, _) => "(whole change)".to_string(),
            (file, Some(line)) => format!("{}:{}", file, line),
            (file, None) => file.to_string(),
        };
        let mut text = format!(
            "  {} {} {}\n    {}\n",
            Self::severity(finding.severity),
            finding.finding_type.as_str().bold(),
            location.as_str().dimmed(),
            finding.message
        );
        for evidence in &finding.evidence {
            text.push_str(&format!("    {} {}\n", "|".dimmed(), evidence));
        }
        text
    }

    fn recommendation(rec: &Recommendation) -> String {
        let priority = match rec.effective_priority() {
            Priority::MustFix => rec.effective_priority().as_str().red().bold(),
            Priority::ShouldFix => rec.effective_priority().as_str().yellow(),
            Priority::Consider => rec.effective_priority().as_str().normal(),
        };
        let mut text = format!("  * [{}] {}\n", priority, rec.description);
        if !rec.implementation.is_empty() {
            text.push_str(&Self::indent(&rec.implementation, "      "));
            text.push('\n');
        }
        text
    }

    fn severity(severity: Severity) -> ColoredString {
        let label = format!("[{}]", severity.as_str().to_uppercase());
        match severity {
            Severity::Critical => label.as_str().red().bold(),
            Severity::High => label.as_str().red(),
            Severity::Medium => label.as_str().yellow(),
            Severity::Low => label.as_str().normal(),
        }
    }

    fn risk(risk: RiskLevel) -> ColoredString {
        match risk {
            RiskLevel::Critical | RiskLevel::High => risk.as_str().red().bold(),
            RiskLevel::Medium => risk.as_str().yellow(),
            _ => risk.as_str().green(),
        }
    }

    fn score(score: f64) -> ColoredString {
        let text = format!("{:.2}", score);
        if score >= 0.7 {
            text.as_str().green()
        } else if score >= 0.5 {
            text.as_str().yellow()
        } else {
            text.as_str().red()
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, output: &ReviewOutput) -> String {
        Self::format(output)
    }

    fn format_json(&self, output: &ReviewOutput) -> String {
        Self::format_json(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{
        AgentResult, AnalysisType, Model, QualityGates, RefinedAnalysisResult, SpecializedAnalysis,
    };

    fn review_output(analysis: SpecializedAnalysis) -> ReviewOutput {
        let refined = RefinedAnalysisResult::new(vec![AgentResult::new(Model::Gpt4o, analysis)], 1.0);
        let validation = QualityGates::default().validate_results(&refined);
        ReviewOutput {
            validation,
            consensus: refined.consensus,
            analyses: refined.results,
            rounds: refined.rounds,
            auxiliary_findings: Vec::new(),
            feedback_rounds: 0,
            repaired: false,
        }
    }

    fn sql_analysis() -> SpecializedAnalysis {
        let finding = Finding::new(
            "security-f1",
            "injection-vulnerability",
            Severity::Critical,
            "User input concatenated into SQL",
        )
        .at("services/email.js", Some(42))
        .with_evidence("db.query('SELECT ' + req.query.id)");
        let rec = Recommendation::new(
            "security-r1",
            Priority::MustFix,
            "injection-vulnerability",
            "Use parameterized queries",
        )
        .with_implementation("Replace the string concatenation with db.query(sql, [id])")
        .related_to("security-f1");
        SpecializedAnalysis::new(AnalysisType::Security, vec![finding], vec![rec], 0.8)
            .with_summary("One injection issue")
    }

    #[test]
    fn test_format_lists_findings_and_recommendations() {
        let text = ConsoleFormatter::format(&review_output(sql_analysis()));
        assert!(text.contains("Review Council Results"));
        assert!(text.contains("security@gpt-4o"));
        assert!(text.contains("services/email.js:42"));
        assert!(text.contains("User input concatenated into SQL"));
        assert!(text.contains("Use parameterized queries"));
        assert!(text.contains("must-fix"));
        assert!(text.contains("completeness"));
    }

    #[test]
    fn test_format_without_findings() {
        let empty = SpecializedAnalysis::new(AnalysisType::Testing, vec![], vec![], 0.5);
        let text = ConsoleFormatter::format(&review_output(empty));
        assert!(text.contains("No findings"));
        assert!(!text.contains("Recommendations ("));
    }

    #[test]
    fn test_format_json_round_trips_verdict() {
        let output = review_output(sql_analysis());
        let json: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&output)).unwrap();
        assert_eq!(json["validation"]["passes_gates"], output.passed());
        assert_eq!(
            json["consensus"]["findings"][0]["type"],
            "injection-vulnerability"
        );
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}
