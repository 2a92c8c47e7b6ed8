//! Output formatter trait

use council_application::ReviewOutput;

/// Trait for formatting review results
pub trait OutputFormatter {
    /// Format the verdict, consensus and per-agent summary
    fn format(&self, output: &ReviewOutput) -> String;

    /// Format as JSON
    fn format_json(&self, output: &ReviewOutput) -> String;
}
