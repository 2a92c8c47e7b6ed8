//! Analysis plugin port
//!
//! Plugins are cheap heuristic scanners (regex rules, linters) that run next
//! to the LLM agents. Their findings join the consensus as auxiliary
//! findings; they never take part in cross-validation.

use async_trait::async_trait;
use council_domain::PluginFinding;
use thiserror::Error;

/// One chunk of the change handed to a plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInput {
    pub file_path: String,
    pub chunk_content: String,
}

/// Findings reported for one chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginOutput {
    pub findings: Vec<PluginFinding>,
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin {plugin} failed: {message}")]
    Failed { plugin: String, message: String },
}

/// A heuristic scanner
#[async_trait]
pub trait AnalysisPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, input: PluginInput) -> Result<PluginOutput, PluginError>;
}
