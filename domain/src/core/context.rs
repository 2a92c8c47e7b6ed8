//! Review context value object
//!
//! The context is produced outside the council (repository cloning and diff
//! extraction are not its job) and handed in as plain data.

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// A single file touched by the change under review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative path
    pub path: String,
    /// Unified diff hunk(s) for this file
    #[serde(default)]
    pub patch: String,
    #[serde(default)]
    pub additions: usize,
    #[serde(default)]
    pub deletions: usize,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, patch: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            patch: patch.into(),
            additions: 0,
            deletions: 0,
        }
    }
}

/// Pull request context handed to every analysis agent (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrContext {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<ChangedFile>,
    /// Full diff, when the caller has one instead of per-file patches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl PrContext {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            files: Vec::new(),
            diff: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_file(mut self, file: ChangedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        self.diff = Some(diff.into());
        self
    }

    /// Reject contexts the agents cannot meaningfully analyze.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::InvalidContext("title is empty".to_string()));
        }
        let has_diff = self.diff.as_deref().is_some_and(|d| !d.trim().is_empty());
        if self.files.is_empty() && !has_diff {
            return Err(DomainError::InvalidContext(
                "context has neither changed files nor a diff".to_string(),
            ));
        }
        if let Some(file) = self.files.iter().find(|f| f.path.trim().is_empty()) {
            return Err(DomainError::InvalidContext(format!(
                "changed file with empty path ({} additions)",
                file.additions
            )));
        }
        Ok(())
    }

    /// Paths of all changed files
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    /// Render the change as a single diff text for prompting.
    pub fn diff_text(&self) -> String {
        if let Some(diff) = &self.diff {
            return diff.clone();
        }
        self.files
            .iter()
            .map(|f| format!("--- {}\n{}", f.path, f.patch))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
