//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No analysis agents configured")]
    NoAgents,

    #[error("Invalid review context: {0}")]
    InvalidContext(String),

    #[error("Invalid threshold '{name}': {value} is outside [0, 1]")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::NoAgents.is_cancelled());
        assert!(!DomainError::InvalidContext("empty".to_string()).is_cancelled());
    }

    #[test]
    fn test_invalid_threshold_display() {
        let error = DomainError::InvalidThreshold {
            name: "similarity".to_string(),
            value: 1.5,
        };
        assert_eq!(
            error.to_string(),
            "Invalid threshold 'similarity': 1.5 is outside [0, 1]"
        );
    }
}
