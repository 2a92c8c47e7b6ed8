//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod council;
mod output;
mod pipeline;
mod provider;
mod quality;

pub use council::FileCouncilConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use pipeline::FilePipelineConfig;
pub use provider::FileProviderConfig;
pub use quality::FileQualityConfig;

use council_application::PipelineConfig;
use council_domain::{
    AnalysisType, CrossValidationConfig, DomainError, QualityConfig, RefinementConfig,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("{0}")]
    UnknownAgent(String),

    #[error(transparent)]
    Threshold(#[from] DomainError),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model panel
    pub council: FileCouncilConfig,
    /// Loop bounds, timeouts and enabled agents
    pub pipeline: FilePipelineConfig,
    pub cross_validation: CrossValidationConfig,
    pub quality: FileQualityConfig,
    /// LLM endpoint settings
    pub provider: FileProviderConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.pipeline.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.council.empty_model_name() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        self.pipeline
            .parse_agents()
            .map_err(ConfigValidationError::UnknownAgent)?;
        if !(0.0..=1.0).contains(&self.pipeline.confidence_delta) {
            return Err(DomainError::InvalidThreshold {
                name: "pipeline.confidence_delta".to_string(),
                value: self.pipeline.confidence_delta,
            }
            .into());
        }
        self.cross_validation.validate()?;
        self.quality_config().validate()?;
        Ok(())
    }

    /// Agents enabled by `[pipeline] agents`
    pub fn enabled_agents(&self) -> Result<Vec<AnalysisType>, ConfigValidationError> {
        self.pipeline
            .parse_agents()
            .map_err(ConfigValidationError::UnknownAgent)
    }

    /// Build the application-level pipeline parameters.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let refinement = RefinementConfig {
            max_iterations: self.pipeline.max_iterations,
            confidence_delta: self.pipeline.confidence_delta,
            ..RefinementConfig::default()
        };
        PipelineConfig::default()
            .with_models(self.council.parse_models())
            .with_llm_timeout(Duration::from_secs(self.pipeline.timeout_seconds))
            .with_max_feedback_rounds(self.pipeline.max_feedback_rounds)
            .with_cross_validation(self.cross_validation.clone())
            .with_refinement(refinement)
            .with_quality(self.quality_config())
    }

    fn quality_config(&self) -> QualityConfig {
        QualityConfig {
            thresholds: self.quality.thresholds.clone(),
            weights: self.quality.weights.clone(),
            ..QualityConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::Model;

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.council.models.is_empty());
        assert_eq!(config.pipeline.timeout_seconds, 120);
        assert_eq!(config.pipeline.max_iterations, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[council]
models = ["gpt-4o", "claude-sonnet-4.5"]

[pipeline]
timeout_seconds = 30
max_iterations = 3
max_feedback_rounds = 0
agents = ["security", "testing"]

[cross_validation]
similarity_threshold = 0.6

[provider]
base_url = "http://localhost:11434"
api_key_env = "LOCAL_LLM_KEY"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.enabled_agents().unwrap(),
            vec![AnalysisType::Security, AnalysisType::Testing]
        );

        let pipeline = config.to_pipeline_config();
        assert_eq!(pipeline.models, vec![Model::Gpt4o, Model::ClaudeSonnet45]);
        assert_eq!(pipeline.llm_timeout, Duration::from_secs(30));
        assert_eq!(pipeline.refinement.max_iterations, 3);
        assert_eq!(pipeline.max_feedback_rounds, 0);
        assert_eq!(pipeline.cross_validation.similarity_threshold, 0.6);
        assert_eq!(pipeline.cross_validation.confidence_conflict_threshold, 0.3);
        assert_eq!(config.provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_validate_timeout_zero() {
        let mut config = FileConfig::default();
        config.pipeline.timeout_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_validate_empty_model_name() {
        let mut config = FileConfig::default();
        config.council.models = vec!["gpt-4o".to_string(), "  ".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyModelName)
        ));
    }

    #[test]
    fn test_validate_threshold_out_of_range() {
        let mut config = FileConfig::default();
        config.quality.thresholds.evidence = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigValidationError::Threshold(_)));
        assert!(err.to_string().contains("thresholds.evidence"));

        let mut config = FileConfig::default();
        config.cross_validation.similarity_threshold = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::Threshold(_))
        ));
    }

    #[test]
    fn test_validate_unknown_agent() {
        let mut config = FileConfig::default();
        config.pipeline.agents = vec!["vibes".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::UnknownAgent(_))
        ));
    }
}
