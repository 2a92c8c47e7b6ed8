//! Quality gate configuration from TOML (`[quality]` section)

use council_domain::{QualityThresholds, QualityWeights};
use serde::{Deserialize, Serialize};

/// Raw quality configuration from TOML
///
/// Expected analysis types are not configurable here; they follow the
/// agents enabled for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQualityConfig {
    pub thresholds: QualityThresholds,
    pub weights: QualityWeights,
}

#[cfg(test)]
mod tests {
    use super::super::FileConfig;

    #[test]
    fn test_partial_thresholds_keep_defaults() {
        let toml_str = r#"
[quality.thresholds]
evidence = 0.8

[quality.weights]
confidence = 0.0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.quality.thresholds.evidence, 0.8);
        assert_eq!(config.quality.thresholds.completeness, 0.7);
        assert_eq!(config.quality.weights.confidence, 0.0);
        assert_eq!(config.quality.weights.actionability, 0.25);
    }
}
