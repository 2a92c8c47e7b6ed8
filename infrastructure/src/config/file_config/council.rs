//! Model panel configuration from TOML (`[council]` section)

use council_domain::Model;
use serde::{Deserialize, Serialize};

/// Raw council configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Model names every agent runs against
    pub models: Vec<String>,
    /// Model used when `models` is empty
    pub default_model: Model,
}

impl FileCouncilConfig {
    /// Parsed panel; falls back to `default_model` when none are listed.
    pub fn parse_models(&self) -> Vec<Model> {
        if self.models.is_empty() {
            return vec![self.default_model.clone()];
        }
        self.models
            .iter()
            .map(|name| {
                let Ok(model) = name.trim().parse::<Model>();
                model
            })
            .collect()
    }

    /// Whether any configured name is blank
    pub(super) fn empty_model_name(&self) -> bool {
        self.models.iter().any(|m| m.trim().is_empty()) || self.default_model.as_str().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::FileConfig;
    use super::*;

    #[test]
    fn test_parse_models_falls_back_to_default() {
        let config = FileCouncilConfig {
            models: vec![],
            default_model: Model::ClaudeSonnet45,
        };
        assert_eq!(config.parse_models(), vec![Model::ClaudeSonnet45]);
    }

    #[test]
    fn test_council_section_deserialize() {
        let toml_str = r#"
[council]
models = ["gpt-4o", " claude-sonnet-4.5 ", "local-llama"]
default_model = "gpt-4.1"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.council.parse_models(),
            vec![
                Model::Gpt4o,
                Model::ClaudeSonnet45,
                Model::Custom("local-llama".to_string())
            ]
        );
        assert_eq!(config.council.default_model, Model::Gpt41);
    }
}
