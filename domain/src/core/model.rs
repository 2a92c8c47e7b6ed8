//! Model value object representing the LLM behind an analysis

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// LLM models known to the council (Value Object)
///
/// Every [`AgentResult`](crate::analysis::AgentResult) records which model
/// produced it, so that multi-model runs can be cross-validated per model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    Gpt4o,
    Gpt4oMini,
    Gpt41,
    ClaudeSonnet45,
    ClaudeHaiku45,
    /// Any other model identifier accepted by the provider
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt4o => "gpt-4o",
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Gpt41 => "gpt-4.1",
            Model::ClaudeSonnet45 => "claude-sonnet-4.5",
            Model::ClaudeHaiku45 => "claude-haiku-4.5",
            Model::Custom(s) => s,
        }
    }

    /// Default panel used when no models are configured
    pub fn default_models() -> Vec<Model> {
        vec![Model::Gpt4o]
    }

    /// Short family name, e.g. "gpt" or "claude"
    pub fn family(&self) -> &str {
        self.as_str().split(['-', '_']).next().unwrap_or(self.as_str())
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::Gpt4o
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "gpt-4o" => Model::Gpt4o,
            "gpt-4o-mini" => Model::Gpt4oMini,
            "gpt-4.1" => Model::Gpt41,
            "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-haiku-4.5" => Model::ClaudeHaiku45,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(model) = s.parse::<Model>();
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_model() {
        let model: Model = "local-llama-3".parse().unwrap();
        assert_eq!(model, Model::Custom("local-llama-3".to_string()));
        assert_eq!(model.to_string(), "local-llama-3");
    }

    #[test]
    fn test_known_model_parses_to_variant() {
        let model: Model = "claude-sonnet-4.5".parse().unwrap();
        assert_eq!(model, Model::ClaudeSonnet45);
        assert_eq!(model.family(), "claude");
    }

    #[test]
    fn test_model_serde_as_string() {
        let json = serde_json::to_string(&Model::Gpt4oMini).unwrap();
        assert_eq!(json, "\"gpt-4o-mini\"");
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Model::Gpt4oMini);
    }
}
