//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file names, checked in order
const PROJECT_FILES: [&str; 2] = ["council.toml", ".council.toml"];

/// Prefix for environment overrides, e.g. `COUNCIL_PIPELINE__TIMEOUT_SECONDS=30`
pub const ENV_PREFIX: &str = "COUNCIL_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `COUNCIL_` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./council.toml` or `./.council.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/review-council/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path.map(PathBuf::as_path),
        )?
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// File layers only; missing optional files are skipped.
    fn figment(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<Figment, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // An explicit path must exist; Toml::file alone would skip it silently
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Box::new(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                ))));
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment)
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/review-council/config.toml if set,
    /// otherwise falls back to ~/.config/review-council/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("review-council").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_in(Path::new("."))
    }

    fn project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for debugging)
    pub fn config_sources() -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];
        lines.push(format!("  [ENV  ] {}* variables", ENV_PREFIX));

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push("  [     ] Project: ./council.toml or ./.council.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("  [{}] Global:  {}", mark, path.display()));
        }

        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::Model;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn extract(figment: Result<Figment, Box<figment::Error>>) -> FileConfig {
        match figment {
            Ok(figment) => figment.extract().unwrap(),
            Err(e) => panic!("figment: {e}"),
        }
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.council.models.is_empty());
        assert_eq!(config.pipeline.max_feedback_rounds, 1);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("review-council"));
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let config = extract(ConfigLoader::figment(Some(&missing), None, None));
        assert_eq!(config.pipeline.timeout_seconds, 120);
    }

    #[test]
    fn test_layers_merge_in_priority_order() {
        let dir = TempDir::new().unwrap();
        let global = write(
            &dir,
            "global.toml",
            r#"
[council]
models = ["gpt-4o"]

[pipeline]
timeout_seconds = 60
max_iterations = 4
"#,
        );
        let project = write(
            &dir,
            "council.toml",
            r#"
[pipeline]
timeout_seconds = 45
"#,
        );
        let explicit = write(
            &dir,
            "explicit.toml",
            r#"
[council]
models = ["claude-sonnet-4.5"]
"#,
        );

        let config = extract(ConfigLoader::figment(
            Some(&global),
            Some(&project),
            Some(&explicit),
        ));
        assert_eq!(config.council.parse_models(), vec![Model::ClaudeSonnet45]);
        assert_eq!(config.pipeline.timeout_seconds, 45);
        assert_eq!(config.pipeline.max_iterations, 4);
        assert_eq!(config.pipeline.max_feedback_rounds, 1);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let Err(err) = ConfigLoader::figment(None, None, Some(&missing)) else {
            panic!("missing explicit config should fail");
        };
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.toml", "[pipeline]\ntimeout_seconds = \"soon\"\n");
        let Ok(figment) = ConfigLoader::figment(None, None, Some(&bad)) else {
            panic!("existing file should be layered");
        };
        let result: Result<FileConfig, _> = figment.extract();
        assert!(result.is_err());
    }

    #[test]
    fn test_project_config_prefers_plain_name() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigLoader::project_config_in(dir.path()).is_none());

        write(&dir, ".council.toml", "");
        let hidden = ConfigLoader::project_config_in(dir.path()).unwrap();
        assert!(hidden.ends_with(".council.toml"));

        write(&dir, "council.toml", "");
        let plain = ConfigLoader::project_config_in(dir.path()).unwrap();
        assert!(plain.ends_with("council.toml"));
        assert!(!plain.to_string_lossy().ends_with(".council.toml"));
    }
}
