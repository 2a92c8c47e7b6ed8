//! Configuration file loading
//!
//! [`ConfigLoader`] merges defaults, the global and project TOML files, an
//! explicit `--config` path and `COUNCIL_` environment variables into a
//! [`FileConfig`], which converts into the application's `PipelineConfig`.

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileCouncilConfig, FileOutputConfig, FileOutputFormat,
    FilePipelineConfig, FileProviderConfig, FileQualityConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
