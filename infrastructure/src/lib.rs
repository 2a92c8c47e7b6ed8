//! Infrastructure layer for review-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration file loading.

pub mod config;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileCouncilConfig, FileOutputConfig,
    FileOutputFormat, FilePipelineConfig, FileProviderConfig, FileQualityConfig,
};
pub use providers::{OpenAiCompatibleGateway, OpenAiSession};
