//! Application-level configuration.
//!
//! - [`PipelineConfig`]: models, timeouts and loop bounds for one review,
//!   plus the domain tunables it hands to the validator, engine and gates

pub mod pipeline_config;

pub use pipeline_config::PipelineConfig;
