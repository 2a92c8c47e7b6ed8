//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: LLM models that back the analysis agents
//! - [`context::PrContext`]: the change under review
//! - [`error::DomainError`]: domain-level errors

pub mod context;
pub mod error;
pub mod model;
pub mod string;
