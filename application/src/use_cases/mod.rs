//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod orchestrate;
pub mod refine;
pub mod run_review;
