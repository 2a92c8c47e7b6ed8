//! Prompt domain
//!
//! Templates for the analysis and self-critique calls. The wording is a
//! working default, not a contract; agents accept a prompt override.

mod template;

pub use template::{MAX_DIFF_BYTES, PromptTemplate};
