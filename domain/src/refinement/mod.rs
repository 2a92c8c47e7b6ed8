//! Iterative refinement domain: session state and feedback derivation.
//!
//! The loop itself lives in the application layer; this module holds the
//! values each round produces and the pure rules that turn a critique into
//! [`Feedback`](crate::analysis::Feedback).

pub mod derive;
pub mod state;

pub use derive::{derive_feedback, evidence_hint, validation_feedback};
pub use state::{
    CONVERGENCE_EPSILON, Critique, RefinedAnalysisResult, RefinementConfig, RefinementPhase,
    RefinementRound,
};
