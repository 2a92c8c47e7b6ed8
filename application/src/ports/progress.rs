//! Progress notification port
//!
//! Defines the interface for reporting progress while a review runs.

use council_domain::{AnalysisType, Model, QualityValidation, RefinementRound};

/// Coarse stages of one review run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Analysis,
    Plugins,
    CrossValidation,
    Refinement,
    QualityGates,
    Feedback,
    Repair,
}

impl PipelineStage {
    pub fn as_str(&self) -> &str {
        match self {
            PipelineStage::Analysis => "analysis",
            PipelineStage::Plugins => "plugins",
            PipelineStage::CrossValidation => "cross_validation",
            PipelineStage::Refinement => "refinement",
            PipelineStage::QualityGates => "quality_gates",
            PipelineStage::Feedback => "feedback",
            PipelineStage::Repair => "repair",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            PipelineStage::Analysis => "Agent Analysis",
            PipelineStage::Plugins => "Plugin Scan",
            PipelineStage::CrossValidation => "Cross-Validation",
            PipelineStage::Refinement => "Iterative Refinement",
            PipelineStage::QualityGates => "Quality Gates",
            PipelineStage::Feedback => "Feedback Round",
            PipelineStage::Repair => "Standards Repair",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Callback for progress updates during a review
///
/// Implementations live in the presentation layer.
pub trait PipelineProgressNotifier: Send + Sync {
    /// Called when a stage starts; `total_tasks` is 0 when unknown
    fn on_stage_start(&self, stage: PipelineStage, total_tasks: usize);

    /// Called when one agent × model call finishes
    fn on_agent_complete(&self, agent: AnalysisType, model: &Model, fallback: bool);

    /// Called when a stage completes
    fn on_stage_complete(&self, stage: PipelineStage);

    fn on_refinement_round(&self, _round: &RefinementRound) {}

    fn on_gate_result(&self, _validation: &QualityValidation) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl PipelineProgressNotifier for NoProgress {
    fn on_stage_start(&self, _stage: PipelineStage, _total_tasks: usize) {}
    fn on_agent_complete(&self, _agent: AnalysisType, _model: &Model, _fallback: bool) {}
    fn on_stage_complete(&self, _stage: PipelineStage) {}
}
