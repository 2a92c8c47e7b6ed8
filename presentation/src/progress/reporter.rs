//! Progress reporting for review execution

use colored::Colorize;
use council_application::ports::progress::{PipelineProgressNotifier, PipelineStage};
use council_domain::{AnalysisType, Model, QualityValidation, RefinementRound};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during a review with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Print a line above the bars without tearing them
    fn println(&self, line: String) {
        if self.multi.println(&line).is_err() {
            eprintln!("{}", line);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgressNotifier for ProgressReporter {
    fn on_stage_start(&self, stage: PipelineStage, total_tasks: usize) {
        let pb = if total_tasks > 0 {
            let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
            pb.set_style(Self::stage_style());
            pb
        } else {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb
        };
        pb.set_prefix(stage.display_name().to_string());
        pb.set_message("Starting...");

        if let Ok(mut bar) = self.stage_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_agent_complete(&self, agent: AnalysisType, model: &Model, fallback: bool) {
        if let Ok(bar) = self.stage_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            let status = if fallback {
                format!("{} {}@{} (fallback)", "x".red(), agent, model)
            } else {
                format!("{} {}@{}", "v".green(), agent, model)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_stage_complete(&self, stage: PipelineStage) {
        if let Ok(mut bar) = self.stage_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!("{} complete", stage.display_name().green()));
        }
    }

    fn on_refinement_round(&self, round: &RefinementRound) {
        if let Ok(bar) = self.stage_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.inc(1);
        }
        self.println(format!(
            "  {} round {}: {} feedback item(s), score {:.3} -> {:.3}",
            "~".cyan(),
            round.iteration,
            round.feedback_applied,
            round.score_before,
            round.score_after
        ));
    }

    fn on_gate_result(&self, validation: &QualityValidation) {
        let verdict = if validation.passes_gates {
            "pass".green()
        } else {
            "fail".red()
        };
        self.println(format!(
            "  {} gates {} (overall {:.3})",
            "#".cyan(),
            verdict,
            validation.overall_score
        ));
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl PipelineProgressNotifier for SimpleProgress {
    fn on_stage_start(&self, stage: PipelineStage, total_tasks: usize) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            stage.display_name().bold(),
            total_tasks
        );
    }

    fn on_agent_complete(&self, agent: AnalysisType, model: &Model, fallback: bool) {
        if fallback {
            eprintln!("  {} {}@{} (fallback)", "x".red(), agent, model);
        } else {
            eprintln!("  {} {}@{}", "v".green(), agent, model);
        }
    }

    fn on_stage_complete(&self, _stage: PipelineStage) {}

    fn on_gate_result(&self, validation: &QualityValidation) {
        eprintln!(
            "  gates {} (overall {:.3})",
            if validation.passes_gates { "pass" } else { "fail" },
            validation.overall_score
        );
    }
}
