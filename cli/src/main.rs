//! CLI entrypoint for Review Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use council_application::{
    AnalysisAgent, GatewayLlmService, RunReviewInput, RunReviewUseCase, SpecializedAgent,
};
use council_domain::PrContext;
use council_infrastructure::{ConfigLoader, FileConfig, FileOutputFormat, OpenAiCompatibleGateway};
use council_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Exit status when the review ran but the quality gates failed
const GATE_FAILURE_EXIT: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        for line in ConfigLoader::config_sources() {
            println!("{}", line);
        }
        return Ok(());
    }

    info!("Starting Review Council");

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    apply_cli_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    let Some(context_path) = cli.context.as_deref() else {
        bail!("A pull request context file is required (use - for stdin).");
    };
    let context = read_context(context_path)?;

    let agent_types = config.enabled_agents()?;
    let pipeline = config.to_pipeline_config();
    info!(
        agents = agent_types.len(),
        models = pipeline.models.len(),
        "Review configured"
    );

    // === Dependency Injection ===
    let gateway = Arc::new(OpenAiCompatibleGateway::new(&config.provider)?);
    let llm = Arc::new(GatewayLlmService::new(gateway));

    let agents: Vec<Arc<dyn AnalysisAgent>> = agent_types
        .iter()
        .map(|analysis_type| {
            Arc::new(
                SpecializedAgent::new(
                    *analysis_type,
                    Arc::clone(&llm),
                    config.council.default_model.clone(),
                )
                .with_timeout(pipeline.llm_timeout)
                .with_confidence_delta(pipeline.refinement.confidence_delta),
            ) as Arc<dyn AnalysisAgent>
        })
        .collect();

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling review");
            ctrl_c_token.cancel();
        }
    });

    let use_case = RunReviewUseCase::new(llm, pipeline).with_cancellation(token);
    let input = RunReviewInput::new(context, agents);

    let output = if cli.quiet || !config.output.show_progress {
        use_case.execute(input).await?
    } else if std::io::stderr().is_terminal() {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(input, &progress).await?
    } else {
        use_case.execute_with_progress(input, &SimpleProgress).await?
    };

    let format = cli.output.unwrap_or(match config.output.format {
        FileOutputFormat::Console => OutputFormat::Console,
        FileOutputFormat::Json => OutputFormat::Json,
    });
    let rendered = match format {
        OutputFormat::Console => ConsoleFormatter::format(&output),
        OutputFormat::Json => ConsoleFormatter::format_json(&output),
    };
    println!("{}", rendered);

    if !output.passed() {
        drop(log_guard);
        std::process::exit(GATE_FAILURE_EXIT);
    }
    Ok(())
}

/// Install the subscriber; `-v` counts pick the level, `RUST_LOG` is ignored.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(level))
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let prefix = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, prefix));

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
    Ok(Some(guard))
}

/// CLI flags take precedence over every config source
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if !cli.model.is_empty() {
        config.council.models = cli.model.clone();
    }
    if !cli.agent.is_empty() {
        config.pipeline.agents = cli.agent.clone();
    }
    if let Some(max) = cli.max_iterations {
        config.pipeline.max_iterations = max;
    }
    if let Some(max) = cli.max_feedback_rounds {
        config.pipeline.max_feedback_rounds = max;
    }
    if let Some(timeout) = cli.timeout {
        config.pipeline.timeout_seconds = timeout;
    }
}

fn read_context(path: &Path) -> Result<PrContext> {
    let raw = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read context from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?
    };
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid pull request context in {}", path.display()))
}
