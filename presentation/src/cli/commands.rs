//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for review results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Gate verdict, consensus findings and recommendations
    Console,
    /// The full review output as JSON
    Json,
}

/// CLI arguments for review-council
#[derive(Parser, Debug)]
#[command(name = "review-council")]
#[command(author, version, about = "Review Council - Specialized LLM agents cross-check a pull request")]
#[command(long_about = r#"
Review Council runs specialized review agents over a pull request and
checks the combined result against quality gates.

The pipeline:
1. Analysis: every agent reviews the change against every configured model
2. Cross-validation: results are compared and merged into a consensus
3. Refinement: each result is critiqued and improved, up to --max-iterations
4. Quality gates: completeness, consistency, actionability and evidence

The pull request is read from a JSON file with `title`, `description`,
`files` (path, patch, additions, deletions) and an optional `diff`.

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables, e.g. COUNCIL_PIPELINE__TIMEOUT_SECONDS=60
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config
4. ~/.config/review-council/config.toml   Global config

Exit status is 2 when the quality gates fail.

Example:
  review-council pr.json
  review-council -a security -a performance -m gpt-4o -m claude-sonnet-4.5 pr.json
  review-council --output json --max-iterations 0 pr.json
"#)]
pub struct Cli {
    /// Path to the pull request context JSON ("-" reads stdin)
    pub context: Option<PathBuf>,

    /// Agents to run (can be specified multiple times; default: all)
    #[arg(short, long, value_name = "AGENT", value_delimiter = ',')]
    pub agent: Vec<String>,

    /// Models every agent runs against (can be specified multiple times)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Maximum critique/refine rounds (0 disables refinement)
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u32>,

    /// Gate-driven feedback rounds after refinement
    #[arg(long, value_name = "N")]
    pub max_feedback_rounds: Option<u32>,

    /// Timeout in seconds for each LLM call
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agents_and_models() {
        let cli = Cli::try_parse_from([
            "review-council",
            "-a",
            "security,performance",
            "--agent",
            "testing",
            "-m",
            "gpt-4o",
            "-m",
            "claude-sonnet-4.5",
            "--max-iterations",
            "0",
            "-vv",
            "pr.json",
        ])
        .unwrap();
        assert_eq!(cli.agent, vec!["security", "performance", "testing"]);
        assert_eq!(cli.model.len(), 2);
        assert_eq!(cli.max_iterations, Some(0));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.context, Some(PathBuf::from("pr.json")));
        assert_eq!(cli.output, None);
    }

    #[test]
    fn test_output_format_values() {
        let cli = Cli::try_parse_from(["review-council", "--output", "json", "-"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(Cli::try_parse_from(["review-council", "--output", "yaml"]).is_err());
    }

    #[test]
    fn test_show_config_needs_no_context() {
        let cli = Cli::try_parse_from(["review-council", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.context.is_none());
    }
}
