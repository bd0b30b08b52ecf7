//! CLI definition and entry point

pub mod pipeline;

use crate::assessors::AssessorRegistry;
use crate::config::load_config;
use crate::error::HealthError;
use crate::models::HealthReport;
use crate::probes::{CancellationToken, DisabledToolRunner, SystemToolRunner, ToolRunner};
use crate::reporters::OutputFormat;
use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use pipeline::{default_workers, Orchestrator};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Process exit codes
pub mod exit_codes {
    /// Acceptable health
    pub const OK: i32 = 0;
    /// Overall score below 50, nothing critical
    pub const POOR: i32 = 1;
    /// At least one CRITICAL or HIGH finding
    pub const CRITICAL: i32 = 2;
    /// Bad target, bad config or bad arguments; no report
    pub const FATAL: i32 = 3;
}

/// Overall score below which a run exits with `POOR`
pub const POOR_SCORE: u32 = 50;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// health - repository health scoring
///
/// Scores a repository on six dimensions and exits with a CI-friendly code.
#[derive(Parser, Debug)]
#[command(name = "health")]
#[command(
    version,
    about = "Score a repository's health across code quality, tests, security, performance, maintenance and documentation",
    after_help = "\
Exit codes:
  0  acceptable health
  1  poor health (overall score below 50)
  2  critical or high severity findings present
  3  fatal error (missing target, malformed config)

Examples:
  health                         Assess the current directory
  health ../service json         JSON report for scripting
  health . markdown -o HEALTH.md Markdown report for a PR comment
  health . --timeout 120         Stop after two minutes, report what finished
  health . --only security       Run a single dimension"
)]
pub struct Cli {
    /// Repository to assess
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format: human (or text), json, markdown (or md)
    #[arg(default_value = "human", value_parser = ["human", "text", "json", "markdown", "md"])]
    pub format: String,

    /// Config file (default: health.toml, .healthrc.json or .health.yaml in the target)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Global run timeout in seconds; unfinished dimensions are reported as incomplete
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Per-call timeout for external tools in seconds
    #[arg(long, value_name = "SECS")]
    pub tool_timeout: Option<u64>,

    /// Number of parallel assessor workers (1-64)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Run assessors one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Never invoke external tools (git, npm, cargo, pip-audit, ...)
    #[arg(long)]
    pub no_external: bool,

    /// Only run these dimensions (repeatable)
    #[arg(long, value_name = "DIM")]
    pub only: Vec<String>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Debug logging on stderr (VERBOSE=1, yes, true; empty, 0, no, false, off disable)
    #[arg(long, env = "VERBOSE", value_parser = FalseyValueParser::new())]
    pub verbose: bool,
}

impl Cli {
    /// Effective default log level
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }

    fn worker_count(&self) -> usize {
        if self.sequential {
            1
        } else {
            self.workers.unwrap_or_else(default_workers)
        }
    }
}

/// Map a report to the process exit code
pub fn exit_code_for(report: &HealthReport) -> i32 {
    if report.has_blocking_findings() {
        exit_codes::CRITICAL
    } else if report.overall_score < POOR_SCORE {
        exit_codes::POOR
    } else {
        exit_codes::OK
    }
}

/// First Ctrl-C cancels the run, which still reports what finished; a
/// second one exits immediately
fn install_interrupt_handler(cancel: &CancellationToken) {
    let token = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if token.is_cancelled() {
            std::process::exit(exit_codes::FATAL);
        }
        warn!("Interrupted; reporting the dimensions finished so far (Ctrl-C again to abort)");
        token.cancel();
    });
    if let Err(e) = installed {
        debug!("Interrupt handler not installed: {}", e);
    }
}

/// Run the CLI and return the exit code.
///
/// Errors are fatal conditions only; the caller maps them to `FATAL`.
pub fn run(cli: Cli) -> Result<i32> {
    let format = OutputFormat::from_str(&cli.format)?;

    if !cli.path.exists() {
        return Err(HealthError::PathNotFound(cli.path.clone()).into());
    }
    if !cli.path.is_dir() {
        return Err(HealthError::NotADirectory(cli.path.clone()).into());
    }
    let root = cli
        .path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", cli.path.display()))?;
    let target = cli.path.display().to_string();

    let mut config = load_config(&root, cli.config.as_deref())?.with_run_timeout(cli.timeout);
    if let Some(secs) = cli.tool_timeout {
        config = config.with_tool_timeout(secs);
    }
    if cli.no_external {
        config = config.without_external_tools();
    }
    debug!("Resolved config: {:?}", config);

    let registry = AssessorRegistry::with_defaults().only(&cli.only)?;
    info!("Running dimensions: {}", registry.names().join(", "));

    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel);
    let tools: Arc<dyn ToolRunner> = if config.external_tools {
        Arc::new(SystemToolRunner::new(cancel.clone()))
    } else {
        Arc::new(DisabledToolRunner)
    };

    let progress = format == OutputFormat::Human && console::Term::stderr().is_term();
    let mut orchestrator = Orchestrator::new(registry, Arc::new(config), tools, cancel)
        .with_workers(cli.worker_count())
        .with_progress(progress);

    let report = orchestrator.run(&root, &target)?;
    let rendered = orchestrator.render(&report, format)?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(exit_code_for(&report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{DimensionResult, Finding, Severity};
    use crate::scoring::aggregate;

    fn report_with(score: u32, severity: Option<Severity>) -> HealthReport {
        let findings = severity
            .map(|s| vec![Finding::new(s, "x", "x", "security")])
            .unwrap_or_default();
        let dim = DimensionResult {
            name: "security".into(),
            score,
            weight: 20,
            findings,
            recommendations: Vec::new(),
            completed: true,
        };
        aggregate(vec![dim], &Config::default(), ".")
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&report_with(95, None)), exit_codes::OK);
        assert_eq!(exit_code_for(&report_with(50, None)), exit_codes::OK);
        assert_eq!(exit_code_for(&report_with(49, Some(Severity::Medium))), exit_codes::POOR);
        assert_eq!(exit_code_for(&report_with(95, Some(Severity::High))), exit_codes::CRITICAL);
        assert_eq!(exit_code_for(&report_with(10, Some(Severity::Critical))), exit_codes::CRITICAL);
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "health", "repo", "md", "--timeout", "60", "--only", "security", "--only", "documentation",
            "--sequential",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("repo"));
        assert_eq!(cli.format, "md");
        assert_eq!(cli.timeout, Some(60));
        assert_eq!(cli.only, vec!["security", "documentation"]);
        assert_eq!(cli.worker_count(), 1);

        let cli = Cli::try_parse_from(["health", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_level(), "debug");

        assert!(Cli::try_parse_from(["health", ".", "sarif"]).is_err());
        assert!(Cli::try_parse_from(["health", ".", "--workers", "0"]).is_err());
    }

    #[test]
    fn test_missing_target_is_fatal() {
        let cli = Cli::try_parse_from(["health", "/definitely/not/here"]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
