//! Run orchestration
//!
//! Drives one health run through three states:
//!
//! ```text
//! Running ──(all results, or run timeout)──▶ Aggregating ──(rendered)──▶ Done
//! ```
//!
//! The run deadline starts before the file inventory, so a slow walk counts
//! against it too. Assessors run on a rayon pool and report back over a
//! crossbeam channel. The orchestrator waits for every result, the run
//! deadline or cancellation (Ctrl-C), whichever comes first. On timeout it
//! cancels the shared token, which also kills running external tools. Every
//! missing dimension gets an INFO-only placeholder, so a report is always
//! produced.

use crate::assessors::{AssessmentContext, AssessorRegistry};
use crate::config::Config;
use crate::models::{DimensionResult, HealthReport};
use crate::probes::{CancellationToken, FileInventory, ToolRunner};
use crate::reporters::{self, OutputFormat};
use crate::scoring;
use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, RecvTimeoutError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound for the default worker count
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// How often the result loop looks at the cancellation token
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Default pool size: available parallelism, capped
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_DEFAULT_WORKERS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Aggregating,
    Done,
}

pub struct Orchestrator {
    registry: AssessorRegistry,
    config: Arc<Config>,
    tools: Arc<dyn ToolRunner>,
    cancel: CancellationToken,
    run_timeout: Option<Duration>,
    workers: usize,
    progress: bool,
    state: RunState,
}

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl Orchestrator {
    pub fn new(
        registry: AssessorRegistry,
        config: Arc<Config>,
        tools: Arc<dyn ToolRunner>,
        cancel: CancellationToken,
    ) -> Self {
        let run_timeout = config.run_timeout_secs.map(Duration::from_secs);
        Self {
            registry,
            config,
            tools,
            cancel,
            run_timeout,
            workers: default_workers(),
            progress: false,
            state: RunState::Running,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Override the run timeout taken from the config
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Show a spinner on stderr while assessors run
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run every registered assessor against `root` and aggregate.
    pub fn run(&mut self, root: &Path, target: &str) -> Result<HealthReport> {
        self.transition(RunState::Running);
        let started = Instant::now();
        let deadline = self.run_timeout.map(|timeout| started + timeout);

        let inventory = FileInventory::scan_until(root, &self.config, || {
            self.cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d)
        });
        info!("Inventoried {} files under {}", inventory.len(), root.display());

        let results = match self.interruption(deadline) {
            Some(reason) => {
                warn!("{} before any dimension ran", reason);
                self.placeholders(&reason)
            }
            None => {
                let ctx = AssessmentContext::new(
                    root,
                    Arc::clone(&self.config),
                    Arc::clone(&self.tools),
                    self.cancel.clone(),
                    Arc::new(inventory),
                );
                self.dispatch(ctx, deadline)?
            }
        };

        self.transition(RunState::Aggregating);
        let report = scoring::aggregate(results, &self.config, target);
        info!(
            "Health run finished in {:.2}s: {}/100 ({})",
            started.elapsed().as_secs_f64(),
            report.overall_score,
            report.status
        );
        Ok(report)
    }

    /// Render the aggregated report; the run is done afterwards.
    pub fn render(&mut self, report: &HealthReport, format: OutputFormat) -> Result<String> {
        let rendered = reporters::render(report, format)?;
        self.transition(RunState::Done);
        Ok(rendered)
    }

    /// Why the run has to stop now, if it does. Hitting the deadline cancels
    /// the shared token.
    fn interruption(&self, deadline: Option<Instant>) -> Option<String> {
        if let (Some(deadline), Some(timeout)) = (deadline, self.run_timeout) {
            if Instant::now() >= deadline {
                self.cancel.cancel();
                return Some(format!("run timeout after {}s", timeout.as_secs()));
            }
        }
        if self.cancel.is_cancelled() {
            return Some("run cancelled".to_string());
        }
        None
    }

    /// One incomplete result per registered assessor
    fn placeholders(&self, reason: &str) -> Vec<DimensionResult> {
        self.registry
            .assessors()
            .iter()
            .map(|a| {
                DimensionResult::incomplete(a.name(), self.config.weight_for(a.name()), reason)
            })
            .collect()
    }

    fn dispatch(
        &self,
        ctx: AssessmentContext,
        deadline: Option<Instant>,
    ) -> Result<Vec<DimensionResult>> {
        let assessors = self.registry.assessors();
        let total = assessors.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("health-assessor-{}", i))
            .panic_handler(|_| warn!("An assessor panicked; its dimension is reported as incomplete"))
            .build()
            .context("Failed to build assessor thread pool")?;

        let (tx, rx) = unbounded::<(usize, DimensionResult)>();
        for (index, assessor) in assessors.iter().enumerate() {
            debug!("Dispatching {}: {}", assessor.name(), assessor.description());
            let assessor = Arc::clone(assessor);
            let ctx = ctx.clone();
            let tx = tx.clone();
            pool.spawn(move || {
                let started = Instant::now();
                let result = assessor.assess(&ctx);
                debug!(
                    "{} scored {} in {:?}",
                    assessor.name(),
                    result.score,
                    started.elapsed()
                );
                // receiver is gone after a timeout
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let spinner = self.progress.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(create_spinner_style());
            spinner.set_message(format!("Assessing {} dimensions...", total));
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });

        let mut slots: Vec<Option<DimensionResult>> = vec![None; total];
        let mut received = 0;
        let mut missing_reason = "assessor failed".to_string();

        while received < total {
            if let Some(reason) = self.interruption(deadline) {
                warn!("{} with {}/{} dimensions complete", reason, received, total);
                missing_reason = reason;
                break;
            }
            let wait = deadline
                .map(|d| d.saturating_duration_since(Instant::now()).min(CANCEL_POLL))
                .unwrap_or(CANCEL_POLL);
            match rx.recv_timeout(wait) {
                Ok((index, result)) => {
                    if let Some(spinner) = &spinner {
                        spinner.set_message(format!(
                            "Assessed {} ({}/{})",
                            result.name,
                            received + 1,
                            total
                        ));
                    }
                    slots[index] = Some(result);
                    received += 1;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("{} assessor(s) ended without a result", total - received);
                    break;
                }
            }
        }

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        Ok(assessors
            .iter()
            .zip(slots)
            .map(|(assessor, slot)| {
                slot.unwrap_or_else(|| {
                    DimensionResult::incomplete(
                        assessor.name(),
                        self.config.weight_for(assessor.name()),
                        &missing_reason,
                    )
                })
            })
            .collect())
    }
}
