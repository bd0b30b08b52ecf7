//! Base assessor trait and scoring helpers
//!
//! This module defines the core abstractions for dimension assessment:
//! - `Assessor` trait that every dimension implements
//! - `AssessmentContext` carrying the read-only inputs of one run
//! - `ScoreCard` implementing the start-at-100 / deduct / clamp algorithm

use crate::config::Config;
use crate::models::{DimensionResult, Finding, Severity};
use crate::probes::{
    CancellationToken, DisabledToolRunner, FileInventory, ToolInvocation, ToolOutput, ToolRunner,
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Everything an assessor may look at. Cheap to clone; all shared parts are
/// behind `Arc` and never mutated.
#[derive(Clone)]
pub struct AssessmentContext {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub tools: Arc<dyn ToolRunner>,
    pub cancel: CancellationToken,
    pub inventory: Arc<FileInventory>,
    /// Run start time; file ages are measured against it
    pub now: DateTime<Utc>,
}

impl AssessmentContext {
    pub fn new(
        root: &Path,
        config: Arc<Config>,
        tools: Arc<dyn ToolRunner>,
        cancel: CancellationToken,
        inventory: Arc<FileInventory>,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            tools,
            cancel,
            inventory,
            now: Utc::now(),
        }
    }

    /// Pin the clock (tests)
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run an external tool in the target root with the configured timeout
    pub fn run_tool(&self, program: &str, args: &[&str]) -> ToolOutput {
        let invocation = ToolInvocation::new(program, args.iter().copied())
            .in_dir(&self.root)
            .with_timeout(Duration::from_secs(self.config.tool_timeout_secs));
        if !self.config.external_tools {
            return DisabledToolRunner.run(&invocation);
        }
        self.tools.run(&invocation)
    }

    pub fn file_exists(&self, rel: &str) -> bool {
        crate::probes::file_exists(&self.root, rel)
    }

    pub fn dir_exists(&self, rel: &str) -> bool {
        crate::probes::dir_exists(&self.root, rel)
    }

    pub fn any_exists(&self, candidates: &[&str]) -> Option<String> {
        crate::probes::any_exists(&self.root, candidates)
    }

    /// Read a root-relative file, preferring the inventory snapshot
    pub fn read(&self, rel: &str) -> Option<String> {
        if let Some(content) = self.inventory.get(rel).and_then(|e| e.content.as_deref()) {
            return Some(content.to_string());
        }
        std::fs::read_to_string(self.root.join(rel)).ok()
    }
}

/// Trait for all dimension assessors
///
/// Assessors are independent: each reads the shared context and returns a
/// fresh `DimensionResult`. They never write shared state, so the
/// orchestrator may run them in any order or in parallel.
pub trait Assessor: Send + Sync {
    /// Dimension name, also the key for its configured weight
    fn name(&self) -> &'static str;

    /// Human-readable description of what this dimension measures
    fn description(&self) -> &'static str;

    /// Run every check and return the dimension result
    fn assess(&self, ctx: &AssessmentContext) -> DimensionResult;
}

/// Accumulates findings and deductions for one dimension.
///
/// Deductions are summed and the score is floored at 0, so the final score
/// does not depend on check order. INFO findings never deduct.
#[derive(Debug, Clone)]
pub struct ScoreCard {
    name: String,
    weight: u32,
    deducted: u32,
    findings: Vec<Finding>,
    recommendations: Vec<String>,
    advice: Vec<(u32, String)>,
}

impl ScoreCard {
    pub fn new(name: &str, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            weight,
            deducted: 0,
            findings: Vec::new(),
            recommendations: Vec::new(),
            advice: Vec::new(),
        }
    }

    /// Card for an assessor, weighted from config
    pub fn for_dimension(name: &str, config: &Config) -> Self {
        Self::new(name, config.weight_for(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current score, 0..=100
    pub fn score(&self) -> u32 {
        100u32.saturating_sub(self.deducted)
    }

    /// Build a finding attributed to this dimension
    pub fn finding(
        &self,
        severity: Severity,
        category: &str,
        message: impl Into<String>,
    ) -> Finding {
        Finding::new(severity, category, message, self.name.as_str())
    }

    /// Record a finding and deduct `points` from the score
    pub fn penalize(&mut self, finding: Finding, points: u32) {
        if finding.severity != Severity::Info {
            self.deducted = self.deducted.saturating_add(points);
        }
        self.findings.push(finding);
    }

    /// Shorthand for `penalize(finding(..), points)`
    pub fn deduct(
        &mut self,
        severity: Severity,
        category: &str,
        message: impl Into<String>,
        points: u32,
    ) {
        let finding = self.finding(severity, category, message);
        self.penalize(finding, points);
    }

    /// Deduct without recording a finding (matches beyond the output cap)
    pub fn deduct_silently(&mut self, points: u32) {
        self.deducted = self.deducted.saturating_add(points);
    }

    /// Record an informational finding
    pub fn info(&mut self, category: &str, message: impl Into<String>) {
        let finding = self.finding(Severity::Info, category, message);
        self.findings.push(finding);
    }

    /// Unconditional recommendation
    pub fn recommend(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !self.recommendations.contains(&text) {
            self.recommendations.push(text);
        }
    }

    /// Recommendation emitted only if the final score is below `threshold`
    pub fn advise_below(&mut self, threshold: u32, text: impl Into<String>) {
        self.advice.push((threshold, text.into()));
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn finish(self) -> DimensionResult {
        let score = self.score();
        let mut recommendations = self.recommendations;
        for (threshold, text) in self.advice {
            if score < threshold && !recommendations.contains(&text) {
                recommendations.push(text);
            }
        }
        DimensionResult {
            name: self.name,
            score,
            weight: self.weight,
            findings: self.findings,
            recommendations,
            completed: true,
        }
    }
}

/// Upper bound on the total deduction of a repeated check
#[derive(Debug, Clone, Copy)]
pub struct DeductionCap {
    remaining: u32,
}

impl DeductionCap {
    pub fn new(limit: u32) -> Self {
        Self { remaining: limit }
    }

    /// Points actually allowed for the next hit
    pub fn take(&mut self, points: u32) -> u32 {
        let allowed = points.min(self.remaining);
        self.remaining -= allowed;
        allowed
    }
}
