//! Core data models for repo-health
//!
//! These models are shared by every assessor, the aggregator and the
//! reporters. All of them are plain values: created once, then only read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, most severe first
    pub const DESCENDING: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Critical and high findings gate CI (exit code 2)
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    /// Medium and low findings are reported as warnings
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Medium | Severity::Low)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A single detected issue or positive signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    /// Name of the assessor (dimension) that produced the finding
    pub source_assessor: String,
    /// Path relative to the assessed root, when the finding points at a file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// 1-based line number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Finding {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
        source_assessor: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            source_assessor: source_assessor.into(),
            file: None,
            line: None,
        }
    }

    /// Attach a file location
    pub fn at(mut self, file: impl Into<PathBuf>, line: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }

    /// `path:line` style location, if any
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_ref()?;
        Some(match self.line {
            Some(line) => format!("{}:{}", file.display(), line),
            None => file.display().to_string(),
        })
    }
}

/// Output of one assessor run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionResult {
    pub name: String,
    /// 0..=100
    pub score: u32,
    /// Relative importance, always > 0
    pub weight: u32,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    /// False when the run timed out or was cancelled before this dimension finished
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

impl DimensionResult {
    /// Placeholder for a dimension that never finished.
    ///
    /// Carries a single INFO finding and is excluded from the weighted score.
    pub fn incomplete(name: &str, weight: u32, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            score: 0,
            weight,
            findings: vec![Finding::new(
                Severity::Info,
                "timeout",
                format!("Assessment did not complete: {}", reason),
                name,
            )],
            recommendations: Vec::new(),
            completed: false,
        }
    }

    /// Highest severity among this dimension's findings
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}

/// Human-readable label derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    /// Statuses with a configurable minimum score, best first.
    /// `Critical` is the fallback and has no threshold.
    pub const RANKED: [HealthStatus; 4] = [
        HealthStatus::Excellent,
        HealthStatus::Good,
        HealthStatus::Fair,
        HealthStatus::Poor,
    ];

    /// Config key for this status' threshold
    pub fn key(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Good => "good",
            HealthStatus::Fair => "fair",
            HealthStatus::Poor => "poor",
            HealthStatus::Critical => "critical",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Excellent => write!(f, "EXCELLENT"),
            HealthStatus::Good => write!(f, "GOOD"),
            HealthStatus::Fair => write!(f, "FAIR"),
            HealthStatus::Poor => write!(f, "POOR"),
            HealthStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Summary of findings by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total: usize,
}

impl FindingsSummary {
    pub fn from_findings<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut summary = Self::default();
        for f in findings {
            match f.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// Overall health report for a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub target: String,
    pub version: String,
    pub overall_score: u32,
    pub status: HealthStatus,
    pub dimensions: Vec<DimensionResult>,
    /// Critical and high findings across all dimensions
    pub critical_findings: Vec<Finding>,
    /// Medium and low findings across all dimensions
    pub warnings: Vec<Finding>,
    pub findings_summary: FindingsSummary,
    pub generated_at: DateTime<Utc>,
}

impl HealthReport {
    /// Look up a dimension by name
    pub fn dimension(&self, name: &str) -> Option<&DimensionResult> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Every finding, in dimension order
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.dimensions.iter().flat_map(|d| d.findings.iter())
    }

    pub fn has_blocking_findings(&self) -> bool {
        !self.critical_findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
        assert!(Severity::High.is_blocking());
        assert!(!Severity::Medium.is_blocking());
        assert!(Severity::Low.is_warning());
        assert!(!Severity::Info.is_warning());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let status = serde_json::to_string(&HealthStatus::Good).unwrap();
        assert_eq!(status, "\"good\"");
    }

    #[test]
    fn test_finding_location() {
        let f = Finding::new(Severity::Low, "x", "msg", "security");
        assert_eq!(f.location(), None);
        let f = f.at("src/main.rs", Some(3));
        assert_eq!(f.location().as_deref(), Some("src/main.rs:3"));
    }

    #[test]
    fn test_incomplete_dimension() {
        let d = DimensionResult::incomplete("security", 20, "run timeout after 5s");
        assert!(!d.completed);
        assert_eq!(d.findings.len(), 1);
        assert_eq!(d.max_severity(), Some(Severity::Info));
    }

    #[test]
    fn test_findings_summary() {
        let findings = vec![
            Finding::new(Severity::Critical, "a", "a", "s"),
            Finding::new(Severity::Info, "b", "b", "s"),
            Finding::new(Severity::Info, "c", "c", "s"),
        ];
        let summary = FindingsSummary::from_findings(&findings);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.info, 2);
        assert_eq!(summary.total, 3);
    }
}
