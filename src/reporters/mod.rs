//! Output reporters for health reports
//!
//! Supports multiple output formats:
//! - `human` - Terminal output, grouped by severity, with colors
//! - `json` - Machine-readable JSON with stable field names
//! - `markdown` - GitHub-flavored Markdown for PR comments and archives
//!
//! Every reporter takes `&HealthReport` and returns a `String`; none of them
//! can change a score.

mod json;
mod markdown;
mod text;

use crate::models::HealthReport;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(anyhow!(
                "Unknown format '{}'. Valid formats: human, json, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// Render a health report in the specified format
pub fn render(report: &HealthReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Human => text::render(report),
        OutputFormat::Json => json::render(report),
        OutputFormat::Markdown => markdown::render(report),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Create a small HealthReport for testing
    pub(crate) fn test_report() -> HealthReport {
        use crate::config::Config;
        use crate::models::{DimensionResult, Finding, Severity};
        use chrono::TimeZone;

        let security = DimensionResult {
            name: "security".into(),
            score: 75,
            weight: 20,
            findings: vec![
                Finding::new(
                    Severity::Critical,
                    "secret",
                    "Hardcoded password",
                    "security",
                )
                .at("src/settings.py", Some(3)),
                Finding::new(Severity::Info, "dependency-audit", "npm audit skipped", "security"),
            ],
            recommendations: vec!["Rotate exposed credentials".into()],
            completed: true,
        };
        let documentation = DimensionResult {
            name: "documentation".into(),
            score: 85,
            weight: 15,
            findings: vec![Finding::new(
                Severity::Medium,
                "license",
                "No LICENSE file",
                "documentation",
            )],
            recommendations: Vec::new(),
            completed: true,
        };
        let performance = DimensionResult::incomplete("performance", 10, "run timeout after 5s");

        crate::scoring::aggregate_at(
            vec![security, documentation, performance],
            &Config::default(),
            "demo",
            chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("human").unwrap(), OutputFormat::Human);
        assert_eq!(OutputFormat::from_str("text").unwrap(), OutputFormat::Human);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_str("md").unwrap(),
            OutputFormat::Markdown
        );
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_test_report_shape() {
        let report = test_report();
        // (75*20 + 85*15) / 35 = 79.3
        assert_eq!(report.overall_score, 79);
        assert_eq!(report.critical_findings.len(), 1);
        assert_eq!(report.warnings.len(), 1);
    }
}
