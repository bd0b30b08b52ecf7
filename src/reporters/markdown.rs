//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates reports suitable for:
//! - Pull request comments
//! - Archived health snapshots in a repository
//! - GitHub wikis

use crate::models::{DimensionResult, Finding, HealthReport, HealthStatus, Severity};
use anyhow::Result;
use std::fmt::Write;

/// Maximum findings to show per dimension table
const MAX_FINDINGS_PER_DIMENSION: usize = 25;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &HealthReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');
    md.push_str(&render_summary(report));
    md.push('\n');
    md.push_str(&render_dimension_scores(report));
    md.push('\n');
    for dim in &report.dimensions {
        md.push_str(&render_dimension(dim)?);
        md.push('\n');
    }
    md.push_str(&render_footer(report));

    Ok(md)
}

fn status_emoji(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Excellent => "🏆",
        HealthStatus::Good => "✅",
        HealthStatus::Fair => "⚠️",
        HealthStatus::Poor => "❌",
        HealthStatus::Critical => "🚨",
    }
}

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴",
        Severity::High => "🟠",
        Severity::Medium => "🟡",
        Severity::Low => "🔵",
        Severity::Info => "⚪",
    }
}

fn render_header(report: &HealthReport) -> String {
    format!(
        r#"# {} Repository Health Report: {}

**Status: {}** | **Score: {}/100**

Generated: {}
"#,
        status_emoji(report.status),
        report.target,
        report.status,
        report.overall_score,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn render_summary(report: &HealthReport) -> String {
    let fs = &report.findings_summary;
    format!(
        r#"## Summary

| Metric | Value |
|--------|-------|
| **Overall Score** | {}/100 |
| **Status** | {} |
| **Critical/High Findings** | {} |
| **Warnings** | {} |
| **Total Findings** | {} |

| Severity | Count |
|----------|-------|
| {} Critical | {} |
| {} High | {} |
| {} Medium | {} |
| {} Low | {} |
| {} Info | {} |
"#,
        report.overall_score,
        report.status,
        report.critical_findings.len(),
        report.warnings.len(),
        fs.total,
        severity_emoji(Severity::Critical),
        fs.critical,
        severity_emoji(Severity::High),
        fs.high,
        severity_emoji(Severity::Medium),
        fs.medium,
        severity_emoji(Severity::Low),
        fs.low,
        severity_emoji(Severity::Info),
        fs.info
    )
}

fn render_dimension_scores(report: &HealthReport) -> String {
    let mut md = String::from(
        "## Dimension Scores\n\n| Dimension | Weight | Score | Findings |\n|-----------|--------|-------|----------|\n",
    );
    for dim in &report.dimensions {
        let score = if dim.completed {
            format!("{}/100", dim.score)
        } else {
            "incomplete".to_string()
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            dim.name,
            dim.weight,
            score,
            dim.findings.len()
        ));
    }
    md
}

fn render_dimension(dim: &DimensionResult) -> Result<String> {
    let mut md = String::new();
    writeln!(md, "## {}\n", dim.name)?;

    if dim.findings.is_empty() {
        writeln!(md, "_No findings._")?;
    } else {
        writeln!(md, "| Severity | Category | Message | Location |")?;
        writeln!(md, "|----------|----------|---------|----------|")?;
        let mut findings: Vec<&Finding> = dim.findings.iter().collect();
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        for finding in findings.iter().take(MAX_FINDINGS_PER_DIMENSION) {
            writeln!(
                md,
                "| {} {} | {} | {} | {} |",
                severity_emoji(finding.severity),
                finding.severity,
                finding.category,
                escape_cell(&finding.message),
                finding
                    .location()
                    .map(|l| format!("`{}`", l))
                    .unwrap_or_default()
            )?;
        }
        let remaining = findings.len().saturating_sub(MAX_FINDINGS_PER_DIMENSION);
        if remaining > 0 {
            writeln!(md, "\n_...and {} more findings_", remaining)?;
        }
    }

    if !dim.recommendations.is_empty() {
        writeln!(md, "\n**Recommendations**\n")?;
        for rec in &dim.recommendations {
            writeln!(md, "- {}", rec)?;
        }
    }
    Ok(md)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn render_footer(report: &HealthReport) -> String {
    format!("---\n\n_Generated by repo-health v{}_\n", report.version)
}
