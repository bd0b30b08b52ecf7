//! Human (terminal) reporter with colors and formatting
//!
//! Layout: one summary line, the dimension table, findings grouped by
//! severity, then recommendations. Colors come from `console` and are
//! dropped automatically when stdout is not a terminal or `NO_COLOR` is set.

use crate::models::{DimensionResult, Finding, HealthReport, HealthStatus, Severity};
use anyhow::Result;
use console::{style, StyledObject};
use std::fmt::Write;

/// Findings shown per severity group before "...and N more"
const MAX_PER_SEVERITY: usize = 15;

fn status_style(status: HealthStatus) -> StyledObject<String> {
    let text = status.to_string();
    match status {
        HealthStatus::Excellent => style(text).green().bold(),
        HealthStatus::Good => style(text).green(),
        HealthStatus::Fair => style(text).yellow(),
        HealthStatus::Poor => style(text).red(),
        HealthStatus::Critical => style(text).red().bold(),
    }
}

fn severity_style(severity: Severity) -> StyledObject<String> {
    let tag = severity.to_string().to_uppercase();
    match severity {
        Severity::Critical => style(tag).red().bold(),
        Severity::High => style(tag).red(),
        Severity::Medium => style(tag).yellow(),
        Severity::Low => style(tag).blue(),
        Severity::Info => style(tag).dim(),
    }
}

fn score_style(score: u32) -> StyledObject<String> {
    let text = format!("{:>3}", score);
    if score >= 80 {
        style(text).green()
    } else if score >= 60 {
        style(text).yellow()
    } else {
        style(text).red()
    }
}

/// Render report as formatted terminal output
pub fn render(report: &HealthReport) -> Result<String> {
    let mut out = String::new();

    writeln!(
        out,
        "Overall: {}/100 ({})  Findings: {}  Target: {}",
        style(report.overall_score).bold(),
        status_style(report.status),
        report.findings_summary.total,
        report.target
    )?;
    writeln!(
        out,
        "{}",
        style("──────────────────────────────────────────────────").dim()
    )?;

    writeln!(out, "\n{}", style("DIMENSIONS").bold())?;
    for dim in &report.dimensions {
        render_dimension(&mut out, dim)?;
    }

    let fs = &report.findings_summary;
    writeln!(
        out,
        "\n{} ({} total: {} critical, {} high, {} medium, {} low, {} info)",
        style("FINDINGS").bold(),
        fs.total,
        fs.critical,
        fs.high,
        fs.medium,
        fs.low,
        fs.info
    )?;

    for severity in Severity::DESCENDING {
        let group: Vec<&Finding> = report
            .all_findings()
            .filter(|f| f.severity == severity)
            .collect();
        if group.is_empty() {
            continue;
        }
        writeln!(out, "\n  {} ({})", severity_style(severity), group.len())?;
        for finding in group.iter().take(MAX_PER_SEVERITY) {
            render_finding(&mut out, finding)?;
        }
        let remaining = group.len().saturating_sub(MAX_PER_SEVERITY);
        if remaining > 0 {
            writeln!(
                out,
                "    {}",
                style(format!(
                    "...and {} more (re-run with the json format for all)",
                    remaining
                ))
                .dim()
            )?;
        }
    }

    let recommendations: Vec<(&str, &str)> = report
        .dimensions
        .iter()
        .flat_map(|d| {
            d.recommendations
                .iter()
                .map(move |r| (d.name.as_str(), r.as_str()))
        })
        .collect();
    if !recommendations.is_empty() {
        writeln!(out, "\n{}", style("RECOMMENDATIONS").bold())?;
        for (dimension, text) in recommendations {
            writeln!(out, "  - [{}] {}", dimension, text)?;
        }
    }

    Ok(out)
}

fn render_dimension(out: &mut String, dim: &DimensionResult) -> Result<()> {
    if dim.completed {
        writeln!(
            out,
            "  {:<16} {}/100  {}",
            dim.name,
            score_style(dim.score),
            style(format!("weight {}", dim.weight)).dim()
        )?;
    } else {
        writeln!(
            out,
            "  {:<16} {}  {}",
            dim.name,
            style("  -/100").dim(),
            style("incomplete").yellow()
        )?;
    }
    Ok(())
}

fn render_finding(out: &mut String, finding: &Finding) -> Result<()> {
    let location = finding
        .location()
        .map(|l| format!("  {}", style(l).dim()))
        .unwrap_or_default();
    writeln!(
        out,
        "    [{}] {}{}",
        finding.source_assessor, finding.message, location
    )?;
    Ok(())
}
