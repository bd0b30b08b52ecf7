//! Dependency audit and outdated-package output parsing
//!
//! Each supported package tool prints JSON in its own shape. The parsers
//! here reduce that to vulnerability counts or an outdated-package count.
//! Output that cannot be parsed yields `None`; callers report it as INFO.

use crate::assessors::base::ScoreCard;
use crate::models::Severity;
use crate::probes::ToolOutput;
use serde_json::Value as JsonValue;

pub const CRITICAL_VULN_DEDUCTION: u32 = 25;
pub const HIGH_VULN_DEDUCTION: u32 = 15;
pub const OTHER_VULN_DEDUCTION: u32 = 5;

/// Vulnerability totals from one audit run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VulnerabilityCounts {
    pub critical: usize,
    pub high: usize,
    /// moderate, low and info together
    pub other: usize,
}

impl VulnerabilityCounts {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.other
    }
}

fn count_at(value: &JsonValue, key: &str) -> usize {
    value.get(key).and_then(|v| v.as_u64()).unwrap_or(0) as usize
}

/// `npm audit --json` (npm 6 and 7+ both report `metadata.vulnerabilities`)
pub fn parse_npm_audit(output: &ToolOutput) -> Option<VulnerabilityCounts> {
    let json = output.json_output()?;
    let vulns = json.get("metadata")?.get("vulnerabilities")?;
    Some(VulnerabilityCounts {
        critical: count_at(vulns, "critical"),
        high: count_at(vulns, "high"),
        other: count_at(vulns, "moderate") + count_at(vulns, "low") + count_at(vulns, "info"),
    })
}

/// `cargo audit --json`
///
/// RustSec advisories carry no severity label. A CVSS vector with a network
/// attack vector and high impact counts as critical, everything else as high.
pub fn parse_cargo_audit(output: &ToolOutput) -> Option<VulnerabilityCounts> {
    let json = output.json_output()?;
    let vulns = json.get("vulnerabilities")?;
    let mut counts = VulnerabilityCounts::default();

    match vulns.get("list").and_then(|l| l.as_array()) {
        Some(list) => {
            for entry in list {
                let cvss = entry
                    .get("advisory")
                    .and_then(|a| a.get("cvss"))
                    .and_then(|c| c.as_str())
                    .unwrap_or("");
                if cvss.contains("AV:N") && cvss.contains("C:H") && cvss.contains("I:H") {
                    counts.critical += 1;
                } else {
                    counts.high += 1;
                }
            }
        }
        None => counts.high = count_at(vulns, "count"),
    }
    Some(counts)
}

/// `pip-audit -f json`; advisories carry no severity and count as high
pub fn parse_pip_audit(output: &ToolOutput) -> Option<VulnerabilityCounts> {
    let json = output.json_output()?;
    // Newer releases wrap the list in {"dependencies": [...]}
    let deps = match json.get("dependencies") {
        Some(deps) => deps.as_array()?,
        None => json.as_array()?,
    };
    let high = deps
        .iter()
        .filter_map(|d| d.get("vulns").and_then(|v| v.as_array()))
        .map(|v| v.len())
        .sum();
    Some(VulnerabilityCounts {
        high,
        ..Default::default()
    })
}

/// `npm outdated --json`: one key per outdated package; empty output means none.
/// npm exits 1 when something is outdated, so the exit code is ignored.
pub fn parse_npm_outdated(output: &ToolOutput) -> Option<usize> {
    if !output.ran() {
        return None;
    }
    if output.stdout.trim().is_empty() {
        return Some(0);
    }
    output
        .json_output()?
        .as_object()
        .map(|packages| packages.len())
}

/// `cargo outdated --format json --depth 1`
pub fn parse_cargo_outdated(output: &ToolOutput) -> Option<usize> {
    let json = output.json_output()?;
    let deps = json.get("dependencies")?.as_array()?;
    Some(
        deps.iter()
            .filter(|d| {
                let project = d.get("project").and_then(|v| v.as_str());
                let latest = d.get("latest").and_then(|v| v.as_str());
                project != latest
            })
            .count(),
    )
}

/// `pip list --outdated --format json`
pub fn parse_pip_outdated(output: &ToolOutput) -> Option<usize> {
    if !output.succeeded() {
        return None;
    }
    output.json_output()?.as_array().map(|a| a.len())
}

/// Translate audit counts into findings: one finding per severity tier
pub fn record_vulnerabilities(card: &mut ScoreCard, tool: &str, counts: VulnerabilityCounts) {
    if counts.total() == 0 {
        card.info(
            "dependencies",
            format!("{} reported no known vulnerabilities", tool),
        );
        return;
    }
    if counts.critical > 0 {
        card.deduct(
            Severity::Critical,
            "vulnerable-dependency",
            format!(
                "{} critical vulnerabilities reported by {}",
                counts.critical, tool
            ),
            CRITICAL_VULN_DEDUCTION,
        );
    }
    if counts.high > 0 {
        card.deduct(
            Severity::High,
            "vulnerable-dependency",
            format!("{} high vulnerabilities reported by {}", counts.high, tool),
            HIGH_VULN_DEDUCTION,
        );
    }
    if counts.other > 0 {
        card.deduct(
            Severity::Medium,
            "vulnerable-dependency",
            format!(
                "{} moderate/low vulnerabilities reported by {}",
                counts.other, tool
            ),
            OTHER_VULN_DEDUCTION,
        );
    }
    card.recommend(format!(
        "Upgrade vulnerable dependencies flagged by {}",
        tool
    ));
}
