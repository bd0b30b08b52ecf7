//! Health score aggregation
//!
//! Combines per-dimension results into one [`HealthReport`]. Pure: no
//! filesystem access, no clock unless [`aggregate`] is used.
//!
//! # Scoring Formula
//!
//! ```text
//! overall = clamp(round(Σ(score_i × weight_i) / Σ(weight_i)), 0, 100)
//! ```
//!
//! Only completed dimensions take part. A dimension that timed out keeps its
//! INFO finding in the report but has no influence on the score.
//!
//! # Status
//!
//! 1. Highest threshold label the overall score meets (default Excellent ≥ 90,
//!    Good ≥ 70, Fair ≥ 50, Poor ≥ 30, else Critical).
//! 2. Any CRITICAL-severity finding forces Critical.
//! 3. Excellent is capped at Good when a completed dimension scores below
//!    the `good` threshold.

use crate::config::Config;
use crate::models::{
    DimensionResult, Finding, FindingsSummary, HealthReport, HealthStatus, Severity,
};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Aggregate results into a report stamped with the current time
pub fn aggregate(results: Vec<DimensionResult>, config: &Config, target: &str) -> HealthReport {
    aggregate_at(results, config, target, Utc::now())
}

/// Aggregate results with an explicit timestamp
pub fn aggregate_at(
    results: Vec<DimensionResult>,
    config: &Config,
    target: &str,
    generated_at: DateTime<Utc>,
) -> HealthReport {
    let overall_score = overall_score(&results);
    let status = status_for(&results, overall_score, config);
    debug!("Overall score {} -> {}", overall_score, status);

    let mut critical_findings: Vec<Finding> = results
        .iter()
        .flat_map(|d| d.findings.iter())
        .filter(|f| f.severity.is_blocking())
        .cloned()
        .collect();
    let mut warnings: Vec<Finding> = results
        .iter()
        .flat_map(|d| d.findings.iter())
        .filter(|f| f.severity.is_warning())
        .cloned()
        .collect();
    // stable: ties keep dimension order
    critical_findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    warnings.sort_by(|a, b| b.severity.cmp(&a.severity));

    let findings_summary = FindingsSummary::from_findings(results.iter().flat_map(|d| &d.findings));

    HealthReport {
        target: target.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        overall_score,
        status,
        dimensions: results,
        critical_findings,
        warnings,
        findings_summary,
        generated_at,
    }
}

/// Weighted mean over completed dimensions, rounded half away from zero
pub fn overall_score(results: &[DimensionResult]) -> u32 {
    let (weighted, total_weight) = results
        .iter()
        .filter(|d| d.completed && d.weight > 0)
        .fold((0u64, 0u64), |(sum, weights), d| {
            (
                sum + u64::from(d.score.min(100)) * u64::from(d.weight),
                weights + u64::from(d.weight),
            )
        });
    if total_weight == 0 {
        return 0;
    }
    let score = (weighted as f64 / total_weight as f64).round() as u32;
    score.min(100)
}

/// Threshold label for a bare score
pub fn status_for_score(score: u32, config: &Config) -> HealthStatus {
    HealthStatus::RANKED
        .iter()
        .copied()
        .find(|status| config.threshold(*status).is_some_and(|min| score >= min))
        .unwrap_or(HealthStatus::Critical)
}

fn status_for(results: &[DimensionResult], overall: u32, config: &Config) -> HealthStatus {
    let has_critical = results
        .iter()
        .flat_map(|d| d.findings.iter())
        .any(|f| f.severity == Severity::Critical);
    if has_critical {
        return HealthStatus::Critical;
    }

    let status = status_for_score(overall, config);
    if status == HealthStatus::Excellent {
        let good = config.threshold(HealthStatus::Good).unwrap_or(0);
        if let Some(weakest) = results
            .iter()
            .filter(|d| d.completed)
            .find(|d| d.score < good)
        {
            debug!(
                "{} scored {} (< {}), capping status at GOOD",
                weakest.name, weakest.score, good
            );
            return HealthStatus::Good;
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Finding;

    fn dim(name: &str, score: u32, weight: u32, findings: Vec<Finding>) -> DimensionResult {
        DimensionResult {
            name: name.to_string(),
            score,
            weight,
            findings,
            recommendations: Vec::new(),
            completed: true,
        }
    }

    fn finding(severity: Severity, dimension: &str) -> Finding {
        Finding::new(severity, "test", format!("{} finding", severity), dimension)
    }

    #[test]
    fn test_weighted_average() {
        let results = vec![dim("a", 100, 20, vec![]), dim("b", 50, 20, vec![])];
        assert_eq!(overall_score(&results), 75);

        let results = vec![dim("a", 100, 30, vec![]), dim("b", 0, 10, vec![])];
        assert_eq!(overall_score(&results), 75);

        // 96.5 rounds up
        let results = vec![dim("a", 100, 1, vec![]), dim("b", 93, 1, vec![])];
        assert_eq!(overall_score(&results), 97);
    }

    #[test]
    fn test_incomplete_dimensions_are_excluded() {
        let mut results = vec![dim("a", 80, 20, vec![])];
        results.push(DimensionResult::incomplete("b", 20, "run timeout"));
        assert_eq!(overall_score(&results), 80);

        let report = aggregate(results, &Config::default(), ".");
        assert_eq!(report.findings_summary.info, 1);
        assert_eq!(report.dimensions.len(), 2);
    }

    #[test]
    fn test_no_completed_dimensions() {
        let results = vec![DimensionResult::incomplete("a", 20, "run timeout")];
        let report = aggregate(results, &Config::default(), ".");
        assert_eq!(report.overall_score, 0);
        assert_eq!(report.status, HealthStatus::Critical);
    }

    #[test]
    fn test_status_thresholds() {
        let config = Config::default();
        assert_eq!(status_for_score(100, &config), HealthStatus::Excellent);
        assert_eq!(status_for_score(90, &config), HealthStatus::Excellent);
        assert_eq!(status_for_score(89, &config), HealthStatus::Good);
        assert_eq!(status_for_score(70, &config), HealthStatus::Good);
        assert_eq!(status_for_score(50, &config), HealthStatus::Fair);
        assert_eq!(status_for_score(30, &config), HealthStatus::Poor);
        assert_eq!(status_for_score(29, &config), HealthStatus::Critical);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = Config::from_toml_str("[thresholds]\nexcellent = 95\n").unwrap();
        assert_eq!(status_for_score(94, &config), HealthStatus::Good);
    }

    #[test]
    fn test_critical_finding_forces_critical_status() {
        let results = vec![
            dim("a", 100, 20, vec![]),
            dim("b", 75, 20, vec![finding(Severity::Critical, "b")]),
        ];
        let report = aggregate(results, &Config::default(), ".");
        assert_eq!(report.overall_score, 88);
        assert_eq!(report.status, HealthStatus::Critical);
    }

    #[test]
    fn test_weak_dimension_caps_excellent() {
        let results = vec![
            dim("a", 100, 20, vec![]),
            dim("b", 100, 20, vec![]),
            dim("c", 100, 20, vec![]),
            dim("d", 65, 15, vec![finding(Severity::Medium, "d")]),
        ];
        let report = aggregate(results, &Config::default(), ".");
        assert_eq!(report.overall_score, 93);
        assert_eq!(report.status, HealthStatus::Good);
    }

    #[test]
    fn test_findings_partitioned_and_sorted() {
        let results = vec![
            dim(
                "a",
                60,
                20,
                vec![
                    finding(Severity::Low, "a"),
                    finding(Severity::High, "a"),
                    finding(Severity::Info, "a"),
                ],
            ),
            dim(
                "b",
                60,
                20,
                vec![finding(Severity::Critical, "b"), finding(Severity::Medium, "b")],
            ),
        ];
        let report = aggregate(results, &Config::default(), ".");
        let critical: Vec<Severity> = report.critical_findings.iter().map(|f| f.severity).collect();
        let warnings: Vec<Severity> = report.warnings.iter().map(|f| f.severity).collect();
        assert_eq!(critical, vec![Severity::Critical, Severity::High]);
        assert_eq!(warnings, vec![Severity::Medium, Severity::Low]);
        assert_eq!(report.findings_summary.total, 5);
        assert_eq!(report.findings_summary.info, 1);
    }

    #[test]
    fn test_aggregation_ignores_result_order() {
        let forward = vec![
            dim("a", 40, 20, vec![finding(Severity::Low, "a")]),
            dim("b", 90, 10, vec![]),
        ];
        let mut backward = forward.clone();
        backward.reverse();
        let config = Config::default();
        let ts = Utc::now();
        let a = aggregate_at(forward, &config, ".", ts);
        let b = aggregate_at(backward, &config, ".", ts);
        assert_eq!(a.overall_score, b.overall_score);
        assert_eq!(a.status, b.status);
        assert_eq!(a.findings_summary, b.findings_summary);
    }
}
