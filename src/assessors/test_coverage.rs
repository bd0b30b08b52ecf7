//! Test coverage assessor
//!
//! Static proxy for coverage: how many test files exist relative to source
//! files, and whether coverage measurement is configured at all.

use super::base::{AssessmentContext, Assessor, ScoreCard};
use super::TEST_COVERAGE;
use crate::models::{DimensionResult, Severity};
use crate::probes::FileKind;

/// Below this test/source ratio the suite is considered sparse
pub const LOW_RATIO: f64 = 0.30;
/// Below this it is considered nearly absent
pub const VERY_LOW_RATIO: f64 = 0.10;

const COVERAGE_CONFIGS: &[&str] = &[
    ".coveragerc",
    "codecov.yml",
    ".codecov.yml",
    ".nycrc",
    ".nycrc.json",
    ".nycrc.yml",
    ".nycrc.yaml",
    "tarpaulin.toml",
    ".tarpaulin.toml",
    "coverage.xml",
    ".github/codecov.yml",
];

pub struct TestCoverageAssessor;

impl TestCoverageAssessor {
    fn has_coverage_config(&self, ctx: &AssessmentContext) -> bool {
        if ctx.any_exists(COVERAGE_CONFIGS).is_some() {
            return true;
        }
        let contains = |file: &str, needles: &[&str]| {
            ctx.read(file)
                .map(|c| needles.iter().any(|n| c.contains(n)))
                .unwrap_or(false)
        };
        contains("pyproject.toml", &["[tool.coverage", "--cov"])
            || contains("setup.cfg", &["[coverage:", "--cov"])
            || contains("tox.ini", &["--cov"])
            || contains("package.json", &["--coverage", "coverageThreshold", "\"c8\"", "\"nyc\""])
            || ctx
                .any_exists(&["jest.config.*", "vitest.config.*"])
                .and_then(|f| ctx.read(&f))
                .map(|c| c.contains("coverage"))
                .unwrap_or(false)
    }
}

impl Assessor for TestCoverageAssessor {
    fn name(&self) -> &'static str {
        TEST_COVERAGE
    }

    fn description(&self) -> &'static str {
        "Presence and proportion of tests, coverage tooling"
    }

    fn assess(&self, ctx: &AssessmentContext) -> DimensionResult {
        let mut card = ScoreCard::for_dimension(TEST_COVERAGE, &ctx.config);
        card.advise_below(90, "Add tests for untested modules");
        card.advise_below(70, "Make tests part of every change and enforce them in CI");

        let sources = ctx.inventory.count_kind(FileKind::Source);
        let tests = ctx.inventory.count_kind(FileKind::Test);

        if tests == 0 {
            card.deduct(Severity::High, "no-tests", "No test files found", 30);
            card.recommend("Create a test suite (e.g. a tests/ directory) for the core code");
        } else if sources > 0 {
            let ratio = tests as f64 / sources as f64;
            let summary = format!(
                "{} test files for {} source files ({:.0}%)",
                tests,
                sources,
                ratio * 100.0
            );
            if ratio < VERY_LOW_RATIO {
                card.deduct(Severity::Medium, "test-ratio", summary, 20);
            } else if ratio < LOW_RATIO {
                card.deduct(Severity::Low, "test-ratio", summary, 10);
            } else {
                card.info("test-ratio", summary);
            }
        } else {
            card.info("test-ratio", format!("{} test files, no source files", tests));
        }

        if ctx.is_cancelled() {
            return card.finish();
        }

        if !self.has_coverage_config(ctx) {
            card.deduct(
                Severity::Low,
                "coverage-config",
                "No coverage configuration found",
                5,
            );
            card.recommend("Measure coverage (e.g. coverage.py, nyc, tarpaulin) and publish it");
        }

        card.finish()
    }
}
