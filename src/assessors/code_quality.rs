//! Code quality assessor
//!
//! Looks for lint/format tooling, pre-commit hooks, leftover markers and
//! debug statements, and oversized source files.

use super::base::{AssessmentContext, Assessor, DeductionCap, ScoreCard};
use super::CODE_QUALITY;
use crate::models::{DimensionResult, Severity};
use crate::probes::FileKind;
use crate::scanners::languages::{detect_languages, profiles};
use regex::Regex;
use std::sync::OnceLock;

pub const LARGE_FILE_LINES: usize = 1000;

/// Lint/format configs not tied to a detected language
const GENERIC_LINT_CONFIGS: &[&str] = &[
    ".pre-commit-config.yaml",
    ".editorconfig",
    ".stylelintrc*",
    ".rubocop.yml",
    ".clang-format",
    ".clang-tidy",
    "checkstyle.xml",
    ".swiftlint.yml",
    ".markdownlint*",
    ".scalafmt.conf",
    ".php-cs-fixer*",
];

const PRE_COMMIT_HOOKS: &[&str] = &[
    ".pre-commit-config.yaml",
    ".husky",
    ".githooks",
    "lefthook.yml",
    "lefthook.yaml",
    ".lefthook.yml",
];

static MARKER: OnceLock<Regex> = OnceLock::new();
static DEBUG_STATEMENT: OnceLock<Regex> = OnceLock::new();

fn marker() -> &'static Regex {
    MARKER.get_or_init(|| Regex::new(r"\b(?:TODO|FIXME|HACK|XXX)\b").unwrap())
}

fn debug_statement() -> &'static Regex {
    DEBUG_STATEMENT.get_or_init(|| {
        Regex::new(r"\bconsole\.log\(|\bdebugger;|\bdbg!\(|\bbreakpoint\(\)|\bpdb\.set_trace\(\)")
            .unwrap()
    })
}

pub struct CodeQualityAssessor;

impl CodeQualityAssessor {
    fn check_tooling(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let languages = detect_languages(ctx);

        let any_lint = ctx.any_exists(GENERIC_LINT_CONFIGS).is_some()
            || profiles().iter().any(|p| p.has_lint_config(ctx));
        if !any_lint {
            card.deduct(
                Severity::Medium,
                "linting",
                "No linter or formatter configuration found",
                15,
            );
            card.recommend("Add a linter and formatter configuration and run it in CI");
        }

        for profile in &languages {
            if !profile.has_lint_config(ctx) {
                card.deduct(
                    Severity::Low,
                    "linting",
                    format!("{} project without a lint configuration", profile.name()),
                    5,
                );
            }
        }

        if ctx.any_exists(PRE_COMMIT_HOOKS).is_none() {
            card.deduct(
                Severity::Low,
                "pre-commit",
                "No pre-commit hooks configured",
                5,
            );
            card.advise_below(90, "Set up pre-commit hooks to catch issues before they land");
        }
    }

    fn check_markers(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let markers = ctx.inventory.count_matches(marker(), |e| e.is_code());
        if markers > 50 {
            card.deduct(
                Severity::Medium,
                "todo",
                format!("{} TODO/FIXME/HACK markers in code", markers),
                10,
            );
            card.recommend("Triage TODO/FIXME markers into tracked issues");
        } else if markers > 20 {
            card.deduct(
                Severity::Low,
                "todo",
                format!("{} TODO/FIXME/HACK markers in code", markers),
                5,
            );
        } else if markers > 0 {
            card.info("todo", format!("{} TODO/FIXME/HACK markers in code", markers));
        }

        let debug = ctx
            .inventory
            .count_matches(debug_statement(), |e| e.kind == FileKind::Source);
        if debug > 10 {
            card.deduct(
                Severity::Low,
                "debug-statement",
                format!("{} debug statements left in source", debug),
                5,
            );
            card.recommend("Remove debug statements or route them through a logger");
        }
    }

    fn check_file_sizes(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let mut cap = DeductionCap::new(15);
        let mut any = false;
        for entry in ctx.inventory.of_kind(FileKind::Source) {
            let lines = entry.line_count();
            if lines > LARGE_FILE_LINES {
                any = true;
                let finding = card
                    .finding(
                        Severity::Low,
                        "large-file",
                        format!("{} lines (limit {})", lines, LARGE_FILE_LINES),
                    )
                    .at(entry.rel_str(), None);
                card.penalize(finding, cap.take(3));
            }
        }
        if any {
            card.recommend("Split very large source files into focused modules");
        }
    }
}

impl Assessor for CodeQualityAssessor {
    fn name(&self) -> &'static str {
        CODE_QUALITY
    }

    fn description(&self) -> &'static str {
        "Linting, formatting, hooks and code hygiene"
    }

    fn assess(&self, ctx: &AssessmentContext) -> DimensionResult {
        let mut card = ScoreCard::for_dimension(CODE_QUALITY, &ctx.config);
        card.advise_below(80, "Adopt consistent linting and formatting across the codebase");
        card.advise_below(70, "Prioritise a code quality cleanup before adding features");

        self.check_tooling(ctx, &mut card);
        if ctx.is_cancelled() {
            return card.finish();
        }
        self.check_markers(ctx, &mut card);
        if ctx.is_cancelled() {
            return card.finish();
        }
        self.check_file_sizes(ctx, &mut card);

        card.finish()
    }
}
