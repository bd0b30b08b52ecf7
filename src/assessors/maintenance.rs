//! Maintenance assessor
//!
//! Project upkeep signals: CI, ignore rules, update automation, changelog
//! freshness, dependency staleness, lockfiles and commit recency.

use super::base::{AssessmentContext, Assessor, ScoreCard};
use super::MAINTENANCE;
use crate::models::{DimensionResult, Severity};
use crate::probes::{days_since, file_age_days, ToolOutput};
use crate::scanners::languages::detect_languages;

pub const STALE_DAYS: i64 = 180;
pub const VERY_STALE_DAYS: i64 = 365;

const CI_CONFIGS: &[&str] = &[
    ".github/workflows/*.yml",
    ".github/workflows/*.yaml",
    ".gitlab-ci.yml",
    ".circleci/config.yml",
    "Jenkinsfile",
    ".travis.yml",
    "azure-pipelines.yml",
    "bitbucket-pipelines.yml",
    ".drone.yml",
    ".buildkite/pipeline.yml",
    ".woodpecker.yml",
];

const UPDATE_AUTOMATION: &[&str] = &[
    ".github/dependabot.yml",
    ".github/dependabot.yaml",
    "renovate.json",
    "renovate.json5",
    ".renovaterc",
    ".renovaterc.json",
    ".github/renovate.json",
];

const CHANGELOGS: &[&str] = &[
    "CHANGELOG.md",
    "CHANGELOG",
    "CHANGELOG.rst",
    "CHANGELOG.txt",
    "changelog.md",
    "CHANGES.md",
    "HISTORY.md",
];

pub struct MaintenanceAssessor;

/// Unix timestamp printed by `git log -1 --format=%ct`
fn commit_timestamp(output: &ToolOutput) -> Option<i64> {
    if !output.succeeded() {
        return None;
    }
    output.stdout.trim().parse().ok()
}

impl MaintenanceAssessor {
    fn check_project_files(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        match ctx.any_exists(CI_CONFIGS) {
            Some(ci) => card.info("ci", format!("CI configuration found: {}", ci)),
            None => {
                card.deduct(Severity::Medium, "ci", "No CI configuration found", 15);
                card.recommend("Run tests and linters in CI (e.g. GitHub Actions)");
            }
        }

        if !ctx.file_exists(".gitignore") {
            card.deduct(Severity::Low, "gitignore", "No .gitignore file", 5);
        }

        if ctx.any_exists(UPDATE_AUTOMATION).is_none() {
            card.deduct(
                Severity::Low,
                "update-automation",
                "No dependency update automation (Dependabot/Renovate)",
                3,
            );
        }
    }

    fn check_changelog(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let Some(changelog) = ctx.any_exists(CHANGELOGS) else {
            card.deduct(Severity::Low, "changelog", "No CHANGELOG file", 5);
            card.advise_below(90, "Keep a CHANGELOG for user-facing changes");
            return;
        };

        let from_git = commit_timestamp(&ctx.run_tool(
            "git",
            &["log", "-1", "--format=%ct", "--", changelog.as_str()],
        ))
        .and_then(|ts| days_since(ts, ctx.now));
        let age = from_git.or_else(|| file_age_days(&ctx.root.join(&changelog), ctx.now));

        let Some(age) = age else {
            card.info("changelog", format!("Could not determine the age of {}", changelog));
            return;
        };

        let points = if age > VERY_STALE_DAYS {
            20
        } else if age > STALE_DAYS {
            15
        } else {
            return;
        };
        let finding = card
            .finding(
                Severity::Medium,
                "changelog",
                format!("{} last updated {} days ago", changelog, age),
            )
            .at(changelog.as_str(), None);
        card.penalize(finding, points);
        card.recommend("Update the CHANGELOG with recent changes");
    }

    fn check_dependencies(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        for profile in detect_languages(ctx) {
            if ctx.is_cancelled() {
                return;
            }

            if !profile.has_lockfile(ctx) {
                card.deduct(
                    Severity::Low,
                    "lockfile",
                    format!("{} manifest without a lockfile", profile.name()),
                    5,
                );
            }

            let Some((program, args)) = profile.outdated_command() else {
                continue;
            };
            let output = ctx.run_tool(program, args);
            let tool = format!("{} {}", program, args.join(" "));
            if !output.ran() {
                let reason = output
                    .degraded_reason()
                    .unwrap_or_else(|| "did not run".to_string());
                card.info(
                    "outdated-dependencies",
                    format!("Outdated check skipped ({}): {}", tool, reason),
                );
                continue;
            }

            let Some(outdated) = profile.parse_outdated(&output) else {
                card.info(
                    "outdated-dependencies",
                    format!("{} output could not be parsed", tool),
                );
                continue;
            };

            let message = format!("{} outdated {} dependencies", outdated, profile.name());
            match outdated {
                0 => card.info("outdated-dependencies", message),
                1..=5 => card.deduct(Severity::Low, "outdated-dependencies", message, 10),
                6..=15 => card.deduct(Severity::Medium, "outdated-dependencies", message, 20),
                _ => card.deduct(Severity::Medium, "outdated-dependencies", message, 30),
            }
            if outdated > 0 {
                card.recommend(format!("Update outdated {} dependencies", profile.name()));
            }
        }
    }

    fn check_activity(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let last = commit_timestamp(&ctx.run_tool("git", &["log", "-1", "--format=%ct"]))
            .and_then(|ts| days_since(ts, ctx.now));
        match last {
            Some(days) if days > STALE_DAYS => card.deduct(
                Severity::Low,
                "activity",
                format!("Last commit was {} days ago", days),
                5,
            ),
            Some(days) => card.info("activity", format!("Last commit {} days ago", days)),
            None => card.info("activity", "Git history unavailable"),
        }
    }
}

impl Assessor for MaintenanceAssessor {
    fn name(&self) -> &'static str {
        MAINTENANCE
    }

    fn description(&self) -> &'static str {
        "CI, dependency hygiene, changelog and activity"
    }

    fn assess(&self, ctx: &AssessmentContext) -> DimensionResult {
        let mut card = ScoreCard::for_dimension(MAINTENANCE, &ctx.config);
        card.advise_below(80, "Automate dependency updates and release notes");
        card.advise_below(70, "Schedule regular maintenance: dependency bumps, CI fixes, changelog");

        self.check_project_files(ctx, &mut card);
        if ctx.is_cancelled() {
            return card.finish();
        }
        self.check_changelog(ctx, &mut card);
        if ctx.is_cancelled() {
            return card.finish();
        }
        self.check_dependencies(ctx, &mut card);
        if ctx.is_cancelled() {
            return card.finish();
        }
        self.check_activity(ctx, &mut card);

        card.finish()
    }
}
