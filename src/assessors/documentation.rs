//! Documentation assessor
//!
//! README presence and shape, LICENSE, CONTRIBUTING, a docs directory for
//! larger codebases, and inline comment density.

use super::base::{AssessmentContext, Assessor, ScoreCard};
use super::DOCUMENTATION;
use crate::models::{DimensionResult, Severity};
use crate::probes::FileKind;
use regex::Regex;
use std::sync::OnceLock;

pub const MIN_README_LINES: usize = 5;
pub const DOCS_DIR_SOURCE_FILES: usize = 50;
pub const MIN_COMMENT_RATIO: f64 = 0.05;
pub const MIN_LINES_FOR_DENSITY: usize = 200;

const READMES: &[&str] = &[
    "README.md",
    "README.rst",
    "README.txt",
    "README.adoc",
    "README",
    "readme.md",
    "Readme.md",
];

const LICENSES: &[&str] = &[
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "LICENCE",
    "LICENCE.md",
    "COPYING",
    "LICENSE-*",
];

const CONTRIBUTING: &[&str] = &[
    "CONTRIBUTING.md",
    "CONTRIBUTING.rst",
    "CONTRIBUTING",
    ".github/CONTRIBUTING.md",
    "docs/CONTRIBUTING.md",
];

static INSTALL_SECTION: OnceLock<Regex> = OnceLock::new();
static USAGE_SECTION: OnceLock<Regex> = OnceLock::new();

fn install_section() -> &'static Regex {
    INSTALL_SECTION.get_or_init(|| {
        Regex::new(r"(?im)^(?:#{1,6}\s*|=+\s*)?(?:installation|installing|install|setup|getting started|quick ?start)\b")
            .unwrap()
    })
}

fn usage_section() -> &'static Regex {
    USAGE_SECTION.get_or_init(|| {
        Regex::new(r"(?im)^(?:#{1,6}\s*|=+\s*)?(?:usage|examples?|how to use|quick ?start)\b").unwrap()
    })
}

/// Line-comment prefixes for a source extension
fn comment_prefixes(extension: &str) -> &'static [&'static str] {
    match extension {
        "py" => &["#", "\"\"\"", "'''"],
        "rb" | "sh" | "bash" | "pl" | "r" => &["#"],
        "lua" | "sql" | "hs" => &["--"],
        "ex" | "exs" => &["#", "@doc", "@moduledoc"],
        "php" => &["//", "#", "/*", "*"],
        _ => &["//", "/*", "*"],
    }
}

/// (comment lines, non-empty lines) over production source files
fn comment_density(ctx: &AssessmentContext) -> (usize, usize) {
    let mut comments = 0;
    let mut total = 0;
    for entry in ctx.inventory.of_kind(FileKind::Source) {
        let Some(content) = entry.content.as_deref() else {
            continue;
        };
        let prefixes = comment_prefixes(&entry.extension);
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            total += 1;
            if prefixes.iter().any(|p| line.starts_with(p)) {
                comments += 1;
            }
        }
    }
    (comments, total)
}

pub struct DocumentationAssessor;

impl DocumentationAssessor {
    fn check_readme(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let Some(readme) = ctx.any_exists(READMES) else {
            card.deduct(Severity::High, "readme", "No README file", 30);
            card.recommend("Add a README describing what the project does and how to use it");
            return;
        };
        let content = ctx.read(&readme).unwrap_or_default();

        let lines = content.lines().filter(|l| !l.trim().is_empty()).count();
        if lines < MIN_README_LINES {
            let finding = card
                .finding(
                    Severity::Low,
                    "readme",
                    format!("README has only {} non-empty lines", lines),
                )
                .at(readme.as_str(), None);
            card.penalize(finding, 10);
            card.recommend("Expand the README with a project overview");
        }

        if !install_section().is_match(&content) {
            card.deduct(
                Severity::Low,
                "readme",
                "README has no installation section",
                5,
            );
            card.recommend("Document installation steps in the README");
        }
        if !usage_section().is_match(&content) {
            card.deduct(Severity::Low, "readme", "README has no usage section", 5);
            card.recommend("Add usage examples to the README");
        }
    }

    fn check_project_docs(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        if ctx.any_exists(LICENSES).is_none() {
            card.deduct(Severity::Medium, "license", "No LICENSE file", 15);
            card.recommend("Choose a license and add a LICENSE file");
        }

        if ctx.any_exists(CONTRIBUTING).is_none() {
            card.deduct(
                Severity::Low,
                "contributing",
                "No CONTRIBUTING guide",
                5,
            );
            card.advise_below(90, "Add CONTRIBUTING.md with setup and review guidelines");
        }

        let sources = ctx.inventory.count_kind(FileKind::Source);
        if sources > DOCS_DIR_SOURCE_FILES && !ctx.dir_exists("docs") && !ctx.dir_exists("doc") {
            card.deduct(
                Severity::Low,
                "docs-dir",
                format!("{} source files and no docs/ directory", sources),
                5,
            );
        }
    }

    fn check_comments(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let (comments, total) = comment_density(ctx);
        if total < MIN_LINES_FOR_DENSITY {
            return;
        }
        let ratio = comments as f64 / total as f64;
        let message = format!(
            "Comment density {:.1}% ({} of {} source lines)",
            ratio * 100.0,
            comments,
            total
        );
        if ratio < MIN_COMMENT_RATIO {
            card.deduct(Severity::Low, "comments", message, 5);
            card.recommend("Document non-obvious code paths and public APIs");
        } else {
            card.info("comments", message);
        }
    }
}

impl Assessor for DocumentationAssessor {
    fn name(&self) -> &'static str {
        DOCUMENTATION
    }

    fn description(&self) -> &'static str {
        "README, license, contributor docs and inline comments"
    }

    fn assess(&self, ctx: &AssessmentContext) -> DimensionResult {
        let mut card = ScoreCard::for_dimension(DOCUMENTATION, &ctx.config);
        card.advise_below(80, "Treat documentation as part of the definition of done");
        card.advise_below(70, "Write the missing core documents before the next release");

        self.check_readme(ctx, &mut card);
        if ctx.is_cancelled() {
            return card.finish();
        }
        self.check_project_docs(ctx, &mut card);
        if ctx.is_cancelled() {
            return card.finish();
        }
        self.check_comments(ctx, &mut card);

        card.finish()
    }
}
