//! Security assessor
//!
//! Wraps the security scanner (text signatures and env-file coverage) and
//! the per-language dependency audits.

use super::base::{AssessmentContext, Assessor, ScoreCard};
use super::SECURITY;
use crate::models::DimensionResult;
use crate::scanners::dep_audit::record_vulnerabilities;
use crate::scanners::languages::detect_languages;
use crate::scanners::SecurityScanner;
use tracing::debug;

pub struct SecurityAssessor;

impl SecurityAssessor {
    fn audit_dependencies(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let mut audited = false;
        for profile in detect_languages(ctx) {
            let Some((program, args)) = profile.audit_command() else {
                continue;
            };
            if ctx.is_cancelled() {
                return;
            }
            audited = true;
            let tool = format!("{} {}", program, args.first().copied().unwrap_or_default());
            let output = ctx.run_tool(program, args);

            if !output.ran() {
                let reason = output
                    .degraded_reason()
                    .unwrap_or_else(|| "did not run".to_string());
                card.info(
                    "dependency-audit",
                    format!("{} dependency audit skipped: {} {}", profile.name(), tool, reason),
                );
                continue;
            }

            match profile.parse_audit(&output) {
                Some(counts) => {
                    debug!("{}: {:?}", tool, counts);
                    record_vulnerabilities(card, &tool, counts);
                }
                None => card.info(
                    "dependency-audit",
                    format!("{} output could not be parsed", tool),
                ),
            }
        }

        if !audited {
            card.info(
                "dependency-audit",
                "No dependency manifest with a supported audit tool",
            );
        }
    }
}

impl Assessor for SecurityAssessor {
    fn name(&self) -> &'static str {
        SECURITY
    }

    fn description(&self) -> &'static str {
        "Hardcoded secrets, risky code patterns and vulnerable dependencies"
    }

    fn assess(&self, ctx: &AssessmentContext) -> DimensionResult {
        let mut card = ScoreCard::for_dimension(SECURITY, &ctx.config);
        card.advise_below(90, "Review the security findings and rotate any exposed credentials");
        card.advise_below(
            70,
            "Move secrets to environment variables or a secrets manager and add secret scanning to CI",
        );

        let scanner = SecurityScanner::new(&ctx.config.whitelist_patterns);
        let stats = scanner.scan(ctx, &mut card);
        debug!(
            "Security scan: {} files, {} matches, {} whitelisted",
            stats.files_scanned, stats.matches, stats.suppressed
        );
        if ctx.is_cancelled() {
            return card.finish();
        }

        scanner.check_env_files(ctx, &mut card);
        self.audit_dependencies(ctx, &mut card);

        card.finish()
    }
}
