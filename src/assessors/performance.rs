//! Performance assessor, backed by the performance analyzer

use super::base::{AssessmentContext, Assessor, ScoreCard};
use super::PERFORMANCE;
use crate::models::DimensionResult;
use crate::scanners::PerformanceAnalyzer;

pub struct PerformanceAssessor;

impl Assessor for PerformanceAssessor {
    fn name(&self) -> &'static str {
        PERFORMANCE
    }

    fn description(&self) -> &'static str {
        "Asset sizes, front-end delivery and API hygiene"
    }

    fn assess(&self, ctx: &AssessmentContext) -> DimensionResult {
        let mut card = ScoreCard::for_dimension(PERFORMANCE, &ctx.config);
        card.advise_below(90, "Profile the heaviest assets and endpoints");
        card.advise_below(70, "Add a performance budget check to CI");

        PerformanceAnalyzer::new().analyze(ctx, &mut card);

        card.finish()
    }
}
