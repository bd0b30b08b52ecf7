//! Dimension assessors
//!
//! Each assessor scores one health dimension independently of the others:
//!
//! - `code_quality` - lint/format tooling, hooks, markers, oversized files
//! - `test_coverage` - test presence, test/source ratio, coverage tooling
//! - `security` - secret signatures, risky code, env files, dependency audits
//! - `performance` - asset sizes, front-end delivery, API hygiene
//! - `maintenance` - CI, changelog, dependency staleness, activity
//! - `documentation` - README, LICENSE, CONTRIBUTING, comment density
//!
//! New dimensions are added by implementing [`Assessor`] and registering it;
//! the aggregator and orchestrator never name a dimension.

pub mod base;
mod code_quality;
mod documentation;
mod maintenance;
mod performance;
mod security;
mod test_coverage;

pub use base::{AssessmentContext, Assessor, DeductionCap, ScoreCard};
pub use code_quality::CodeQualityAssessor;
pub use documentation::DocumentationAssessor;
pub use maintenance::MaintenanceAssessor;
pub use performance::PerformanceAssessor;
pub use security::SecurityAssessor;
pub use test_coverage::TestCoverageAssessor;

use crate::error::{HealthError, HealthResult};
use std::sync::Arc;

pub const CODE_QUALITY: &str = "code_quality";
pub const TEST_COVERAGE: &str = "test_coverage";
pub const SECURITY: &str = "security";
pub const PERFORMANCE: &str = "performance";
pub const MAINTENANCE: &str = "maintenance";
pub const DOCUMENTATION: &str = "documentation";

/// The six built-in assessors, in report order
pub fn default_assessors() -> Vec<Arc<dyn Assessor>> {
    vec![
        Arc::new(CodeQualityAssessor),
        Arc::new(TestCoverageAssessor),
        Arc::new(SecurityAssessor),
        Arc::new(PerformanceAssessor),
        Arc::new(MaintenanceAssessor),
        Arc::new(DocumentationAssessor),
    ]
}

/// Ordered set of assessors for one run.
///
/// Registration order is report order. Names are unique; registering a
/// second assessor under an existing name replaces the first in place.
#[derive(Clone, Default)]
pub struct AssessorRegistry {
    assessors: Vec<Arc<dyn Assessor>>,
}

impl AssessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for assessor in default_assessors() {
            registry.register(assessor);
        }
        registry
    }

    pub fn register(&mut self, assessor: Arc<dyn Assessor>) {
        match self
            .assessors
            .iter_mut()
            .find(|a| a.name() == assessor.name())
        {
            Some(slot) => *slot = assessor,
            None => self.assessors.push(assessor),
        }
    }

    pub fn assessors(&self) -> &[Arc<dyn Assessor>] {
        &self.assessors
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.assessors.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.assessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assessors.is_empty()
    }

    /// Keep only the named dimensions, preserving registry order.
    /// An empty list keeps everything; an unknown name is a config error.
    pub fn only(self, names: &[String]) -> HealthResult<Self> {
        if names.is_empty() {
            return Ok(self);
        }
        for name in names {
            if !self.assessors.iter().any(|a| a.name() == name) {
                return Err(HealthError::InvalidConfig(format!(
                    "unknown dimension '{}' (expected one of: {})",
                    name,
                    self.names().join(", ")
                )));
            }
        }
        Ok(Self {
            assessors: self
                .assessors
                .into_iter()
                .filter(|a| names.iter().any(|n| n == a.name()))
                .collect(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AssessmentContext;
    use crate::config::Config;
    use crate::probes::{
        CancellationToken, DisabledToolRunner, FileInventory, ToolInvocation, ToolOutput,
        ToolRunner,
    };
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    /// Canned tool responses keyed by `program arg1 arg2 ...`.
    /// Anything not registered behaves as if the tool were not installed.
    #[derive(Default)]
    pub struct FakeTools {
        responses: HashMap<String, ToolOutput>,
    }

    impl FakeTools {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(mut self, command: &str, output: ToolOutput) -> Self {
            self.responses.insert(command.to_string(), output);
            self
        }
    }

    impl ToolRunner for FakeTools {
        fn run(&self, invocation: &ToolInvocation) -> ToolOutput {
            self.responses
                .get(&invocation.display())
                .cloned()
                .unwrap_or_else(|| ToolOutput::unavailable(&invocation.program))
        }
    }

    fn context(root: &Path, tools: Arc<dyn ToolRunner>) -> AssessmentContext {
        let config = Arc::new(Config::default());
        let inventory = Arc::new(FileInventory::scan(root, &config));
        AssessmentContext::new(root, config, tools, CancellationToken::new(), inventory)
    }

    pub fn context_for(root: &Path) -> AssessmentContext {
        context(root, Arc::new(DisabledToolRunner))
    }

    pub fn context_with_tools(root: &Path, tools: FakeTools) -> AssessmentContext {
        context(root, Arc::new(tools))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_order() {
        let registry = AssessorRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec![
                CODE_QUALITY,
                TEST_COVERAGE,
                SECURITY,
                PERFORMANCE,
                MAINTENANCE,
                DOCUMENTATION
            ]
        );
    }

    #[test]
    fn test_only_filters_and_rejects_unknown() {
        let registry = AssessorRegistry::with_defaults()
            .only(&["documentation".to_string(), "security".to_string()])
            .unwrap();
        assert_eq!(registry.names(), vec![SECURITY, DOCUMENTATION]);

        let err = AssessorRegistry::with_defaults()
            .only(&["style".to_string()])
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown dimension 'style'"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = AssessorRegistry::with_defaults();
        registry.register(Arc::new(SecurityAssessor));
        assert_eq!(registry.len(), 6);
    }
}
