//! Specialized scanners
//!
//! Richer checks invoked from inside a dimension assessor:
//! - `secrets`: signature catalogue with whitelist suppression
//! - `performance`: bundle/image sizes and front-end/API heuristics
//! - `dep_audit`: package-tool output parsing
//! - `languages`: per-language profiles (lint configs, lockfiles, tools)

pub mod dep_audit;
pub mod languages;
pub mod performance;
pub mod secrets;
pub mod whitelist;

pub use dep_audit::VulnerabilityCounts;
pub use languages::{detect_languages, profiles, LanguageProfile};
pub use performance::PerformanceAnalyzer;
pub use secrets::{ScanStats, SecurityScanner};
pub use whitelist::Whitelist;
