//! Configuration module for repo-health
//!
//! This module handles:
//! - Project-level configuration (health.toml, .healthrc.json, .health.yaml)
//! - Dimension weights and status thresholds
//! - Whitelist patterns that suppress raw security matches
//! - Path exclusions

mod project_config;

pub use project_config::{
    load_config, Config, DEFAULT_EXCLUDE_PATTERNS, DEFAULT_THRESHOLDS, DEFAULT_WEIGHTS,
    DEFAULT_WHITELIST_PATTERNS, FALLBACK_WEIGHT, WHITELIST_FILE,
};
pub(crate) use project_config::build_exclude_set;
