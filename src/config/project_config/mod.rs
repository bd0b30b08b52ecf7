//! Project-level configuration support
//!
//! Loads per-project configuration from `health.toml`, `.healthrc.json`,
//! or `.health.yaml` files in the repository root, or from an explicit path.
//!
//! # Configuration Format
//!
//! ```toml
//! # health.toml
//!
//! whitelist_patterns = ["internal.example.org", "203.0.113.*"]
//! exclude_paths = ["generated/", "fixtures/"]
//! tool_timeout_secs = 20
//! run_timeout_secs = 120
//!
//! [weights]
//! security = 30
//! performance = 5
//!
//! [thresholds]
//! excellent = 95
//! good = 75
//! ```
//!
//! Maps merge per key over the built-in defaults. Lists extend the built-in
//! defaults unless `skip_default_whitelist` / `skip_default_excludes` is set.
//! A malformed file is fatal: the run stops before any assessor starts.

use crate::error::{HealthError, HealthResult};
use crate::models::HealthStatus;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Built-in dimension weights. They need not sum to 100.
pub const DEFAULT_WEIGHTS: &[(&str, u32)] = &[
    ("code_quality", 20),
    ("test_coverage", 20),
    ("security", 20),
    ("performance", 10),
    ("maintenance", 15),
    ("documentation", 15),
];

/// Weight used for a registered dimension with no configured weight
pub const FALLBACK_WEIGHT: u32 = 10;

/// Minimum overall score per status, best first. Below `poor` is critical.
pub const DEFAULT_THRESHOLDS: &[(&str, u32)] =
    &[("excellent", 90), ("good", 70), ("fair", 50), ("poor", 30)];

/// Raw matches hitting any of these are dropped before becoming findings.
/// Entries with `*`/`?` are anchored globs; plain entries match as substrings.
pub const DEFAULT_WHITELIST_PATTERNS: &[&str] = &[
    "10.*",
    "192.168.*",
    "172.16.*",
    "172.17.*",
    "172.18.*",
    "172.19.*",
    "172.2?.*",
    "172.30.*",
    "172.31.*",
    "127.*",
    "169.254.*",
    "0.0.0.0",
    "255.255.255.*",
    "localhost",
    "example.com",
    "example.org",
    "CHANGEME",
    "CHANGE_ME",
    "REPLACE_ME",
    "placeholder",
    "your-*",
    "your_*",
    "<*>",
    "${*}",
    "{{*}}",
    "xxxx",
    "dummy",
];

/// Built-in exclusion patterns for vendored, generated and tool directories.
/// These are applied automatically unless `skip_default_excludes = true`.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/.git/**",
    "**/node_modules/**",
    "**/vendor/**",
    "**/third_party/**",
    "**/target/**",
    "**/dist/**",
    "**/build/**",
    "**/__pycache__/**",
    "**/.venv/**",
    "**/venv/**",
    "**/*.min.js",
    "**/*.min.css",
    "**/*.lock",
    "**/package-lock.json",
];

/// Per-project whitelist file, one pattern per line
pub const WHITELIST_FILE: &str = ".health-whitelist";

const CONFIG_CANDIDATES: &[&str] = &[
    "health.toml",
    ".healthrc.json",
    ".health.yaml",
    ".health.yml",
];

const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// On-disk shape. Every field is optional so absent fields fall back to defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    weights: BTreeMap<String, i64>,

    #[serde(default)]
    thresholds: BTreeMap<String, i64>,

    #[serde(default, alias = "whitelistPatterns")]
    whitelist_patterns: Vec<String>,

    #[serde(default, alias = "excludePaths")]
    exclude_paths: Vec<String>,

    #[serde(default, alias = "skipDefaultWhitelist")]
    skip_default_whitelist: bool,

    #[serde(default, alias = "skipDefaultExcludes")]
    skip_default_excludes: bool,

    #[serde(default, alias = "toolTimeoutSecs")]
    tool_timeout_secs: Option<u64>,

    #[serde(default, alias = "runTimeoutSecs")]
    run_timeout_secs: Option<u64>,

    #[serde(default, alias = "externalTools")]
    external_tools: Option<bool>,
}

/// Resolved, immutable configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub weights: BTreeMap<String, u32>,
    pub thresholds: BTreeMap<String, u32>,
    pub whitelist_patterns: Vec<String>,
    pub exclude_paths: Vec<String>,
    /// Per-call bound for external tool invocations
    pub tool_timeout_secs: u64,
    /// Global run bound; `None` waits for every assessor
    pub run_timeout_secs: Option<u64>,
    /// Whether assessors may shell out to audit/outdated tools
    pub external_tools: bool,
    /// Where the config came from, if anywhere
    pub source: Option<PathBuf>,
    exclude_set: GlobSet,
    /// Only the patterns the project listed, without the built-in defaults
    user_exclude_set: GlobSet,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(ConfigFile::default(), None)
            .unwrap_or_else(|_| unreachable!("built-in defaults are valid"))
    }
}

impl Config {
    /// Load a config file by path. The format follows the file extension
    /// (`.json`, `.yaml`/`.yml`, anything else is TOML).
    pub fn from_file(path: &Path) -> HealthResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| HealthError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file = parse_config_file(path, &content)?;
        Self::resolve(file, Some(path.to_path_buf()))
    }

    /// Parse a TOML config string (used by tests and `from_file`)
    pub fn from_toml_str(content: &str) -> HealthResult<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| HealthError::ConfigParse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        Self::resolve(file, None)
    }

    fn resolve(file: ConfigFile, source: Option<PathBuf>) -> HealthResult<Self> {
        let mut weights: BTreeMap<String, u32> = DEFAULT_WEIGHTS
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        for (name, value) in file.weights {
            if value <= 0 {
                return Err(HealthError::InvalidConfig(format!(
                    "weight for '{}' must be greater than 0 (got {})",
                    name, value
                )));
            }
            let value = u32::try_from(value).map_err(|_| {
                HealthError::InvalidConfig(format!("weight for '{}' is too large", name))
            })?;
            weights.insert(name, value);
        }

        let mut thresholds: BTreeMap<String, u32> = DEFAULT_THRESHOLDS
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        for (label, value) in file.thresholds {
            let label = label.to_lowercase();
            if !thresholds.contains_key(&label) {
                return Err(HealthError::InvalidConfig(format!(
                    "unknown threshold '{}' (expected excellent, good, fair, poor)",
                    label
                )));
            }
            if !(0..=100).contains(&value) {
                return Err(HealthError::InvalidConfig(format!(
                    "threshold '{}' must be between 0 and 100 (got {})",
                    label, value
                )));
            }
            thresholds.insert(label, value as u32);
        }
        let ladder: Vec<(&str, u32)> = ["excellent", "good", "fair", "poor"]
            .iter()
            .map(|label| (*label, thresholds.get(*label).copied().unwrap_or(0)))
            .collect();
        for pair in ladder.windows(2) {
            let ((upper, upper_min), (lower, lower_min)) = (pair[0], pair[1]);
            if upper_min < lower_min {
                return Err(HealthError::InvalidConfig(format!(
                    "threshold '{}' ({}) must not be below '{}' ({})",
                    upper, upper_min, lower, lower_min
                )));
            }
        }

        let whitelist_patterns = merge_lists(
            DEFAULT_WHITELIST_PATTERNS,
            file.whitelist_patterns,
            file.skip_default_whitelist,
        );
        let user_exclude_set = build_exclude_set(&file.exclude_paths)?;
        let exclude_paths = merge_lists(
            DEFAULT_EXCLUDE_PATTERNS,
            file.exclude_paths,
            file.skip_default_excludes,
        );
        let exclude_set = build_exclude_set(&exclude_paths)?;

        if file.tool_timeout_secs == Some(0) {
            return Err(HealthError::InvalidConfig(
                "tool_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            weights,
            thresholds,
            whitelist_patterns,
            exclude_paths,
            tool_timeout_secs: file.tool_timeout_secs.unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
            run_timeout_secs: file.run_timeout_secs.filter(|s| *s > 0),
            external_tools: file.external_tools.unwrap_or(true),
            source,
            exclude_set,
            user_exclude_set,
        })
    }

    /// Weight for a dimension; unknown dimensions get `FALLBACK_WEIGHT`
    pub fn weight_for(&self, dimension: &str) -> u32 {
        self.weights
            .get(dimension)
            .copied()
            .unwrap_or(FALLBACK_WEIGHT)
    }

    /// Minimum score for a status (`None` for `Critical`)
    pub fn threshold(&self, status: HealthStatus) -> Option<u32> {
        self.thresholds.get(status.key()).copied()
    }

    /// Check if a path (relative to the assessed root) should be excluded
    pub fn should_exclude(&self, rel_path: &Path) -> bool {
        let normalized = rel_path.to_string_lossy().replace('\\', "/");
        self.exclude_set.is_match(normalized.trim_start_matches("./"))
    }

    /// Check a path against the project's own exclude patterns only.
    ///
    /// Walks that deliberately enter directories the defaults prune (build
    /// output, for instance) still honour what the user asked for.
    pub fn excluded_by_user(&self, rel_path: &Path) -> bool {
        let normalized = rel_path.to_string_lossy().replace('\\', "/");
        self.user_exclude_set
            .is_match(normalized.trim_start_matches("./"))
    }

    /// Append patterns from a per-project whitelist file
    pub fn with_extra_whitelist(mut self, patterns: impl IntoIterator<Item = String>) -> Self {
        for p in patterns {
            if !self.whitelist_patterns.contains(&p) {
                self.whitelist_patterns.push(p);
            }
        }
        self
    }

    /// Override the per-call tool timeout
    pub fn with_tool_timeout(mut self, secs: u64) -> Self {
        if secs > 0 {
            self.tool_timeout_secs = secs;
        }
        self
    }

    /// Override the global run timeout
    pub fn with_run_timeout(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.run_timeout_secs = Some(secs).filter(|s| *s > 0);
        }
        self
    }

    /// Disable external tools for this run
    pub fn without_external_tools(mut self) -> Self {
        self.external_tools = false;
        self
    }
}

/// Load configuration for `repo_path`.
///
/// `explicit` wins when given. Otherwise searches, in order:
/// 1. `health.toml`
/// 2. `.healthrc.json`
/// 3. `.health.yaml` / `.health.yml`
///
/// Returns defaults if no config file is found. Patterns from
/// `.health-whitelist` are appended in every case.
pub fn load_config(repo_path: &Path, explicit: Option<&Path>) -> HealthResult<Config> {
    let config = match explicit {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::from_file(path)?
        }
        None => match CONFIG_CANDIDATES
            .iter()
            .map(|name| repo_path.join(name))
            .find(|p| p.is_file())
        {
            Some(path) => {
                debug!("Loaded project config from {}", path.display());
                Config::from_file(&path)?
            }
            None => {
                debug!("No project config found, using defaults");
                Config::default()
            }
        },
    };

    let whitelist_path = repo_path.join(WHITELIST_FILE);
    if whitelist_path.is_file() {
        let content =
            std::fs::read_to_string(&whitelist_path).map_err(|source| HealthError::ConfigRead {
                path: whitelist_path.clone(),
                source,
            })?;
        let extra = parse_whitelist_file(&content);
        debug!(
            "Loaded {} whitelist patterns from {}",
            extra.len(),
            whitelist_path.display()
        );
        return Ok(config.with_extra_whitelist(extra));
    }

    Ok(config)
}

fn parse_config_file(path: &Path, content: &str) -> HealthResult<ConfigFile> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let parsed = match ext.as_str() {
        "json" => serde_json::from_str::<ConfigFile>(content).map_err(|e| e.to_string()),
        "yaml" | "yml" => {
            // An empty YAML document means "all defaults"
            if content.trim().is_empty() {
                Ok(ConfigFile::default())
            } else {
                serde_yaml::from_str::<ConfigFile>(content).map_err(|e| e.to_string())
            }
        }
        _ => toml::from_str::<ConfigFile>(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| HealthError::ConfigParse {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_whitelist_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Defaults + user entries, deduplicated, user order preserved
fn merge_lists(defaults: &[&str], user: Vec<String>, skip_defaults: bool) -> Vec<String> {
    let mut merged: Vec<String> = if skip_defaults {
        Vec::new()
    } else {
        defaults.iter().map(|s| s.to_string()).collect()
    };
    for p in user {
        if !merged.contains(&p) {
            merged.push(p);
        }
    }
    merged
}

/// Expand a user-facing exclusion pattern into the globs that implement it.
///
/// - `generated/` matches the directory and everything below it
/// - `docs` (no wildcard) matches that root-relative path and everything below it
/// - `**/x/**` also matches the directory `x` itself so walks can prune it
pub(crate) fn expand_exclude_pattern(pattern: &str) -> Vec<String> {
    let p = pattern.trim().trim_start_matches("./");
    if p.is_empty() {
        return Vec::new();
    }
    if let Some(dir) = p.strip_suffix('/') {
        return vec![dir.to_string(), format!("{}/**", dir)];
    }
    if let Some(dir) = p.strip_suffix("/**") {
        return vec![p.to_string(), dir.to_string()];
    }
    if !p.contains(['*', '?', '[']) {
        return vec![p.to_string(), format!("{}/**", p)];
    }
    vec![p.to_string()]
}

pub(crate) fn build_exclude_set(patterns: &[String]) -> HealthResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        for expanded in expand_exclude_pattern(pattern) {
            let glob = Glob::new(&expanded).map_err(|e| {
                HealthError::InvalidConfig(format!("invalid exclude pattern '{}': {}", pattern, e))
            })?;
            builder.add(glob);
        }
    }
    builder
        .build()
        .map_err(|e| HealthError::InvalidConfig(format!("invalid exclude patterns: {}", e)))
}
