//! Filesystem and text probes
//!
//! Small primitives shared by every assessor: existence checks, pattern
//! counts, file ages, the file inventory and external tool invocation.

pub mod external_tool;
pub mod inventory;

pub use external_tool::{
    CancellationToken, DisabledToolRunner, SystemToolRunner, ToolInvocation, ToolOutput,
    ToolRunner,
};
pub use inventory::{classify, is_test_file, FileEntry, FileInventory, FileKind, IGNORE_FILE};

use crate::config::build_exclude_set;
use crate::error::HealthResult;
use chrono::{DateTime, Utc};
use globset::Glob;
use regex::Regex;
use std::path::Path;

/// Check if a regular file exists at `root/rel`
pub fn file_exists(root: &Path, rel: &str) -> bool {
    root.join(rel).is_file()
}

/// Check if a directory exists at `root/rel`
pub fn dir_exists(root: &Path, rel: &str) -> bool {
    root.join(rel).is_dir()
}

/// Return the first candidate that exists (file or directory).
///
/// The last path component may contain `*`/`?` wildcards, e.g. `.eslintrc*`
/// or `.github/workflows/*.yml`. Wildcard matches are resolved in sorted
/// order so the answer is stable.
pub fn any_exists(root: &Path, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        if !candidate.contains(['*', '?']) {
            return root.join(candidate).exists().then(|| candidate.to_string());
        }
        let (parent, pattern) = match candidate.rsplit_once('/') {
            Some((parent, pattern)) => (parent, pattern),
            None => ("", *candidate),
        };
        let matcher = Glob::new(pattern).ok()?.compile_matcher();
        let mut names: Vec<String> = std::fs::read_dir(root.join(parent))
            .ok()?
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|name| matcher.is_match(name))
            .collect();
        names.sort();
        names.into_iter().next().map(|name| {
            if parent.is_empty() {
                name
            } else {
                format!("{}/{}", parent, name)
            }
        })
    })
}

/// Count occurrences of `pattern` in readable text files under `root`,
/// skipping paths that match any of `exclude_globs`
pub fn count_matches(root: &Path, pattern: &Regex, exclude_globs: &[String]) -> HealthResult<usize> {
    let exclude_set = build_exclude_set(exclude_globs)?;
    let inventory = FileInventory::scan_filtered(root, move |rel| {
        exclude_set.is_match(rel.to_string_lossy().replace('\\', "/"))
    });
    Ok(inventory.count_matches(pattern, |_| true))
}

/// Whole days since `path` was last modified
pub fn file_age_days(path: &Path, now: DateTime<Utc>) -> Option<i64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let modified: DateTime<Utc> = modified.into();
    Some((now - modified).num_days().max(0))
}

/// Whole days between a unix timestamp and `now`
pub fn days_since(unix_secs: i64, now: DateTime<Utc>) -> Option<i64> {
    let then = DateTime::<Utc>::from_timestamp(unix_secs, 0)?;
    Some((now - then).num_days().max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_existence_probes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".github/workflows")).unwrap();
        fs::write(root.join(".github/workflows/ci.yml"), "on: push").unwrap();
        fs::write(root.join(".eslintrc.json"), "{}").unwrap();

        assert!(file_exists(root, ".eslintrc.json"));
        assert!(!file_exists(root, ".github"));
        assert!(dir_exists(root, ".github/workflows"));

        assert_eq!(
            any_exists(root, &[".eslintrc", ".eslintrc*"]).as_deref(),
            Some(".eslintrc.json")
        );
        assert_eq!(
            any_exists(root, &[".gitlab-ci.yml", ".github/workflows/*.yml"]).as_deref(),
            Some(".github/workflows/ci.yml")
        );
        assert!(any_exists(root, &["Jenkinsfile", "ci/*.yml"]).is_none());
    }

    #[test]
    fn test_count_matches_with_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("legacy")).unwrap();
        fs::write(root.join("src/a.py"), "# TODO\n# TODO\n").unwrap();
        fs::write(root.join("legacy/b.py"), "# TODO\n").unwrap();

        let re = Regex::new("TODO").unwrap();
        assert_eq!(count_matches(root, &re, &[]).unwrap(), 3);
        assert_eq!(
            count_matches(root, &re, &["legacy/".to_string()]).unwrap(),
            2
        );
    }

    #[test]
    fn test_file_age_days() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CHANGELOG.md");
        fs::write(&path, "# Changelog").unwrap();
        let old = SystemTime::now() - Duration::from_secs(200 * 86_400);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let age = file_age_days(&path, Utc::now()).unwrap();
        assert!((199..=201).contains(&age));
        assert!(file_age_days(&dir.path().join("missing"), Utc::now()).is_none());
    }

    #[test]
    fn test_days_since() {
        let now = Utc::now();
        let ten_days_ago = now.timestamp() - 10 * 86_400;
        assert_eq!(days_since(ten_days_ago, now), Some(10));
    }
}
