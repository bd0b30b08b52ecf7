//! Fixture repositories shared by the integration suites

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

pub const README: &str = "# Demo\n\nA small demo service.\n\n## Installation\n\npip install demo\n\n## Usage\n\ndemo run --port 8000\n";

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(path, content).expect("write fixture file");
}

/// Push a file's mtime `days` into the past
pub fn age(root: &Path, rel: &str, days: u64) {
    let when = SystemTime::now() - Duration::from_secs(days * 86_400);
    fs::File::options()
        .write(true)
        .open(root.join(rel))
        .expect("open fixture file")
        .set_modified(when)
        .expect("set mtime");
}

/// README, LICENSE, CI workflow, pre-commit config and a test suite with
/// one test file per three source files.
pub fn healthy_repo() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "README.md", README);
    write(root, "LICENSE", "MIT License\n\nCopyright (c) 2024 Demo\n");
    write(
        root,
        ".github/workflows/ci.yml",
        "name: ci\non: [push]\njobs:\n  test:\n    runs-on: ubuntu-latest\n",
    );
    write(
        root,
        ".pre-commit-config.yaml",
        "repos:\n  - repo: https://github.com/psf/black\n    rev: 24.1.0\n",
    );
    write(root, "src/app.py", "def handler(event):\n    return {\"ok\": True}\n");
    write(root, "src/util.py", "def add(a, b):\n    return a + b\n");
    write(root, "src/models.py", "class User:\n    name = \"\"\n");
    write(
        root,
        "tests/test_app.py",
        "from src.app import handler\n\n\ndef test_handler():\n    assert handler({})[\"ok\"]\n",
    );
    dir
}

/// The healthy repo plus a JavaScript toolchain, automation, and a
/// CHANGELOG untouched for 200 days.
pub fn stale_changelog_repo() -> TempDir {
    let dir = healthy_repo();
    let root = dir.path();
    write(root, ".gitignore", "node_modules/\n.env\n");
    write(root, ".github/dependabot.yml", "version: 2\nupdates: []\n");
    write(root, "package.json", "{\n  \"name\": \"demo\",\n  \"version\": \"1.0.0\"\n}\n");
    write(root, "package-lock.json", "{\n  \"lockfileVersion\": 3\n}\n");
    write(root, ".eslintrc.json", "{\n  \"extends\": \"eslint:recommended\"\n}\n");
    write(root, "CHANGELOG.md", "# Changelog\n\n## 1.0.0\n\n- First release\n");
    age(root, "CHANGELOG.md", 200);
    dir
}

/// No README, no tests, and a hardcoded password in tracked source
pub fn neglected_repo() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(
        root,
        "src/settings.py",
        "DEBUG = False\npassword = \"abc123def456\"\n",
    );
    write(root, "src/main.py", "from settings import DEBUG\n\nprint(DEBUG)\n");
    dir
}

/// Package outdated report with `n` entries, in `npm outdated --json` shape
pub fn npm_outdated_json(n: usize) -> String {
    let entries: Vec<String> = (0..n)
        .map(|i| {
            format!(
                "\"pkg-{}\": {{\"current\": \"1.0.0\", \"wanted\": \"1.0.0\", \"latest\": \"2.0.0\"}}",
                i
            )
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

pub const NPM_AUDIT_CLEAN: &str = r#"{"metadata":{"vulnerabilities":{"info":0,"low":0,"moderate":0,"high":0,"critical":0,"total":0}}}"#;
