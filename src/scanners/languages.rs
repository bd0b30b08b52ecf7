//! Per-language profiles
//!
//! A profile is detected by its manifest and tells the generic assessors
//! which lint configs and lockfiles to expect and which package tools can
//! audit or list outdated dependencies. New ecosystems register here without
//! touching the assessors, the aggregator or the CLI.

use super::dep_audit::{self, VulnerabilityCounts};
use crate::assessors::base::AssessmentContext;
use crate::probes::ToolOutput;

/// An external command: program plus arguments
pub type ToolCommand = (&'static str, &'static [&'static str]);

pub trait LanguageProfile: Send + Sync {
    fn name(&self) -> &'static str;

    /// Files whose presence in the root means the language is in use
    fn manifests(&self) -> &'static [&'static str];

    /// Lint/format configuration candidates (wildcards allowed)
    fn lint_configs(&self) -> &'static [&'static str];

    fn lockfiles(&self) -> &'static [&'static str];

    fn audit_command(&self) -> Option<ToolCommand> {
        None
    }

    fn parse_audit(&self, _output: &ToolOutput) -> Option<VulnerabilityCounts> {
        None
    }

    fn outdated_command(&self) -> Option<ToolCommand> {
        None
    }

    fn parse_outdated(&self, _output: &ToolOutput) -> Option<usize> {
        None
    }

    /// Lint settings embedded in a manifest (e.g. `[tool.ruff]`)
    fn has_embedded_lint_config(&self, _ctx: &AssessmentContext) -> bool {
        false
    }

    fn detect(&self, ctx: &AssessmentContext) -> bool {
        self.manifests().iter().any(|m| ctx.file_exists(m))
    }

    fn has_lint_config(&self, ctx: &AssessmentContext) -> bool {
        ctx.any_exists(self.lint_configs()).is_some() || self.has_embedded_lint_config(ctx)
    }

    fn has_lockfile(&self, ctx: &AssessmentContext) -> bool {
        self.lockfiles().iter().any(|l| ctx.file_exists(l))
    }
}

pub struct RustProfile;

impl LanguageProfile for RustProfile {
    fn name(&self) -> &'static str {
        "Rust"
    }
    fn manifests(&self) -> &'static [&'static str] {
        &["Cargo.toml"]
    }
    fn lint_configs(&self) -> &'static [&'static str] {
        &["clippy.toml", ".clippy.toml", "rustfmt.toml", ".rustfmt.toml"]
    }
    fn lockfiles(&self) -> &'static [&'static str] {
        &["Cargo.lock"]
    }
    fn audit_command(&self) -> Option<ToolCommand> {
        Some(("cargo", &["audit", "--json"]))
    }
    fn parse_audit(&self, output: &ToolOutput) -> Option<VulnerabilityCounts> {
        dep_audit::parse_cargo_audit(output)
    }
    fn outdated_command(&self) -> Option<ToolCommand> {
        Some(("cargo", &["outdated", "--format", "json", "--depth", "1"]))
    }
    fn parse_outdated(&self, output: &ToolOutput) -> Option<usize> {
        dep_audit::parse_cargo_outdated(output)
    }
    fn has_embedded_lint_config(&self, ctx: &AssessmentContext) -> bool {
        ctx.read("Cargo.toml")
            .map(|c| c.contains("[lints") || c.contains("[workspace.lints"))
            .unwrap_or(false)
    }
}

pub struct JavaScriptProfile;

impl LanguageProfile for JavaScriptProfile {
    fn name(&self) -> &'static str {
        "JavaScript"
    }
    fn manifests(&self) -> &'static [&'static str] {
        &["package.json"]
    }
    fn lint_configs(&self) -> &'static [&'static str] {
        &[
            ".eslintrc*",
            "eslint.config.*",
            ".prettierrc*",
            "prettier.config.*",
            "biome.json",
            "biome.jsonc",
            "deno.json",
        ]
    }
    fn lockfiles(&self) -> &'static [&'static str] {
        &["package-lock.json", "yarn.lock", "pnpm-lock.yaml", "bun.lockb", "bun.lock"]
    }
    fn audit_command(&self) -> Option<ToolCommand> {
        Some(("npm", &["audit", "--json"]))
    }
    fn parse_audit(&self, output: &ToolOutput) -> Option<VulnerabilityCounts> {
        dep_audit::parse_npm_audit(output)
    }
    fn outdated_command(&self) -> Option<ToolCommand> {
        Some(("npm", &["outdated", "--json"]))
    }
    fn parse_outdated(&self, output: &ToolOutput) -> Option<usize> {
        dep_audit::parse_npm_outdated(output)
    }
    fn has_embedded_lint_config(&self, ctx: &AssessmentContext) -> bool {
        ctx.read("package.json")
            .map(|c| c.contains("\"eslintConfig\"") || c.contains("\"prettier\""))
            .unwrap_or(false)
    }
}

pub struct PythonProfile;

impl LanguageProfile for PythonProfile {
    fn name(&self) -> &'static str {
        "Python"
    }
    fn manifests(&self) -> &'static [&'static str] {
        &["pyproject.toml", "setup.py", "requirements.txt"]
    }
    fn lint_configs(&self) -> &'static [&'static str] {
        &["ruff.toml", ".ruff.toml", ".flake8", ".pylintrc", "pylintrc", "setup.cfg", "tox.ini"]
    }
    fn lockfiles(&self) -> &'static [&'static str] {
        &["poetry.lock", "uv.lock", "Pipfile.lock", "pdm.lock", "requirements.txt"]
    }
    fn audit_command(&self) -> Option<ToolCommand> {
        Some(("pip-audit", &["-f", "json"]))
    }
    fn parse_audit(&self, output: &ToolOutput) -> Option<VulnerabilityCounts> {
        dep_audit::parse_pip_audit(output)
    }
    fn outdated_command(&self) -> Option<ToolCommand> {
        Some(("pip", &["list", "--outdated", "--format", "json"]))
    }
    fn parse_outdated(&self, output: &ToolOutput) -> Option<usize> {
        dep_audit::parse_pip_outdated(output)
    }
    fn has_embedded_lint_config(&self, ctx: &AssessmentContext) -> bool {
        ctx.read("pyproject.toml")
            .map(|c| {
                ["[tool.ruff", "[tool.black", "[tool.pylint", "[tool.flake8", "[tool.isort"]
                    .iter()
                    .any(|section| c.contains(section))
            })
            .unwrap_or(false)
    }
}

pub struct GoProfile;

impl LanguageProfile for GoProfile {
    fn name(&self) -> &'static str {
        "Go"
    }
    fn manifests(&self) -> &'static [&'static str] {
        &["go.mod"]
    }
    fn lint_configs(&self) -> &'static [&'static str] {
        &[".golangci.yml", ".golangci.yaml", ".golangci.toml", ".golangci.json"]
    }
    fn lockfiles(&self) -> &'static [&'static str] {
        &["go.sum"]
    }
}

static PROFILES: [&dyn LanguageProfile; 4] =
    [&RustProfile, &JavaScriptProfile, &PythonProfile, &GoProfile];

/// Every registered profile, in a fixed order
pub fn profiles() -> &'static [&'static dyn LanguageProfile] {
    &PROFILES
}

/// Profiles whose manifest is present in the target root
pub fn detect_languages(ctx: &AssessmentContext) -> Vec<&'static dyn LanguageProfile> {
    profiles()
        .iter()
        .copied()
        .filter(|p| p.detect(ctx))
        .collect()
}
