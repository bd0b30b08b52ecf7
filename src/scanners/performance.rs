//! Performance analyzer
//!
//! Static heuristics only: oversized bundles and images, missing
//! bundler/compression/caching setup in web front-ends, and missing
//! pagination/rate limiting/monitoring in API-style code.

use crate::assessors::base::{AssessmentContext, DeductionCap, ScoreCard};
use crate::models::Severity;
use crate::probes::{FileEntry, FileKind};
use ignore::WalkBuilder;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

pub const BUNDLE_LIMIT_KB: u64 = 500;
pub const IMAGE_LIMIT_KB: u64 = 500;
pub const IMAGE_HUGE_KB: u64 = 2048;

const BUNDLE_DEDUCTION: u32 = 10;
const BUNDLE_CAP: u32 = 20;
const IMAGE_DEDUCTION: u32 = 3;
const HUGE_IMAGE_DEDUCTION: u32 = 5;
const IMAGE_CAP: u32 = 15;

/// Build output directories inspected even when gitignored
const ARTIFACT_DIRS: &[&str] = &["dist", "build", "out", "public", "static"];

const BUNDLE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "css"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "avif", "bmp", "tiff", "svg"];
const FRONTEND_EXTENSIONS: &[&str] = &["html", "htm", "jsx", "tsx", "vue", "svelte"];

const BUNDLER_CONFIGS: &[&str] = &[
    "webpack.config.*",
    "vite.config.*",
    "rollup.config.*",
    "esbuild.config.*",
    "next.config.*",
    "nuxt.config.*",
    "svelte.config.*",
    "astro.config.*",
    "angular.json",
    ".parcelrc",
    "turbo.json",
];

static BUNDLER_DEPENDENCY: OnceLock<Regex> = OnceLock::new();
static COMPRESSION: OnceLock<Regex> = OnceLock::new();
static CACHING: OnceLock<Regex> = OnceLock::new();
static API_ROUTE: OnceLock<Regex> = OnceLock::new();
static PAGINATION: OnceLock<Regex> = OnceLock::new();
static RATE_LIMIT: OnceLock<Regex> = OnceLock::new();
static MONITORING: OnceLock<Regex> = OnceLock::new();

fn bundler_dependency() -> &'static Regex {
    BUNDLER_DEPENDENCY.get_or_init(|| {
        Regex::new(r#""(?:webpack|vite|rollup|esbuild|parcel|terser|next|@angular/cli|react-scripts)""#)
            .unwrap()
    })
}

fn compression() -> &'static Regex {
    COMPRESSION.get_or_init(|| {
        Regex::new(r"(?i)\bcompression\b|\bgzip\b|\bbrotli\b|CompressionPlugin|vite-plugin-compress|GZipMiddleware|CompressionLayer")
            .unwrap()
    })
}

fn caching() -> &'static Regex {
    CACHING.get_or_init(|| {
        Regex::new(r"(?i)cache-control|service[-_ ]?worker|workbox|max-age|\betag\b|\[contenthash\]")
            .unwrap()
    })
}

fn api_route() -> &'static Regex {
    API_ROUTE.get_or_init(|| {
        Regex::new(concat!(
            r"@(?:app|router|api|bp|blueprint)\.(?:get|post|put|patch|delete|route)\(",
            r"|@(?:Get|Post|Put|Delete|Request)Mapping\b|@RestController\b",
            r"|\b(?:app|router)\.(?:get|post|put|patch|delete)\(\s*['`]",
            r"|\bFastAPI\(|\bAPIRouter\(|http\.HandleFunc\(|\bgin\.(?:Default|New)\(",
            r"|#\[(?:get|post|put|patch|delete)\(|\baxum::Router\b|\bRouter::new\(\)\s*\.route\(",
        ))
        .unwrap()
    })
}

fn pagination() -> &'static Regex {
    PAGINATION.get_or_init(|| {
        Regex::new(r"(?i)paginat|page_size|pagesize|per_page|perpage|\bcursor\b|\boffset\b|\.limit\(")
            .unwrap()
    })
}

fn rate_limit() -> &'static Regex {
    RATE_LIMIT.get_or_init(|| {
        Regex::new(r"(?i)rate[-_ ]?limit|throttl|slowapi|\blimiter\b|\bgovernor\b").unwrap()
    })
}

fn monitoring() -> &'static Regex {
    MONITORING.get_or_init(|| {
        Regex::new(r"(?i)prometheus|opentelemetry|\botel\b|statsd|datadog|new_?relic|sentry|\bmetrics\b|\btracing::instrument\b")
            .unwrap()
    })
}

/// A file seen by the size checks
#[derive(Debug, Clone, Copy)]
struct SizedFile {
    size: u64,
}

pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let files = collect_sized_files(ctx);
        self.check_bundles(&files, card);
        if ctx.is_cancelled() {
            return;
        }
        self.check_images(&files, card);
        if ctx.is_cancelled() {
            return;
        }
        self.check_frontend(ctx, card);
        if ctx.is_cancelled() {
            return;
        }
        self.check_api(ctx, card);
    }

    fn check_bundles(&self, files: &BTreeMap<PathBuf, SizedFile>, card: &mut ScoreCard) {
        let mut cap = DeductionCap::new(BUNDLE_CAP);
        let mut any = false;
        for (path, file) in files {
            let ext = extension_of(path);
            let in_artifacts = path
                .components()
                .next()
                .and_then(|c| c.as_os_str().to_str())
                .map(|first| ARTIFACT_DIRS.contains(&first))
                .unwrap_or(false);
            if !in_artifacts || !BUNDLE_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }
            let kb = file.size / 1024;
            if kb > BUNDLE_LIMIT_KB {
                any = true;
                let finding = card
                    .finding(
                        Severity::Medium,
                        "bundle-size",
                        format!("Bundle is {} KB (limit {} KB)", kb, BUNDLE_LIMIT_KB),
                    )
                    .at(path.clone(), None);
                card.penalize(finding, cap.take(BUNDLE_DEDUCTION));
            }
        }
        if any {
            card.recommend("Split large bundles with code splitting and lazy loading");
        }
    }

    fn check_images(&self, files: &BTreeMap<PathBuf, SizedFile>, card: &mut ScoreCard) {
        let mut cap = DeductionCap::new(IMAGE_CAP);
        let mut any = false;
        for (path, file) in files {
            if !IMAGE_EXTENSIONS.contains(&extension_of(path).as_str()) {
                continue;
            }
            let kb = file.size / 1024;
            let (severity, points) = if kb > IMAGE_HUGE_KB {
                (Severity::Medium, HUGE_IMAGE_DEDUCTION)
            } else if kb > IMAGE_LIMIT_KB {
                (Severity::Low, IMAGE_DEDUCTION)
            } else {
                continue;
            };
            any = true;
            let finding = card
                .finding(severity, "image-size", format!("Image is {} KB", kb))
                .at(path.clone(), None);
            card.penalize(finding, cap.take(points));
        }
        if any {
            card.recommend("Compress images or serve modern formats such as WebP/AVIF");
        }
    }

    fn check_frontend(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        if !ctx.file_exists("package.json") || !ctx.inventory.has_extension(FRONTEND_EXTENSIONS) {
            return;
        }

        let package_json = ctx.read("package.json").unwrap_or_default();
        let has_bundler = ctx.any_exists(BUNDLER_CONFIGS).is_some()
            || bundler_dependency().is_match(&package_json);
        if has_bundler {
            card.info("good-practice", "Bundler/minifier configuration found");
        } else {
            card.deduct(
                Severity::Low,
                "bundler",
                "Web front-end without bundler or minifier configuration",
                5,
            );
            card.recommend("Add a bundler (e.g. Vite, webpack) with minification enabled");
        }

        let config_or_code = |e: &FileEntry| e.is_code() || e.kind == FileKind::Config;
        if ctx.inventory.any_match(compression(), config_or_code) {
            card.info("good-practice", "Compression configured");
        } else {
            card.deduct(
                Severity::Low,
                "compression",
                "No gzip/brotli compression configuration found",
                5,
            );
        }

        if ctx.inventory.any_match(caching(), config_or_code) {
            card.info("good-practice", "HTTP caching configured");
        } else {
            card.deduct(
                Severity::Low,
                "caching",
                "No caching headers or service worker found",
                3,
            );
        }
    }

    fn check_api(&self, ctx: &AssessmentContext, card: &mut ScoreCard) {
        let production = |e: &FileEntry| e.kind == FileKind::Source;
        if !ctx.inventory.any_match(api_route(), production) {
            return;
        }

        if ctx.inventory.any_match(pagination(), production) {
            card.info("good-practice", "Pagination in use");
        } else {
            card.deduct(
                Severity::Medium,
                "pagination",
                "API endpoints found but no pagination",
                8,
            );
            card.recommend("Paginate list endpoints to bound response sizes");
        }

        if ctx.inventory.any_match(rate_limit(), |e| {
            e.kind == FileKind::Source || e.kind == FileKind::Config
        }) {
            card.info("good-practice", "Rate limiting in use");
        } else {
            card.deduct(
                Severity::Medium,
                "rate-limiting",
                "API endpoints found but no rate limiting",
                8,
            );
            card.recommend("Add rate limiting to public endpoints");
        }

        if ctx.inventory.any_match(monitoring(), production) {
            card.info("good-practice", "Monitoring instrumentation found");
        } else {
            card.deduct(
                Severity::Low,
                "monitoring",
                "No monitoring or metrics instrumentation found",
                5,
            );
        }
    }
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn extension_of(path: &std::path::Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Inventory files plus whatever sits in root-level artifact directories.
/// Build output is usually gitignored and excluded, so those directories are
/// walked without filters (except dependency trees).
fn collect_sized_files(ctx: &AssessmentContext) -> BTreeMap<PathBuf, SizedFile> {
    let mut files: BTreeMap<PathBuf, SizedFile> = ctx
        .inventory
        .entries()
        .iter()
        .map(|e| (e.rel_path.clone(), SizedFile { size: e.size }))
        .collect();

    for dir in ARTIFACT_DIRS {
        let path = ctx.root.join(dir);
        if !path.is_dir() {
            continue;
        }
        let walker = WalkBuilder::new(&path)
            .standard_filters(false)
            .filter_entry(|e| e.file_name() != "node_modules" && e.file_name() != ".git")
            .build();
        for entry in walker.flatten() {
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&ctx.root) else {
                continue;
            };
            if ctx.config.excluded_by_user(rel) {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files
                .entry(rel.to_path_buf())
                .or_insert(SizedFile { size });
        }
    }

    files
}
