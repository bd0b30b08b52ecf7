//! One-shot file inventory of the assessed tree
//!
//! Every assessor reads the same snapshot, so the walk happens once per run.
//! The walk honours `.gitignore`, `.healthignore` and the configured exclude
//! patterns. Small text files are read up front in parallel.

use crate::config::Config;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Text files larger than this are inventoried but never read
pub const MAX_TEXT_BYTES: u64 = 1024 * 1024;

/// Custom ignore file honoured next to `.gitignore`
pub const IGNORE_FILE: &str = ".healthignore";

const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "py", "pyi", "js", "jsx", "mjs", "cjs", "ts", "tsx", "go", "java", "kt", "kts", "rb",
    "php", "cs", "c", "h", "cc", "cpp", "hpp", "cxx", "swift", "scala", "vue", "svelte", "sh",
    "bash", "lua", "ex", "exs", "dart",
];

const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "adoc", "txt"];

const CONFIG_EXTENSIONS: &[&str] = &[
    "toml", "yaml", "yml", "json", "ini", "cfg", "conf", "xml", "properties", "env",
];

const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "avif", "svg", "ico", "bmp", "tiff", "css", "scss",
    "sass", "less", "html", "htm", "woff", "woff2", "ttf", "otf", "eot", "mp4", "webm", "mp3",
];

const KEY_EXTENSIONS: &[&str] = &[
    "pem", "key", "p8", "pk8", "ppk", "p12", "pfx", "jks", "keystore", "asc", "gpg",
];

/// Default names of SSH private keys
const KEY_FILE_NAMES: &[&str] = &["id_rsa", "id_dsa", "id_ecdsa", "id_ed25519"];

const TEST_DIRS: &[&str] = &["tests", "test", "__tests__", "spec", "specs"];

/// Coarse role of a file in the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Source,
    Test,
    Documentation,
    Config,
    /// Keys, certificates and keystores
    KeyMaterial,
    Asset,
    Other,
}

/// A single inventoried file
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path relative to the assessed root, `/`-separated
    pub rel_path: PathBuf,
    pub size: u64,
    pub kind: FileKind,
    /// Lowercased extension, empty if none
    pub extension: String,
    /// Content for small UTF-8 text files
    pub content: Option<Arc<str>>,
}

impl FileEntry {
    pub fn file_name(&self) -> &str {
        self.rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// `rel_path` as a `/`-separated string
    pub fn rel_str(&self) -> String {
        self.rel_path.to_string_lossy().replace('\\', "/")
    }

    /// Source-like file (production code or test code)
    pub fn is_code(&self) -> bool {
        matches!(self.kind, FileKind::Source | FileKind::Test)
    }

    pub fn line_count(&self) -> usize {
        self.content.as_deref().map(|c| c.lines().count()).unwrap_or(0)
    }
}

/// Read-only snapshot of the files under a root
#[derive(Debug, Clone, Default)]
pub struct FileInventory {
    entries: Vec<FileEntry>,
}

impl FileInventory {
    /// Walk `root` and build the inventory.
    ///
    /// Unreadable entries are skipped with a debug log; the walk itself
    /// never fails.
    pub fn scan(root: &Path, config: &Config) -> Self {
        Self::scan_until(root, config, || false)
    }

    /// Like [`scan`](Self::scan), but stops as soon as `stop` returns true.
    ///
    /// Whatever was found so far is kept; files not read before the stop
    /// carry no content.
    pub fn scan_until<S>(root: &Path, config: &Config, stop: S) -> Self
    where
        S: Fn() -> bool + Sync,
    {
        let config = config.clone();
        Self::walk(root, move |rel| config.should_exclude(rel), &stop)
    }

    /// Walk `root`, pruning every root-relative path for which `exclude`
    /// returns true
    pub fn scan_filtered<F>(root: &Path, exclude: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        Self::walk(root, exclude, &|| false)
    }

    fn walk<F>(root: &Path, exclude: F, stop: &(dyn Fn() -> bool + Sync)) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        let walk_root = root.to_path_buf();

        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .add_custom_ignore_filename(IGNORE_FILE)
            .filter_entry(move |entry| {
                if entry.file_name() == ".git" {
                    return false;
                }
                match entry.path().strip_prefix(&walk_root) {
                    Ok(rel) if rel.as_os_str().is_empty() => true,
                    Ok(rel) => !exclude(rel),
                    Err(_) => true,
                }
            });

        let mut found: Vec<(PathBuf, u64)> = Vec::new();
        for result in builder.build() {
            if stop() {
                debug!("Inventory walk stopped after {} files", found.len());
                break;
            }
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            found.push((rel.to_path_buf(), size));
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));

        let entries: Vec<FileEntry> = found
            .into_par_iter()
            .map(|(rel_path, size)| {
                let extension = rel_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase();
                let kind = classify(&rel_path, &extension);
                let content = if size <= MAX_TEXT_BYTES && !stop() {
                    read_text(&root.join(&rel_path))
                } else {
                    None
                };
                FileEntry {
                    rel_path,
                    size,
                    kind,
                    extension,
                    content,
                }
            })
            .collect();

        debug!(
            "Inventoried {} files under {}",
            entries.len(),
            root.display()
        );

        Self { entries }
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn of_kind(&self, kind: FileKind) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn count_kind(&self, kind: FileKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Files whose content was read
    pub fn text_files(&self) -> impl Iterator<Item = (&FileEntry, &str)> {
        self.entries
            .iter()
            .filter_map(|e| e.content.as_deref().map(|c| (e, c)))
    }

    /// Look up a file by its root-relative path
    pub fn get(&self, rel_path: &str) -> Option<&FileEntry> {
        let wanted = Path::new(rel_path);
        self.entries.iter().find(|e| e.rel_path == wanted)
    }

    /// Any file with one of these extensions
    pub fn has_extension(&self, extensions: &[&str]) -> bool {
        self.entries
            .iter()
            .any(|e| extensions.contains(&e.extension.as_str()))
    }

    /// Count regex matches across readable files accepted by `filter`
    pub fn count_matches<F>(&self, pattern: &regex::Regex, filter: F) -> usize
    where
        F: Fn(&FileEntry) -> bool,
    {
        self.text_files()
            .filter(|(e, _)| filter(e))
            .map(|(_, content)| pattern.find_iter(content).count())
            .sum()
    }

    /// Any readable file accepted by `filter` matches
    pub fn any_match<F>(&self, pattern: &regex::Regex, filter: F) -> bool
    where
        F: Fn(&FileEntry) -> bool,
    {
        self.text_files()
            .filter(|(e, _)| filter(e))
            .any(|(_, content)| pattern.is_match(content))
    }
}

/// Read a file as UTF-8 text; binary or non-UTF-8 content yields `None`
fn read_text(path: &Path) -> Option<Arc<str>> {
    let bytes = std::fs::read(path).ok()?;
    let probe = &bytes[..bytes.len().min(8192)];
    if probe.contains(&0) {
        return None;
    }
    String::from_utf8(bytes).ok().map(Arc::from)
}

/// Classify by location and extension
pub fn classify(rel_path: &Path, extension: &str) -> FileKind {
    let is_code = SOURCE_EXTENSIONS.contains(&extension);
    if is_code {
        return if is_test_file(rel_path) {
            FileKind::Test
        } else {
            FileKind::Source
        };
    }
    let name = rel_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();
    if KEY_EXTENSIONS.contains(&extension) || KEY_FILE_NAMES.contains(&name.as_str()) {
        return FileKind::KeyMaterial;
    }
    if DOC_EXTENSIONS.contains(&extension)
        || matches!(
            name.as_str(),
            "readme" | "license" | "licence" | "changelog" | "contributing" | "authors" | "notice"
        )
    {
        return FileKind::Documentation;
    }
    if CONFIG_EXTENSIONS.contains(&extension) || name.starts_with('.') {
        return FileKind::Config;
    }
    if ASSET_EXTENSIONS.contains(&extension) {
        return FileKind::Asset;
    }
    FileKind::Other
}

/// Check whether a path looks like test code
pub fn is_test_file(rel_path: &Path) -> bool {
    let normalized = rel_path.to_string_lossy().replace('\\', "/").to_lowercase();
    let mut parts: Vec<&str> = normalized.split('/').collect();
    let name = parts.pop().unwrap_or("");

    if parts.iter().any(|p| TEST_DIRS.contains(p)) {
        return true;
    }

    let original_name = rel_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    (name.starts_with("test_") && name.ends_with(".py"))
        || name.ends_with("_test.py")
        || name.ends_with("_test.go")
        || name.ends_with("_test.rs")
        || name.ends_with("_spec.rb")
        || name.contains(".test.")
        || name.contains(".spec.")
        || original_name.ends_with("Test.java")
        || original_name.ends_with("Tests.java")
        || original_name.ends_with("Tests.cs")
        || original_name.ends_with("Test.cs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file(Path::new("tests/integration.rs")));
        assert!(is_test_file(Path::new("src/__tests__/app.js")));
        assert!(is_test_file(Path::new("pkg/test_module.py")));
        assert!(is_test_file(Path::new("pkg/module_test.py")));
        assert!(is_test_file(Path::new("server/handler_test.go")));
        assert!(is_test_file(Path::new("web/app.test.tsx")));
        assert!(is_test_file(Path::new("web/app.spec.js")));
        assert!(is_test_file(Path::new("src/main/UserServiceTest.java")));
        assert!(is_test_file(Path::new("lib/user_spec.rb")));

        assert!(!is_test_file(Path::new("src/main.rs")));
        assert!(!is_test_file(Path::new("src/contest.py")));
        assert!(!is_test_file(Path::new("src/latest_news.js")));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(Path::new("src/lib.rs"), "rs"), FileKind::Source);
        assert_eq!(classify(Path::new("tests/a.rs"), "rs"), FileKind::Test);
        assert_eq!(classify(Path::new("README.md"), "md"), FileKind::Documentation);
        assert_eq!(classify(Path::new("LICENSE"), ""), FileKind::Documentation);
        assert_eq!(classify(Path::new("Cargo.toml"), "toml"), FileKind::Config);
        assert_eq!(classify(Path::new(".gitignore"), ""), FileKind::Config);
        assert_eq!(classify(Path::new("img/logo.png"), "png"), FileKind::Asset);
        assert_eq!(classify(Path::new("tests/fixture.json"), "json"), FileKind::Config);
        assert_eq!(classify(Path::new("Makefile"), ""), FileKind::Other);

        assert_eq!(classify(Path::new("certs/prod.pem"), "pem"), FileKind::KeyMaterial);
        assert_eq!(classify(Path::new("deploy/server.key"), "key"), FileKind::KeyMaterial);
        assert_eq!(classify(Path::new("id_rsa"), ""), FileKind::KeyMaterial);
        assert_eq!(classify(Path::new(".ssh/id_ed25519"), ""), FileKind::KeyMaterial);
        assert_eq!(classify(Path::new(".ssh/id_ed25519.pub"), "pub"), FileKind::Config);
    }

    #[test]
    fn test_scan_respects_gitignore_and_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join("generated")).unwrap();
        fs::write(root.join("src/main.py"), "print('hi')\n").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join("generated/out.py"), "x = 1\n").unwrap();
        fs::write(root.join(".gitignore"), "secret_notes.txt\n").unwrap();
        fs::write(root.join("secret_notes.txt"), "nothing").unwrap();
        fs::write(root.join(IGNORE_FILE), "scratch/\n").unwrap();
        fs::create_dir_all(root.join("scratch")).unwrap();
        fs::write(root.join("scratch/tmp.py"), "x").unwrap();

        let config = Config::from_toml_str("exclude_paths = [\"generated/\"]").unwrap();
        let inventory = FileInventory::scan(root, &config);
        let paths: Vec<String> = inventory.entries().iter().map(|e| e.rel_str()).collect();

        assert!(paths.contains(&"src/main.py".to_string()));
        assert!(paths.contains(&".gitignore".to_string()));
        assert!(!paths.iter().any(|p| p.starts_with("node_modules")));
        assert!(!paths.iter().any(|p| p.starts_with("generated")));
        assert!(!paths.iter().any(|p| p.starts_with("scratch")));
        assert!(!paths.contains(&"secret_notes.txt".to_string()));

        // Sorted
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_binary_and_large_files_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("blob.bin"), [0u8, 1, 2, 3]).unwrap();
        fs::write(root.join("notes.md"), "# Notes\n").unwrap();

        let inventory = FileInventory::scan(root, &Config::default());
        assert!(inventory.get("blob.bin").unwrap().content.is_none());
        assert_eq!(
            inventory.get("notes.md").unwrap().content.as_deref(),
            Some("# Notes\n")
        );
    }

    #[test]
    fn test_count_matches() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.js"), "// TODO one\n// TODO two\n").unwrap();
        fs::write(root.join("src/b.js"), "// FIXME\n").unwrap();

        let inventory = FileInventory::scan(root, &Config::default());
        let re = regex::Regex::new(r"TODO|FIXME").unwrap();
        assert_eq!(inventory.count_matches(&re, |e| e.is_code()), 3);
        assert_eq!(
            inventory.count_matches(&re, |e| e.file_name() == "b.js"),
            1
        );
        assert!(inventory.any_match(&re, |_| true));
    }

    #[test]
    fn test_scan_until_stops_early() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("f{}.py", i)), "x = 1\n").unwrap();
        }
        let full = FileInventory::scan(dir.path(), &Config::default());
        assert_eq!(full.len(), 10);

        // root directory plus two files, then stop
        let calls = AtomicUsize::new(0);
        let partial = FileInventory::scan_until(dir.path(), &Config::default(), || {
            calls.fetch_add(1, Ordering::SeqCst) >= 3
        });
        assert_eq!(partial.len(), 2);
        assert!(partial.entries().iter().all(|e| e.content.is_none()));

        let nothing = FileInventory::scan_until(dir.path(), &Config::default(), || true);
        assert!(nothing.is_empty());
    }
}
