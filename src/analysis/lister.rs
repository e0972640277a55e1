//! Project File Enumeration
//!
//! Lists version-controlled files through `git ls-files`. Outside a git work
//! tree (or without git) it falls back to a gitignore-aware directory walk.
//! The analyzable filter then drops vendored, generated, binary and oversized
//! files.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

use crate::constants::analysis as analysis_constants;
use crate::types::{Result, StrataError};

/// Path components that are never analyzed
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    "out",
    "__pycache__",
    ".venv",
    ".strata",
];

/// Extensions of files that carry no readable source
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svgz", "tiff", "pdf", "zip", "tar", "gz",
    "tgz", "bz2", "xz", "7z", "rar", "jar", "war", "class", "exe", "dll", "so", "dylib", "a",
    "o", "obj", "lib", "bin", "dat", "wasm", "pyc", "pyo", "woff", "woff2", "ttf", "otf", "eot",
    "mp3", "mp4", "wav", "ogg", "flac", "avi", "mov", "mkv", "webm", "sqlite", "db", "lock",
];

/// Extensions counted as code in quick-scan statistics
pub const CODE_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "go", "java", "kt", "kts", "rb", "c",
    "cc", "cpp", "h", "hpp", "cs", "swift", "scala", "php", "lua", "sh", "bash", "zsh", "ex",
    "exs", "erl", "hs", "ml", "clj", "dart", "vue", "svelte", "zig", "nim", "r", "jl",
];

/// Source of the tracked-file list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSource {
    Git,
    Walk,
}

/// Result of a full listing pass
#[derive(Debug, Clone)]
pub struct FileListing {
    /// Analyzable files, relative to the root, sorted
    pub files: Vec<String>,
    /// Files listed before filtering
    pub listed: usize,
    pub source: ListingSource,
}

impl FileListing {
    pub fn skipped(&self) -> usize {
        self.listed - self.files.len()
    }
}

pub struct FileLister {
    root: PathBuf,
    max_file_size: u64,
    exclude: Vec<glob::Pattern>,
}

impl FileLister {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_file_size: analysis_constants::MAX_FILE_SIZE,
            exclude: Vec::new(),
        }
    }

    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Add user exclude globs; an invalid pattern is a configuration error
    pub fn with_exclude(mut self, patterns: &[String]) -> Result<Self> {
        for pattern in patterns {
            let compiled = glob::Pattern::new(pattern).map_err(|e| {
                StrataError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
            self.exclude.push(compiled);
        }
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tracked files, then the analyzable subset
    pub fn list(&self) -> Result<FileListing> {
        let (tracked, source) = self.list_tracked()?;
        let listed = tracked.len();
        let files = self.filter_analyzable(&tracked);
        debug!(
            listed,
            analyzable = files.len(),
            ?source,
            "Enumerated project files"
        );
        Ok(FileListing {
            files,
            listed,
            source,
        })
    }

    /// All tracked files relative to the root, sorted, unfiltered
    pub fn list_tracked(&self) -> Result<(Vec<String>, ListingSource)> {
        if !self.root.is_dir() {
            return Err(StrataError::Enumeration(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let (mut files, source) = match self.git_ls_files() {
            Some(files) if !files.is_empty() => (files, ListingSource::Git),
            _ => (self.walk()?, ListingSource::Walk),
        };

        files.sort();
        files.dedup();
        Ok((files, source))
    }

    /// Keep only the files worth sending to a model
    pub fn filter_analyzable(&self, files: &[String]) -> Vec<String> {
        files
            .iter()
            .filter(|path| self.is_analyzable(path))
            .cloned()
            .collect()
    }

    pub fn is_analyzable(&self, relative: &str) -> bool {
        if !Self::passes_static_rules(relative) {
            return false;
        }
        if self.exclude.iter().any(|p| p.matches(relative)) {
            return false;
        }

        match std::fs::metadata(self.root.join(relative)) {
            Ok(meta) => meta.is_file() && meta.len() <= self.max_file_size,
            Err(_) => false,
        }
    }

    /// Directory and extension rules that need no filesystem access
    pub fn passes_static_rules(relative: &str) -> bool {
        if relative
            .split('/')
            .any(|component| SKIP_DIRS.contains(&component))
        {
            return false;
        }

        let ext = Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        !matches!(ext, Some(ext) if BINARY_EXTENSIONS.contains(&ext.as_str()))
    }

    fn git_ls_files(&self) -> Option<Vec<String>> {
        let output = Command::new("git")
            .args(["ls-files", "-z", "--cached"])
            .current_dir(&self.root)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let files = output
                    .stdout
                    .split(|b| *b == 0)
                    .filter(|entry| !entry.is_empty())
                    .map(|entry| String::from_utf8_lossy(entry).into_owned())
                    .collect();
                Some(files)
            }
            Ok(_) => {
                debug!("Not a git work tree, walking {}", self.root.display());
                None
            }
            Err(e) => {
                warn!("git unavailable ({}), walking {}", e, self.root.display());
                None
            }
        }
    }

    fn walk(&self) -> Result<Vec<String>> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if files.is_empty() && !self.root.exists() => {
                    return Err(StrataError::Enumeration(e.to_string()));
                }
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push(relative);
            }
        }

        Ok(files)
    }
}

/// True for extensions counted as code
pub fn is_code_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| CODE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.rs", b"fn main() {}");
        write(dir.path(), "src/lib.rs", b"pub fn f() {}");
        write(dir.path(), "README.md", b"# demo");
        write(dir.path(), "node_modules/pkg/index.js", b"x");
        write(dir.path(), "target/debug/app", b"x");
        write(dir.path(), "assets/logo.png", b"\x89PNG");
        write(dir.path(), ".strata/config.toml", b"");
        dir
    }

    #[test]
    fn test_static_rules() {
        assert!(FileLister::passes_static_rules("src/main.rs"));
        assert!(!FileLister::passes_static_rules("vendor/x/y.go"));
        assert!(!FileLister::passes_static_rules("web/dist/app.js"));
        assert!(!FileLister::passes_static_rules("img/logo.PNG"));
        assert!(!FileLister::passes_static_rules(".git/HEAD"));
    }

    #[test]
    fn test_walk_filters_unanalyzable() {
        let dir = project();
        let listing = FileLister::new(dir.path()).list().unwrap();

        assert_eq!(listing.files, vec!["README.md", "src/lib.rs", "src/main.rs"]);
        assert!(listing.listed >= 6);
        assert_eq!(listing.skipped(), listing.listed - 3);
    }

    #[test]
    fn test_oversized_files_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "small.rs", b"ok");
        write(dir.path(), "big.rs", &vec![b'x'; 2048]);

        let listing = FileLister::new(dir.path())
            .with_max_file_size(1024)
            .list()
            .unwrap();
        assert_eq!(listing.files, vec!["small.rs"]);
    }

    #[test]
    fn test_exclude_globs() {
        let dir = project();
        let lister = FileLister::new(dir.path())
            .with_exclude(&["**/*.md".to_string()])
            .unwrap();
        let listing = lister.list().unwrap();
        assert!(!listing.files.iter().any(|f| f.ends_with(".md")));
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let result = FileLister::new(".").with_exclude(&["[".to_string()]);
        assert!(matches!(result, Err(StrataError::Config(_))));
    }

    #[test]
    fn test_missing_root_is_enumeration_error() {
        let dir = TempDir::new().unwrap();
        let result = FileLister::new(dir.path().join("missing")).list();
        assert!(matches!(result, Err(StrataError::Enumeration(_))));
    }

    #[test]
    fn test_missing_files_are_not_analyzable() {
        let dir = project();
        let lister = FileLister::new(dir.path());
        let filtered =
            lister.filter_analyzable(&["src/main.rs".to_string(), "src/deleted.rs".to_string()]);
        assert_eq!(filtered, vec!["src/main.rs"]);
    }

    #[test]
    fn test_is_code_file() {
        assert!(is_code_file("src/main.rs"));
        assert!(is_code_file("web/App.TSX"));
        assert!(!is_code_file("README.md"));
        assert!(!is_code_file("Makefile"));
    }
}
