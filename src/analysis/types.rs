//! Analysis Data Model
//!
//! Records produced by the quick scan and the incremental file analysis,
//! plus the persisted cache that links them across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::constants::analysis as analysis_constants;

// =============================================================================
// Targets
// =============================================================================

/// A file selected for analysis: relative path plus content fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisTarget {
    pub path: String,
    pub fingerprint: String,
}

impl AnalysisTarget {
    pub fn new(path: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

// =============================================================================
// File Type
// =============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Source,
    Test,
    Config,
    Documentation,
    Build,
    Script,
    Data,
    #[default]
    Other,
}

impl FileType {
    pub const ALL: [FileType; 8] = [
        Self::Source,
        Self::Test,
        Self::Config,
        Self::Documentation,
        Self::Build,
        Self::Script,
        Self::Data,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Test => "test",
            Self::Config => "config",
            Self::Documentation => "documentation",
            Self::Build => "build",
            Self::Script => "script",
            Self::Data => "data",
            Self::Other => "other",
        }
    }

    /// Lenient parse of a model-supplied label ("Source code", "docs", "tests")
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        let word = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .find(|w| !w.is_empty())?;

        match word {
            "source" | "src" | "code" | "library" | "module" | "implementation" => {
                Some(Self::Source)
            }
            "test" | "tests" | "spec" | "testing" => Some(Self::Test),
            "config" | "configuration" | "settings" => Some(Self::Config),
            "documentation" | "docs" | "doc" | "readme" | "markdown" => Some(Self::Documentation),
            "build" | "manifest" | "ci" => Some(Self::Build),
            "script" | "scripts" | "shell" => Some(Self::Script),
            "data" | "fixture" | "fixtures" | "schema" => Some(Self::Data),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Classification from the path alone, used when the model gives none
    pub fn guess(path: &str) -> Self {
        let p = Path::new(path);
        let name = p
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_lowercase();
        let ext = p
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let in_test_dir = path
            .split('/')
            .any(|c| matches!(c, "test" | "tests" | "__tests__" | "spec"));
        if in_test_dir
            || name.starts_with("test_")
            || name.contains("_test.")
            || name.contains(".test.")
            || name.contains(".spec.")
        {
            return Self::Test;
        }

        match name.as_str() {
            "cargo.toml" | "package.json" | "go.mod" | "makefile" | "dockerfile"
            | "cmakelists.txt" | "build.gradle" | "pom.xml" | "pyproject.toml" | "setup.py"
            | "build.rs" => return Self::Build,
            _ => {}
        }

        match ext.as_str() {
            "md" | "rst" | "txt" | "adoc" => Self::Documentation,
            "toml" | "yaml" | "yml" | "ini" | "cfg" | "conf" | "env" => Self::Config,
            "sh" | "bash" | "zsh" | "ps1" | "bat" => Self::Script,
            "json" | "csv" | "sql" | "xml" | "proto" | "graphql" => Self::Data,
            "" => Self::Other,
            _ => Self::Source,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Per-File Record
// =============================================================================

/// Result of analyzing one file at one fingerprint
///
/// When `error` is set the remaining fields hold placeholders and the record
/// is kept out of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysisRecord {
    pub path: String,
    pub purpose: String,
    pub importance: u8,
    pub summary: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    pub file_type: FileType,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub analyzed_at: DateTime<Utc>,
    pub model: String,
    pub fingerprint: String,
}

impl FileAnalysisRecord {
    /// Placeholder record for a file whose analysis failed
    pub fn failed(target: &AnalysisTarget, model: &str, error: impl Into<String>) -> Self {
        Self {
            path: target.path.clone(),
            purpose: String::new(),
            importance: analysis_constants::DEFAULT_IMPORTANCE,
            summary: String::new(),
            dependencies: Vec::new(),
            exports: Vec::new(),
            file_type: FileType::guess(&target.path),
            duration_ms: 0,
            error: Some(error.into()),
            analyzed_at: Utc::now(),
            model: model.to_string(),
            fingerprint: target.fingerprint.clone(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Clamp an importance score into the valid range
pub fn clamp_importance(value: i64) -> u8 {
    value.clamp(
        analysis_constants::MIN_IMPORTANCE as i64,
        analysis_constants::MAX_IMPORTANCE as i64,
    ) as u8
}

/// Order records by importance, highest first, keeping input order for ties
pub fn sort_by_importance(records: &mut [FileAnalysisRecord]) {
    records.sort_by(|a, b| b.importance.cmp(&a.importance));
}

// =============================================================================
// Cache
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub record: FileAnalysisRecord,
}

/// Persisted path → (fingerprint, record) map plus run metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisCache {
    #[serde(default)]
    pub head_revision: Option<String>,
    #[serde(default)]
    pub dirty: bool,
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub model: String,
}

impl AnalysisCache {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            head_revision: None,
            dirty: false,
            entries: BTreeMap::new(),
            last_updated: Utc::now(),
            model: model.into(),
        }
    }

    /// Cached record, only if the stored fingerprint still matches
    pub fn lookup(&self, target: &AnalysisTarget) -> Option<&FileAnalysisRecord> {
        self.entries
            .get(&target.path)
            .filter(|entry| entry.fingerprint == target.fingerprint)
            .map(|entry| &entry.record)
    }

    pub fn is_changed(&self, target: &AnalysisTarget) -> bool {
        self.lookup(target).is_none()
    }

    /// Store a successful record; failed records are ignored
    pub fn insert(&mut self, record: FileAnalysisRecord) -> bool {
        if record.is_failed() {
            return false;
        }
        self.entries.insert(
            record.path.clone(),
            CacheEntry {
                fingerprint: record.fingerprint.clone(),
                record,
            },
        );
        true
    }

    /// Drop entries for paths outside `keep`; returns how many were removed
    pub fn prune<'a>(&mut self, keep: impl IntoIterator<Item = &'a str>) -> usize {
        let keep: std::collections::HashSet<&str> = keep.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|path, _| keep.contains(path.as_str()));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Summaries
// =============================================================================

/// Aggregate result of an incremental run, records ordered by importance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub analyzed_files: usize,
    pub skipped_files: usize,
    pub error_count: usize,
    pub models_used: Vec<String>,
    pub files: Vec<FileAnalysisRecord>,
}

impl AnalysisSummary {
    /// Build from records that are already importance-sorted
    pub fn from_records(files: Vec<FileAnalysisRecord>, skipped_files: usize) -> Self {
        let error_count = files.iter().filter(|r| r.is_failed()).count();
        let mut models_used: Vec<String> = files
            .iter()
            .filter(|r| !r.model.is_empty())
            .map(|r| r.model.clone())
            .collect();
        models_used.sort();
        models_used.dedup();

        Self {
            total_files: files.len() + skipped_files,
            analyzed_files: files.len() - error_count,
            skipped_files,
            error_count,
            models_used,
            files,
        }
    }

    /// Records without an error
    pub fn successful(&self) -> impl Iterator<Item = &FileAnalysisRecord> {
        self.files.iter().filter(|r| !r.is_failed())
    }
}

/// How the quick-scan answer was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusSource {
    /// Model-produced consensus over the ensemble answers
    Synthesis,
    /// Deterministic per-field plurality vote
    Vote,
}

impl fmt::Display for ConsensusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synthesis => f.write_str("synthesis"),
            Self::Vote => f.write_str("vote"),
        }
    }
}

/// Coarse project summary from the quick scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAnalysisResult {
    pub project_type: String,
    pub main_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    pub description: String,
    pub file_count: usize,
    pub code_file_count: usize,
    #[serde(default)]
    pub key_directories: Vec<String>,
    #[serde(default)]
    pub entry_points: Vec<String>,
    pub duration_ms: u64,
    #[serde(default)]
    pub model: String,
    /// Ensemble answers with at least one field filled
    #[serde(default)]
    pub responses_used: usize,
    pub consensus: ConsensusSource,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(path: &str, importance: u8) -> FileAnalysisRecord {
        FileAnalysisRecord {
            path: path.to_string(),
            purpose: format!("purpose of {path}"),
            importance,
            summary: "summary".to_string(),
            dependencies: vec![],
            exports: vec![],
            file_type: FileType::Source,
            duration_ms: 1,
            error: None,
            analyzed_at: Utc::now(),
            model: "m".to_string(),
            fingerprint: format!("fp-{path}"),
        }
    }

    #[test]
    fn test_importance_sort_is_stable() {
        let mut records = vec![record("a", 9), record("b", 3), record("c", 9)];
        sort_by_importance(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(order, ["a", "c", "b"]);
    }

    #[test]
    fn test_cache_lookup_requires_matching_fingerprint() {
        let mut cache = AnalysisCache::new("m");
        cache.insert(record("src/lib.rs", 7));

        let same = AnalysisTarget::new("src/lib.rs", "fp-src/lib.rs");
        let changed = AnalysisTarget::new("src/lib.rs", "other");
        let missing = AnalysisTarget::new("src/new.rs", "fp");

        assert!(cache.lookup(&same).is_some());
        assert!(cache.is_changed(&changed));
        assert!(cache.is_changed(&missing));
    }

    #[test]
    fn test_failed_records_not_cached() {
        let mut cache = AnalysisCache::new("m");
        let target = AnalysisTarget::new("a.rs", "fp");
        assert!(!cache.insert(FileAnalysisRecord::failed(&target, "m", "boom")));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_prune_drops_vanished_paths() {
        let mut cache = AnalysisCache::new("m");
        cache.insert(record("keep.rs", 5));
        cache.insert(record("gone.rs", 5));
        assert_eq!(cache.prune(["keep.rs"]), 1);
        assert!(cache.entries.contains_key("keep.rs"));
    }

    #[test]
    fn test_summary_counts() {
        let target = AnalysisTarget::new("bad.rs", "fp");
        let files = vec![
            record("a.rs", 8),
            FileAnalysisRecord::failed(&target, "m", "timeout"),
        ];
        let summary = AnalysisSummary::from_records(files, 3);
        assert_eq!(summary.total_files, 5);
        assert_eq!(summary.analyzed_files, 1);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.skipped_files, 3);
        assert_eq!(summary.models_used, vec!["m"]);
        assert_eq!(summary.successful().count(), 1);
    }

    #[test]
    fn test_file_type_labels() {
        assert_eq!(FileType::from_label("Source code"), Some(FileType::Source));
        assert_eq!(FileType::from_label("docs"), Some(FileType::Documentation));
        assert_eq!(FileType::from_label("**test**"), Some(FileType::Test));
        assert_eq!(FileType::from_label("banana"), None);
    }

    #[test]
    fn test_file_type_guess() {
        assert_eq!(FileType::guess("src/main.rs"), FileType::Source);
        assert_eq!(FileType::guess("tests/cli.rs"), FileType::Test);
        assert_eq!(FileType::guess("Cargo.toml"), FileType::Build);
        assert_eq!(FileType::guess("README.md"), FileType::Documentation);
        assert_eq!(FileType::guess("config/app.yaml"), FileType::Config);
    }

    #[test]
    fn test_record_serde_omits_empty_error() {
        let json = serde_json::to_string(&record("a.rs", 4)).unwrap();
        assert!(!json.contains("\"error\""));
        let back: FileAnalysisRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.importance, 4);
    }

    proptest! {
        #[test]
        fn prop_clamp_importance_in_range(value in any::<i64>()) {
            let clamped = clamp_importance(value);
            prop_assert!((1..=10).contains(&clamped));
            if (1..=10).contains(&value) {
                prop_assert_eq!(clamped as i64, value);
            }
        }

        #[test]
        fn prop_sort_descending_and_stable(scores in prop::collection::vec(1u8..=10, 0..40)) {
            let mut records: Vec<FileAnalysisRecord> = scores
                .iter()
                .enumerate()
                .map(|(i, s)| record(&format!("f{i:03}"), *s))
                .collect();
            sort_by_importance(&mut records);

            for pair in records.windows(2) {
                prop_assert!(pair[0].importance >= pair[1].importance);
                if pair[0].importance == pair[1].importance {
                    prop_assert!(pair[0].path < pair[1].path);
                }
            }
        }
    }
}
