//! Persisted Pipeline Artifacts
//!
//! Everything lives under the project-local `.strata/` directory:
//!
//! - `analysis_cache.json` - [`AnalysisCache`]
//! - `file_analysis.json` - [`AnalysisSummary`]
//! - `quick_analysis.json` - [`QuickAnalysisResult`]
//!
//! Files are written to a temporary sibling and renamed into place. There is
//! no locking; one pipeline run per project at a time.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use super::types::{AnalysisCache, AnalysisSummary, QuickAnalysisResult};
use crate::types::{Result, StrataError};

pub const METADATA_DIR: &str = ".strata";
pub const CACHE_FILE: &str = "analysis_cache.json";
pub const SUMMARY_FILE: &str = "file_analysis.json";
pub const QUICK_FILE: &str = "quick_analysis.json";

/// Reader/writer for the JSON artifacts of one project
#[derive(Debug, Clone)]
pub struct CacheStore {
    metadata_dir: PathBuf,
}

impl CacheStore {
    /// Store rooted at `<project>/.strata`
    pub fn for_project<P: AsRef<Path>>(project_root: P) -> Self {
        Self::new(project_root.as_ref().join(METADATA_DIR))
    }

    pub fn new<P: Into<PathBuf>>(metadata_dir: P) -> Self {
        Self {
            metadata_dir: metadata_dir.into(),
        }
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    pub fn cache_path(&self) -> PathBuf {
        self.metadata_dir.join(CACHE_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.metadata_dir.join(SUMMARY_FILE)
    }

    pub fn quick_path(&self) -> PathBuf {
        self.metadata_dir.join(QUICK_FILE)
    }

    /// Load the cache; `None` when no cache has been written yet
    pub async fn load(&self) -> Result<Option<AnalysisCache>> {
        let cache: Option<AnalysisCache> = self.read_json(&self.cache_path()).await?;
        if let Some(cache) = &cache {
            debug!(entries = cache.len(), "Loaded analysis cache");
        }
        Ok(cache)
    }

    pub async fn save(&self, cache: &AnalysisCache) -> Result<()> {
        self.write_json(&self.cache_path(), cache).await?;
        info!(entries = cache.len(), "Saved analysis cache");
        Ok(())
    }

    pub async fn load_summary(&self) -> Result<Option<AnalysisSummary>> {
        self.read_json(&self.summary_path()).await
    }

    pub async fn save_summary(&self, summary: &AnalysisSummary) -> Result<()> {
        self.write_json(&self.summary_path(), summary).await
    }

    pub async fn load_quick(&self) -> Result<Option<QuickAnalysisResult>> {
        self.read_json(&self.quick_path()).await
    }

    pub async fn save_quick(&self, result: &QuickAnalysisResult) -> Result<()> {
        self.write_json(&self.quick_path(), result).await
    }

    /// Remove the cache file; returns whether one existed
    pub async fn clear(&self) -> Result<bool> {
        match tokio::fs::remove_file(self.cache_path()).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StrataError::cache(self.cache_path(), e.to_string())),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
                StrataError::cache(
                    path,
                    format!("corrupt file ({}); run 'strata clean' to reset", e),
                )
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StrataError::cache(path, e.to_string())),
        }
    }

    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.metadata_dir)
            .await
            .map_err(|e| StrataError::cache(&self.metadata_dir, e.to_string()))?;

        let content = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| StrataError::cache(&tmp, e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StrataError::cache(path, e.to_string()))?;
        Ok(())
    }
}

// =============================================================================
// VCS Snapshot
// =============================================================================

/// Working-tree state recorded alongside the cache (informational only)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsSnapshot {
    pub head_revision: Option<String>,
    pub dirty: bool,
}

impl VcsSnapshot {
    /// Query git in `root`; empty snapshot when git or the repo is absent
    pub fn capture(root: &Path) -> Self {
        let head_revision = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(root)
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .filter(|rev| !rev.is_empty());

        if head_revision.is_none() {
            return Self::default();
        }

        let dirty = Command::new("git")
            .args(["status", "--porcelain"])
            .current_dir(root)
            .output()
            .ok()
            .filter(|output| output.status.success())
            .is_some_and(|output| !output.stdout.iter().all(u8::is_ascii_whitespace));

        Self {
            head_revision,
            dirty,
        }
    }

    pub fn apply(&self, cache: &mut AnalysisCache) {
        cache.head_revision = self.head_revision.clone();
        cache.dirty = self.dirty;
    }
}
