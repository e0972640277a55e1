//! Incremental File Analysis (Tier 2)
//!
//! Per-file analysis with a content-fingerprint cache:
//!
//! 1. Filter the file list to analyzable files.
//! 2. Load the cache (absent cache means every file is changed).
//! 3. Fingerprint each candidate. Files whose fingerprint matches the cache
//!    are served from it with no model call.
//! 4. Changed files go through a bounded job queue to a fixed pool of
//!    workers, one model call per file.
//! 5. Cached and fresh records are merged in input order, sorted by
//!    importance (stable), and the cache and summary are persisted.
//!
//! A single file's failure is recorded in its record and never aborts the
//! batch. Only enumeration and cache I/O errors are fatal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::cache::{CacheStore, VcsSnapshot};
use super::hasher::ContentHasher;
use super::lister::FileLister;
use super::parsers::parse_file_analysis;
use super::progress::{ProgressReporter, ProgressTracker};
use super::prompts;
use super::types::{
    AnalysisCache, AnalysisSummary, AnalysisTarget, FileAnalysisRecord, FileType,
    sort_by_importance,
};
use crate::ai::provider::ModelContext;
use crate::ai::response::truncate_chars;
use crate::constants::analysis as analysis_constants;
use crate::types::Result;

/// Counters for one run; not part of the persisted summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Records served from the cache
    pub cache_hits: usize,
    /// Files sent to the model
    pub analyzed: usize,
    /// Files whose analysis failed this run
    pub failed: usize,
    /// Cache entries dropped for files no longer present
    pub pruned: usize,
}

#[derive(Debug, Clone)]
pub struct IncrementalOutcome {
    pub summary: AnalysisSummary,
    pub stats: RunStats,
}

type Job = (usize, AnalysisTarget);

pub struct IncrementalFileAnalyzer {
    ctx: ModelContext,
    root: PathBuf,
    store: CacheStore,
    lister: FileLister,
    workers: usize,
    max_file_chars: usize,
}

impl IncrementalFileAnalyzer {
    pub fn new(ctx: ModelContext, root: impl Into<PathBuf>, store: CacheStore) -> Self {
        let root = root.into();
        Self {
            ctx,
            lister: FileLister::new(&root),
            root,
            store,
            workers: analysis_constants::DEFAULT_WORKERS,
            max_file_chars: analysis_constants::MAX_FILE_CHARS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_max_file_chars(mut self, max_file_chars: usize) -> Self {
        self.max_file_chars = max_file_chars;
        self
    }

    /// Replace the analyzable-file filter (size limit, exclude globs)
    pub fn with_lister(mut self, lister: FileLister) -> Self {
        self.lister = lister;
        self
    }

    #[instrument(
        skip_all,
        fields(files = files.len(), model = %self.ctx.model(), workers = self.workers)
    )]
    pub async fn run(
        &self,
        files: &[String],
        progress: ProgressReporter,
    ) -> Result<IncrementalOutcome> {
        let start = Instant::now();

        let candidates = self.lister.filter_analyzable(files);
        let skipped = files.len() - candidates.len();

        let mut cache = match self.store.load().await? {
            Some(cache) => cache,
            None => {
                info!("No analysis cache found, analyzing every file");
                AnalysisCache::new(self.ctx.model())
            }
        };

        let mut slots: Vec<Option<FileAnalysisRecord>> = vec![None; candidates.len()];
        let mut jobs: Vec<Job> = Vec::new();
        let mut stats = RunStats::default();

        for (index, path) in candidates.iter().enumerate() {
            let fingerprint = match ContentHasher::hash_file(&self.root.join(path)).await {
                Ok(fingerprint) => fingerprint,
                Err(e) => {
                    warn!("Cannot fingerprint {}: {}", path, e);
                    let target = AnalysisTarget::new(path.clone(), String::new());
                    slots[index] = Some(FileAnalysisRecord::failed(
                        &target,
                        self.ctx.model(),
                        format!("cannot read file: {}", e),
                    ));
                    stats.failed += 1;
                    continue;
                }
            };

            let target = AnalysisTarget::new(path.clone(), fingerprint);
            match cache.lookup(&target) {
                Some(record) => {
                    slots[index] = Some(record.clone());
                    stats.cache_hits += 1;
                }
                None => jobs.push((index, target)),
            }
        }

        info!(
            candidates = candidates.len(),
            skipped,
            cached = stats.cache_hits,
            changed = jobs.len(),
            "Diffed against analysis cache"
        );

        stats.analyzed = jobs.len();
        let tracker = progress.track(candidates.len(), candidates.len() - jobs.len());
        let fresh = self.analyze_changed(jobs, tracker).await;

        for (index, record) in fresh {
            if record.is_failed() {
                stats.failed += 1;
            } else {
                cache.insert(record.clone());
            }
            slots[index] = Some(record);
        }

        let mut records: Vec<FileAnalysisRecord> = slots.into_iter().flatten().collect();
        sort_by_importance(&mut records);

        stats.pruned = cache.prune(candidates.iter().map(String::as_str));
        VcsSnapshot::capture(&self.root).apply(&mut cache);
        cache.model = self.ctx.model().to_string();
        cache.last_updated = Utc::now();

        let summary = AnalysisSummary::from_records(records, skipped);
        self.store.save(&cache).await?;
        self.store.save_summary(&summary).await?;

        info!(
            total = summary.total_files,
            analyzed = stats.analyzed,
            cache_hits = stats.cache_hits,
            errors = summary.error_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Incremental analysis complete"
        );

        Ok(IncrementalOutcome { summary, stats })
    }

    /// Drain `jobs` through the worker pool; one record per job
    async fn analyze_changed(
        &self,
        jobs: Vec<Job>,
        tracker: Arc<ProgressTracker>,
    ) -> Vec<(usize, FileAnalysisRecord)> {
        if jobs.is_empty() {
            return Vec::new();
        }

        let worker_count = self.workers.min(jobs.len());
        let (tx, rx) =
            mpsc::channel::<Job>(worker_count * analysis_constants::QUEUE_DEPTH_PER_WORKER);
        let rx = Arc::new(Mutex::new(rx));

        let mut pool = JoinSet::new();
        for worker_id in 0..worker_count {
            let rx = Arc::clone(&rx);
            let tracker = Arc::clone(&tracker);
            let ctx = self.ctx.clone();
            let root = self.root.clone();
            let max_chars = self.max_file_chars;

            pool.spawn(async move {
                let mut done = Vec::new();
                loop {
                    // Hold the lock only while taking the next job.
                    let job = rx.lock().await.recv().await;
                    let Some((index, target)) = job else { break };

                    tracker.started(&target.path).await;
                    let record = analyze_file(&ctx, &root, &target, max_chars).await;
                    tracker.finished(&target.path).await;
                    done.push((index, record));
                }
                debug!(worker_id, files = done.len(), "Worker finished");
                done
            });
        }

        let expected: Vec<Job> = jobs.clone();
        for job in jobs {
            if tx.send(job).await.is_err() {
                warn!("All workers exited early");
                break;
            }
        }
        drop(tx);

        let mut results = Vec::with_capacity(expected.len());
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(done) => results.extend(done),
                Err(e) => warn!("Analysis worker aborted: {}", e),
            }
        }

        // Jobs lost with a panicked worker still get a record.
        if results.len() < expected.len() {
            let finished: HashSet<usize> = results.iter().map(|(index, _)| *index).collect();
            for (index, target) in expected {
                if !finished.contains(&index) {
                    let record = FileAnalysisRecord::failed(
                        &target,
                        self.ctx.model(),
                        "analysis worker aborted",
                    );
                    results.push((index, record));
                }
            }
        }

        results
    }
}

/// Analyze one file with a single model call; failures become flagged records
pub async fn analyze_file(
    ctx: &ModelContext,
    root: &Path,
    target: &AnalysisTarget,
    max_chars: usize,
) -> FileAnalysisRecord {
    let start = Instant::now();
    let failed = |message: String| {
        let mut record = FileAnalysisRecord::failed(target, ctx.model(), message);
        record.duration_ms = start.elapsed().as_millis() as u64;
        record
    };

    let bytes = match tokio::fs::read(root.join(&target.path)).await {
        Ok(bytes) => bytes,
        Err(e) => return failed(format!("cannot read file: {}", e)),
    };
    if bytes.iter().take(512).any(|b| *b == 0) {
        return failed("binary content".to_string());
    }

    let content = String::from_utf8_lossy(&bytes);
    let (content, truncated) = truncate_chars(&content, max_chars);
    let prompt = prompts::file_prompt(&target.path, content, truncated);

    let text = match ctx.complete(prompts::FILE_SYSTEM, &prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Analysis of {} failed: {}", target.path, e);
            return failed(e.to_string());
        }
    };

    match parse_file_analysis(&text) {
        Ok(parsed) => FileAnalysisRecord {
            path: target.path.clone(),
            purpose: parsed.purpose,
            importance: parsed.importance,
            summary: parsed.summary,
            dependencies: parsed.dependencies,
            exports: parsed.exports,
            file_type: parsed
                .file_type
                .unwrap_or_else(|| FileType::guess(&target.path)),
            duration_ms: start.elapsed().as_millis() as u64,
            error: None,
            analyzed_at: Utc::now(),
            model: ctx.model().to_string(),
            fingerprint: target.fingerprint.clone(),
        },
        Err(reason) => {
            debug!("Unparseable analysis for {}: {}", target.path, reason);
            failed(format!("parse error: {}", reason))
        }
    }
}
