//! Analyze Command
//!
//! Tier 2: incremental per-file analysis. Unchanged files come from the
//! cache; progress for the rest is drawn from the analyzer's channel.

use std::path::Path;

use crate::analysis::{IncrementalFileAnalyzer, ProgressReporter};
use crate::cli::progress::{ConsoleRenderer, format_duration};
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, display_path};
use crate::knowledge::KnowledgeTier;
use crate::types::Result;

pub async fn run(
    config_file: Option<&Path>,
    workers: Option<usize>,
    model: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let ctx = CommandContext::load(config_file)?;
    let out = Output::quiet(quiet);

    let lister = ctx.lister()?;
    let (tracked, source) = lister.list_tracked()?;
    out.info(&format!("Found {} files ({:?} listing)", tracked.len(), source));

    let store = ctx.cache_store();
    let analyzer = IncrementalFileAnalyzer::new(
        ctx.model_context(KnowledgeTier::Detailed, model)?,
        &ctx.project_root,
        store.clone(),
    )
    .with_lister(lister)
    .with_workers(workers.unwrap_or(ctx.config.analysis.workers))
    .with_max_file_chars(ctx.config.analysis.max_file_chars);

    let (reporter, rx) = ProgressReporter::channel();
    let renderer = if quiet {
        ConsoleRenderer::hidden()
    } else {
        ConsoleRenderer::new()
    };

    let (outcome, _) = tokio::join!(analyzer.run(&tracked, reporter), renderer.drain(rx));
    let outcome = outcome?;
    let summary = &outcome.summary;
    let stats = outcome.stats;

    out.header("File Analysis");
    out.field("Listed", summary.total_files);
    out.field("Skipped", summary.skipped_files);
    out.field("From cache", stats.cache_hits);
    out.field("Analyzed", stats.analyzed);
    out.field("Pruned", stats.pruned);
    out.field("Errors", summary.error_count);

    let top: Vec<String> = summary
        .successful()
        .take(5)
        .map(|r| format!("{} ({})", r.path, r.importance))
        .collect();
    if !top.is_empty() {
        out.field("Most important", top.join(", "));
    }

    let total_ms: u64 = summary.files.iter().map(|r| r.duration_ms).sum();
    out.field("Model time", format_duration(total_ms / 1000));

    if summary.error_count > 0 {
        out.warning(&format!(
            "{} files failed; they will be retried on the next run",
            summary.error_count
        ));
        for record in summary.files.iter().filter(|r| r.is_failed()).take(10) {
            out.warning(&format!(
                "  {}: {}",
                record.path,
                record.error.as_deref().unwrap_or_default()
            ));
        }
    }

    out.success(&format!(
        "Saved {}",
        display_path(&ctx.project_root, &store.summary_path())
    ));
    Ok(())
}
