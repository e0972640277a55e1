//! Quick Command
//!
//! Tier 1: ensemble scan of the file list, saved to `quick_analysis.json`.

use std::path::Path;

use crate::analysis::QuickScanner;
use crate::cli::progress::format_duration;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, display_path};
use crate::knowledge::KnowledgeTier;
use crate::types::Result;

pub async fn run(config_file: Option<&Path>, model: Option<&str>, quiet: bool) -> Result<()> {
    let ctx = CommandContext::load(config_file)?;
    let out = Output::quiet(quiet);

    let listing = ctx.lister()?.list()?;
    out.info(&format!(
        "Scanning {} files ({} skipped)",
        listing.files.len(),
        listing.skipped()
    ));

    let scanner = QuickScanner::new(ctx.model_context(KnowledgeTier::Quick, model)?)
        .with_ensemble_size(ctx.config.analysis.ensemble_size)
        .with_ensemble_temperature(ctx.config.analysis.ensemble_temperature);
    let result = scanner.scan(&listing.files).await?;

    let store = ctx.cache_store();
    store.save_quick(&result).await?;

    out.header("Quick Analysis");
    out.field("Type", &result.project_type);
    out.field("Language", &result.main_language);
    out.field(
        "Framework",
        result.framework.as_deref().unwrap_or("none"),
    );
    out.field("Description", &result.description);
    out.field(
        "Files",
        format!("{} ({} code)", result.file_count, result.code_file_count),
    );
    out.field("Key dirs", result.key_directories.join(", "));
    out.field("Entry points", result.entry_points.join(", "));
    out.field(
        "Consensus",
        format!("{} of {} answers", result.consensus, result.responses_used),
    );
    out.field("Duration", format_duration(result.duration_ms / 1000));
    out.success(&format!(
        "Saved {}",
        display_path(&ctx.project_root, &store.quick_path())
    ));

    Ok(())
}
