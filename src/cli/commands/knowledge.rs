//! Knowledge Command
//!
//! Generate the four knowledge documents for one tier:
//! - quick: from `quick_analysis.json`
//! - detailed: from `file_analysis.json`
//! - deep: refines the detailed documents

use std::path::Path;

use crate::cli::progress::format_duration;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, display_path};
use crate::knowledge::{
    DeepKnowledgeRefiner, KnowledgeReport, KnowledgeSynthesizer, KnowledgeTier,
    QuickKnowledgeGenerator,
};
use crate::types::{Result, StrataError};

pub async fn run(
    config_file: Option<&Path>,
    tier: KnowledgeTier,
    model: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let ctx = CommandContext::load(config_file)?;
    let out = Output::quiet(quiet);
    let model_ctx = ctx.model_context(tier, model)?;
    let store = ctx.cache_store();
    let knowledge = ctx.knowledge_store();
    let windows = ctx.config.knowledge.context_windows.clone();

    out.info(&format!(
        "Generating {} knowledge with {}",
        tier,
        model_ctx.model()
    ));

    let report: KnowledgeReport = match tier {
        KnowledgeTier::Quick => {
            let result = store.load_quick().await?.ok_or_else(|| missing_input("strata quick"))?;
            QuickKnowledgeGenerator::new(model_ctx, knowledge)
                .with_context_windows(windows)
                .generate(&result)
                .await?
        }
        KnowledgeTier::Detailed => {
            let summary = store
                .load_summary()
                .await?
                .ok_or_else(|| missing_input("strata analyze"))?;
            if summary.error_count > 0 {
                out.warning(&format!(
                    "File analysis has {} failed files; documents cover the rest",
                    summary.error_count
                ));
            }
            KnowledgeSynthesizer::new(model_ctx, knowledge)
                .with_context_windows(windows)
                .with_excerpt_chars(ctx.config.knowledge.excerpt_chars)
                .synthesize(&summary)
                .await?
        }
        KnowledgeTier::Deep => {
            DeepKnowledgeRefiner::new(model_ctx, knowledge)
                .with_context_windows(windows)
                .refine()
                .await?
        }
    };

    for (_, path) in &report.documents {
        out.success(&display_path(&ctx.project_root, path));
    }
    out.info(&format!(
        "Done in {}",
        format_duration(report.duration_ms / 1000)
    ));
    Ok(())
}

fn missing_input(command: &str) -> StrataError {
    StrataError::Config(format!("No analysis input found. Run '{}' first.", command))
}
