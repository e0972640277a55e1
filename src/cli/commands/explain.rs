//! Explain Command
//!
//! Analyze a single file with a wall-clock deadline. The cache is not read
//! or written.

use std::path::Path;
use std::time::Duration;

use crate::analysis::explain_file;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, relative_to_root};
use crate::knowledge::KnowledgeTier;
use crate::types::Result;

pub async fn run(
    config_file: Option<&Path>,
    file: &Path,
    timeout_secs: Option<u64>,
    model: Option<&str>,
) -> Result<()> {
    let ctx = CommandContext::load(config_file)?;
    let out = Output::new();

    let relative = relative_to_root(&ctx.project_root, file)?;
    let deadline = Duration::from_secs(
        timeout_secs.unwrap_or(ctx.config.analysis.single_shot_timeout_secs),
    );

    let record = explain_file(
        &ctx.model_context(KnowledgeTier::Detailed, model)?,
        &ctx.project_root,
        &relative,
        ctx.config.analysis.max_file_chars,
        deadline,
    )
    .await?;

    out.header(&record.path);
    if let Some(error) = &record.error {
        out.warning(error);
    }
    out.field("Purpose", &record.purpose);
    out.field("Importance", record.importance);
    out.field("Type", record.file_type);
    if !record.dependencies.is_empty() {
        out.field("Dependencies", record.dependencies.join(", "));
    }
    if !record.exports.is_empty() {
        out.field("Exports", record.exports.join(", "));
    }
    println!();
    println!("{}", record.summary);

    Ok(())
}
