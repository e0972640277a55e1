//! Status Command
//!
//! Display which analysis artifacts exist for the project.

use crate::analysis::CacheStore;
use crate::cli::util::{is_initialized, require_initialized};
use crate::knowledge::{KnowledgeStore, KnowledgeTier};
use crate::types::Result;

pub async fn run(format: &str) -> Result<()> {
    let root = std::env::current_dir()?;
    let json_output = format == "json";

    if !is_initialized(&root) {
        if json_output {
            println!("{{\"status\": \"not_initialized\"}}");
        } else {
            println!("Strata Status");
            println!("══════════════════════════════════════");
            println!("Not initialized. Run 'strata init' first.");
        }
        // Informational command: not being initialized is not an error
        return Ok(());
    }

    let metadata_dir = require_initialized(&root)?;
    let store = CacheStore::new(&metadata_dir);
    let knowledge = KnowledgeStore::new(&metadata_dir);

    let quick = store.load_quick().await?;
    let summary = store.load_summary().await?;
    let cache = store.load().await?;
    let tiers: Vec<(KnowledgeTier, usize)> = KnowledgeTier::ALL
        .into_iter()
        .map(|tier| (tier, knowledge.existing(tier).len()))
        .collect();

    if json_output {
        let status = serde_json::json!({
            "status": "initialized",
            "quick": quick.as_ref().map(|q| serde_json::json!({
                "project_type": q.project_type,
                "language": q.main_language,
                "framework": q.framework,
                "model": q.model,
            })),
            "analysis": summary.as_ref().map(|s| serde_json::json!({
                "total_files": s.total_files,
                "analyzed_files": s.analyzed_files,
                "skipped_files": s.skipped_files,
                "error_count": s.error_count,
                "models": s.models_used,
            })),
            "cache": cache.as_ref().map(|c| serde_json::json!({
                "entries": c.len(),
                "head_revision": c.head_revision,
                "dirty": c.dirty,
                "last_updated": c.last_updated,
            })),
            "knowledge": tiers
                .iter()
                .map(|(tier, count)| (tier.to_string(), serde_json::json!(count)))
                .collect::<serde_json::Map<_, _>>(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Strata Status");
    println!("══════════════════════════════════════");

    match &quick {
        Some(q) => println!(
            "Quick scan: {} ({}{})",
            q.project_type,
            q.main_language,
            q.framework
                .as_deref()
                .map(|f| format!(", {}", f))
                .unwrap_or_default()
        ),
        None => println!("Quick scan: not run"),
    }

    match &summary {
        Some(s) => println!(
            "File analysis: {} analyzed, {} skipped, {} errors",
            s.analyzed_files, s.skipped_files, s.error_count
        ),
        None => println!("File analysis: not run"),
    }

    if let Some(c) = &cache {
        println!(
            "Cache: {} entries, updated {}{}",
            c.len(),
            c.last_updated.format("%Y-%m-%d %H:%M UTC"),
            match &c.head_revision {
                Some(rev) => format!(
                    " at {}{}",
                    rev.chars().take(8).collect::<String>(),
                    if c.dirty { " (dirty)" } else { "" }
                ),
                None => String::new(),
            }
        );
    }

    println!();
    println!("Knowledge:");
    for (tier, count) in &tiers {
        println!("  {:<9} {}/4 documents", tier.to_string(), count);
    }

    Ok(())
}
