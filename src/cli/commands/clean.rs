//! Clean Command
//!
//! Clears the analysis cache, knowledge documents, or all strata data.

use std::path::Path;

use crate::analysis::CacheStore;
use crate::analysis::cache::METADATA_DIR;
use crate::cli::ui::Output;
use crate::knowledge::KnowledgeStore;
use crate::types::Result;

pub async fn run(all: bool, cache: bool, knowledge: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    clean(&root, all, cache, knowledge, &Output::new()).await
}

async fn clean(root: &Path, all: bool, cache: bool, knowledge: bool, out: &Output) -> Result<()> {
    let metadata_dir = root.join(METADATA_DIR);

    if all {
        if metadata_dir.exists() {
            tokio::fs::remove_dir_all(&metadata_dir).await?;
            out.success(&format!("Removed {}/", METADATA_DIR));
        } else {
            out.info("Nothing to clean");
        }
        return Ok(());
    }

    // Bare `strata clean` clears the cache only
    let cache = cache || !knowledge;

    if cache {
        let store = CacheStore::new(&metadata_dir);
        if let Some(existing) = store.load().await.ok().flatten() {
            out.info(&format!("Clearing {} cache entries", existing.len()));
        }
        if store.clear().await? {
            out.success("Cleared analysis cache");
        } else {
            out.info("No analysis cache to clear");
        }
    }

    if knowledge {
        if KnowledgeStore::new(&metadata_dir).clear().await? {
            out.success("Removed knowledge documents");
        } else {
            out.info("No knowledge documents to remove");
        }
    }

    Ok(())
}
