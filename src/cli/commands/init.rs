//! Init Command
//!
//! Initialize strata in the current directory.

use crate::analysis::cache::METADATA_DIR;
use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::{Result, StrataError};

pub fn run(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let out = Output::new();

    if ConfigLoader::is_project_initialized(&root) && !force {
        return Err(StrataError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    ConfigLoader::init_project(&root, force)?;

    // Global config is a convenience; never fail init over it
    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    out.success(&format!("Initialized strata in {}/", METADATA_DIR));
    println!();
    println!("Next steps:");
    println!("  1. strata quick                      coarse project summary");
    println!("  2. strata analyze                    per-file analysis (cached)");
    println!("  3. strata knowledge --tier detailed  knowledge documents");

    Ok(())
}
