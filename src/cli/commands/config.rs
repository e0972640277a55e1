//! Config Command
//!
//! Manage strata configuration.
//!
//! Usage:
//!   strata config show [-f json]
//!   strata config path
//!   strata config init [-g] [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::config::{Config, ConfigLoader};
use crate::types::{Result, StrataError};

/// Show the merged effective configuration
pub fn show(config_file: Option<&Path>, format: &str) -> Result<()> {
    let config: Config = match config_file {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(&std::env::current_dir()?)?,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!(
            "{}",
            toml::to_string_pretty(&config).map_err(|e| StrataError::Config(e.to_string()))?
        );
    }
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    let root = std::env::current_dir()?;
    println!("Configuration paths:");
    println!();

    match ConfigLoader::global_config_path() {
        Some(global) => println!("  Global:  {} {}", mark(&global), global.display()),
        None => println!("  Global:  (not available)"),
    }

    let project = ConfigLoader::project_config_path(&root);
    println!("  Project: {} {}", mark(&project), project.display());
    Ok(())
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let out = Output::new();
    if global {
        let path = ConfigLoader::init_global(force)?;
        out.success("Initialized global configuration");
        out.field("Config", path.display());
    } else {
        let root = std::env::current_dir()?;
        ConfigLoader::init_project(&root, force)?;
        out.success("Initialized project configuration");
        out.field("Config", ConfigLoader::project_config_path(&root).display());
    }
    Ok(())
}

fn mark(path: &Path) -> &'static str {
    if path.exists() { "✓" } else { "✗" }
}
