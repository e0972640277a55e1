//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (`<config dir>/strata/config.toml`)
//! 3. Project config (`.strata/config.toml`)
//! 4. Environment variables (`STRATA_` prefix, `__` separates nesting)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::analysis::cache::METADATA_DIR;
use crate::types::{Result, StrataError};

const CONFIG_FILE: &str = "config.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project at `root`:
    /// defaults → global → project → env vars
    pub fn load(root: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path(root);
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // STRATA_MODELS__DEEP -> models.deep
        figment = figment.merge(Env::prefixed("STRATA_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| StrataError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| StrataError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Platform config directory for strata (e.g. ~/.config/strata/)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "strata").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    pub fn project_dir(root: &Path) -> PathBuf {
        root.join(METADATA_DIR)
    }

    pub fn project_config_path(root: &Path) -> PathBuf {
        Self::project_dir(root).join(CONFIG_FILE)
    }

    pub fn is_project_initialized(root: &Path) -> bool {
        Self::project_dir(root).is_dir()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create `.strata/` and a commented project config
    pub fn init_project(root: &Path, force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir(root);
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        }

        Ok(project_dir)
    }

    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            StrataError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join(CONFIG_FILE);
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_global_config())?;
            info!("Created global config: {}", config_path.display());
        } else {
            info!("Global config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn default_global_config() -> String {
        r#"# Strata Global Configuration
# User-wide defaults. Project settings in .strata/config.toml override these.

version = "1.0"

[llm]
provider = "ollama"
timeout_secs = 300
# Quick-scan answers are always capped at 512 tokens; knowledge documents
# get max(max_tokens, 4096).
max_tokens = 2048
# Knowledge documents escalate through knowledge.context_windows instead.
context_window = 8192

[models]
quick = "llama3.2:3b"
detailed = "qwen2.5-coder:7b"
deep = "qwen2.5-coder:32b"
"#
        .to_string()
    }

    fn default_project_config() -> String {
        r#"# Strata Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[analysis]
workers = 4
max_file_size = 102400
ensemble_size = 10
exclude = []

[knowledge]
context_windows = [8192, 16384, 32768]
"#
        .to_string()
    }
}
