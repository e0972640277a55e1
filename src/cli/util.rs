//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::{Path, PathBuf};

use crate::ai::provider::{ModelContext, create_invoker};
use crate::analysis::cache::{CacheStore, METADATA_DIR};
use crate::analysis::lister::FileLister;
use crate::config::{Config, ConfigLoader};
use crate::knowledge::{KnowledgeStore, KnowledgeTier};
use crate::types::{Result, StrataError};

/// Command execution context
///
/// Project root, metadata directory and the resolved configuration.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_root: PathBuf,
    /// `.strata` under the project root
    pub metadata_dir: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// Load context for an initialized project in the current directory
    ///
    /// `config_file` replaces the layered resolution with a single file.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        let metadata_dir = require_initialized(&project_root)?;
        let config = match config_file {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&project_root)?,
        };

        Ok(Self {
            project_root,
            metadata_dir,
            config,
        })
    }

    pub fn cache_store(&self) -> CacheStore {
        CacheStore::new(&self.metadata_dir)
    }

    pub fn knowledge_store(&self) -> KnowledgeStore {
        KnowledgeStore::new(&self.metadata_dir)
    }

    /// File lister honoring the configured size limit and exclude globs
    pub fn lister(&self) -> Result<FileLister> {
        FileLister::new(&self.project_root)
            .with_max_file_size(self.config.analysis.max_file_size)
            .with_exclude(&self.config.analysis.exclude)
    }

    /// Invocation context for `tier`, optionally overriding the model
    pub fn model_context(&self, tier: KnowledgeTier, model: Option<&str>) -> Result<ModelContext> {
        let invoker = create_invoker(&self.config.provider_config())?;
        let model = model.map(str::to_string).unwrap_or_else(|| {
            let models = &self.config.models;
            match tier {
                KnowledgeTier::Quick => models.quick.clone(),
                KnowledgeTier::Detailed => models.detailed.clone(),
                KnowledgeTier::Deep => models.deep.clone(),
            }
        });
        Ok(ModelContext::new(
            invoker,
            model,
            self.config.generation_options(),
        ))
    }
}

/// Require strata to be initialized under `root`
///
/// Returns the `.strata` directory path, or `StrataError::NotInitialized`.
pub fn require_initialized(root: &Path) -> Result<PathBuf> {
    let metadata_dir = root.join(METADATA_DIR);
    if !metadata_dir.is_dir() {
        return Err(StrataError::NotInitialized);
    }
    Ok(metadata_dir)
}

pub fn is_initialized(root: &Path) -> bool {
    root.join(METADATA_DIR).is_dir()
}

/// Path relative to the project root when possible
pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Normalize a user-supplied file argument to a root-relative, `/`-separated path
pub fn relative_to_root(root: &Path, path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let relative = absolute.strip_prefix(root).map_err(|_| {
        StrataError::Config(format!(
            "{} is outside the project root {}",
            path.display(),
            root.display()
        ))
    })?;

    Ok(relative
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/"))
}
