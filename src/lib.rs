//! Strata - Progressive Project Analysis
//!
//! Turns a source tree into structured knowledge in three escalating tiers,
//! each trading model cost for depth.
//!
//! ## Tiers
//!
//! - **Quick**: an ensemble of identical model calls classifies the project;
//!   answers are merged by a consensus call or a deterministic plurality vote.
//! - **Detailed**: every analyzable file is analyzed once per content
//!   fingerprint on a bounded worker pool; unchanged files come from the cache.
//! - **Knowledge**: four markdown documents (structure, patterns, context,
//!   overview) per tier, generated in dependency order.
//!
//! ## Quick Start
//!
//! ```ignore
//! use strata::{CacheStore, IncrementalFileAnalyzer, ModelContext, ProgressReporter};
//!
//! let ctx = ModelContext::new(invoker, "qwen2.5-coder:7b", GenerationOptions::default());
//! let analyzer = IncrementalFileAnalyzer::new(ctx, &root, CacheStore::for_project(&root));
//! let outcome = analyzer.run(&files, ProgressReporter::silent()).await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: model invocation, prompt building, response parsing
//! - [`analysis`]: quick scan, incremental file analysis, cache
//! - [`knowledge`]: knowledge documents for each tier
//! - [`config`]: layered configuration
//! - [`cli`]: command handlers

pub mod ai;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod knowledge;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};

pub use types::error::{ErrorCategory, LlmError, Result, StrataError};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use analysis::{
    AnalysisCache, AnalysisSummary, AnalysisTarget, CacheStore, ContentHasher,
    FileAnalysisRecord, FileLister, IncrementalFileAnalyzer, IncrementalOutcome,
    ProgressReporter, ProgressUpdate, QuickAnalysisResult, QuickScanner, explain_file,
};

pub use knowledge::{
    DeepKnowledgeRefiner, KnowledgeKind, KnowledgeStore, KnowledgeSynthesizer, KnowledgeTier,
    QuickKnowledgeGenerator,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    GenerationOptions, ModelContext, ModelInvoker, SharedInvoker, create_invoker, with_timeout,
};
