//! Project Analysis Pipeline
//!
//! - [`quick_scan`]: Tier 1, ensemble classification of the whole project
//! - [`incremental`]: Tier 2, cached per-file analysis on a worker pool
//! - [`single_shot`]: one file, no cache, bounded by a deadline
//!
//! Supporting pieces: file enumeration ([`lister`]), fingerprints
//! ([`hasher`]), persisted artifacts ([`cache`]) and progress reporting
//! ([`progress`]).

pub mod cache;
pub mod hasher;
pub mod incremental;
pub mod lister;
pub mod parsers;
pub mod progress;
pub mod prompts;
pub mod quick_scan;
pub mod single_shot;
pub mod types;
pub mod vote;

pub use cache::{CacheStore, METADATA_DIR, VcsSnapshot};
pub use hasher::ContentHasher;
pub use incremental::{IncrementalFileAnalyzer, IncrementalOutcome, RunStats, analyze_file};
pub use lister::{FileLister, FileListing, ListingSource};
pub use progress::{ProgressEvent, ProgressReceiver, ProgressReporter, ProgressUpdate};
pub use quick_scan::{ProjectFacts, QuickScanner};
pub use single_shot::explain_file;
pub use types::{
    AnalysisCache, AnalysisSummary, AnalysisTarget, CacheEntry, ConsensusSource,
    FileAnalysisRecord, FileType, QuickAnalysisResult,
};
pub use vote::PluralityVote;
