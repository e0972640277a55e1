//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Quick scan (Tier 1) constants
pub mod quick_scan {
    /// Number of independent ensemble calls
    pub const ENSEMBLE_SIZE: usize = 10;

    /// Sampling temperature for ensemble members
    pub const ENSEMBLE_TEMPERATURE: f32 = 0.7;

    /// Maximum file paths included in the scan prompt
    pub const MAX_LISTED_PATHS: usize = 200;

    /// Number of key directories reported
    pub const MAX_KEY_DIRECTORIES: usize = 8;

    /// Output budget for ensemble and consensus answers
    pub const MAX_TOKENS: u32 = 512;
}

/// Incremental file analysis (Tier 2) constants
pub mod analysis {
    /// Maximum file size to analyze (100KB)
    pub const MAX_FILE_SIZE: u64 = 100 * 1024;

    /// Maximum characters of file content placed in a prompt
    pub const MAX_FILE_CHARS: usize = 12_000;

    /// Default number of concurrent workers
    pub const DEFAULT_WORKERS: usize = 4;

    /// Job queue capacity per worker
    pub const QUEUE_DEPTH_PER_WORKER: usize = 2;

    /// Importance bounds and the default for unparseable values
    pub const MIN_IMPORTANCE: u8 = 1;
    pub const MAX_IMPORTANCE: u8 = 10;
    pub const DEFAULT_IMPORTANCE: u8 = 5;

    /// Wall-clock limit for the single-shot path (seconds)
    pub const SINGLE_SHOT_TIMEOUT_SECS: u64 = 120;
}

/// Progress channel constants
pub mod progress {
    /// Bounded channel capacity for progress updates
    pub const CHANNEL_CAPACITY: usize = 64;
}

/// Knowledge document constants
pub mod knowledge {
    /// Context-window escalation ladder for overflow retries
    pub const CONTEXT_WINDOWS: [u32; 3] = [8_192, 16_384, 32_768];

    /// Characters of a phase-1 document quoted into phase-2 prompts
    pub const EXCERPT_CHARS: usize = 4_000;

    /// Files listed per directory in the structure input
    pub const MAX_FILES_PER_DIRECTORY: usize = 25;

    /// Rows in the dependency frequency table
    pub const MAX_DEPENDENCY_ROWS: usize = 30;

    /// Output budget per document
    pub const MAX_TOKENS: u32 = 4_096;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Default context window when none is configured
    pub const DEFAULT_CONTEXT_WINDOW: u32 = 8_192;
}
