//! Quick Scan (Tier 1)
//!
//! A fixed-size ensemble of identical prompts is sent in parallel, each on its
//! own copy of the invocation context. Non-empty answers (complete or not) are
//! reconciled in two steps:
//!
//! 1. **Synthesis**: one more model call asked for the consensus answer.
//!    Fields it leaves empty are filled from the vote.
//! 2. **Vote**: if that call fails or returns nothing parseable, a per-field
//!    plurality vote in first-seen order decides; the description is the
//!    longest candidate.
//!
//! Only an ensemble with zero non-empty answers fails the tier.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::lister::is_code_file;
use super::parsers::{ScanAnswer, parse_scan_answer};
use super::prompts;
use super::types::{ConsensusSource, QuickAnalysisResult};
use super::vote::{PluralityVote, longest};
use crate::ai::provider::ModelContext;
use crate::constants::quick_scan as scan_constants;
use crate::types::{Result, StrataError};

/// File names that conventionally start a program
const ENTRY_POINT_NAMES: &[&str] = &[
    "main.rs",
    "main.go",
    "main.py",
    "__main__.py",
    "app.py",
    "manage.py",
    "wsgi.py",
    "main.c",
    "main.cpp",
    "main.ts",
    "main.js",
    "index.ts",
    "index.js",
    "server.ts",
    "server.js",
    "app.ts",
    "app.js",
    "App.tsx",
    "App.jsx",
    "Main.java",
    "Application.java",
    "Program.cs",
    "main.swift",
    "main.kt",
    "main.dart",
];

// =============================================================================
// Local Facts
// =============================================================================

/// Counts and layout facts derived from the file list without a model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFacts {
    pub file_count: usize,
    pub code_file_count: usize,
    pub key_directories: Vec<String>,
    pub entry_points: Vec<String>,
    /// (extension, count), most common first
    pub extensions: Vec<(String, usize)>,
}

impl ProjectFacts {
    pub fn from_files(files: &[String]) -> Self {
        let mut dir_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut ext_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut entry_points = Vec::new();
        let mut code_file_count = 0;

        for file in files {
            if let Some((top, _)) = file.split_once('/') {
                *dir_counts.entry(top).or_default() += 1;
            }
            if is_code_file(file) {
                code_file_count += 1;
                if let Some(ext) = Path::new(file).extension().and_then(|e| e.to_str()) {
                    *ext_counts.entry(ext.to_lowercase()).or_default() += 1;
                }
            }
            let name = file.rsplit('/').next().unwrap_or(file);
            if ENTRY_POINT_NAMES.contains(&name) {
                entry_points.push(file.clone());
            }
        }

        // BTreeMap iteration is name-ordered; the stable sort keeps that for ties.
        let mut dirs: Vec<(&str, usize)> = dir_counts.into_iter().collect();
        dirs.sort_by(|a, b| b.1.cmp(&a.1));
        let key_directories = dirs
            .into_iter()
            .take(scan_constants::MAX_KEY_DIRECTORIES)
            .map(|(d, _)| d.to_string())
            .collect();

        let mut extensions: Vec<(String, usize)> = ext_counts.into_iter().collect();
        extensions.sort_by(|a, b| b.1.cmp(&a.1));

        // Shallow entry points first
        entry_points.sort_by_key(|p: &String| (p.matches('/').count(), p.clone()));

        Self {
            file_count: files.len(),
            code_file_count,
            key_directories,
            entry_points,
            extensions,
        }
    }

    pub fn extension_summary(&self) -> String {
        if self.extensions.is_empty() {
            return "none".to_string();
        }
        self.extensions
            .iter()
            .take(5)
            .map(|(ext, count)| format!(".{} ({})", ext, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// =============================================================================
// Scanner
// =============================================================================

pub struct QuickScanner {
    ctx: ModelContext,
    ensemble_size: usize,
    ensemble_temperature: f32,
}

impl QuickScanner {
    pub fn new(ctx: ModelContext) -> Self {
        Self {
            ctx: ctx.with_max_tokens(scan_constants::MAX_TOKENS),
            ensemble_size: scan_constants::ENSEMBLE_SIZE,
            ensemble_temperature: scan_constants::ENSEMBLE_TEMPERATURE,
        }
    }

    pub fn with_ensemble_size(mut self, size: usize) -> Self {
        self.ensemble_size = size.max(1);
        self
    }

    pub fn with_ensemble_temperature(mut self, temperature: f32) -> Self {
        self.ensemble_temperature = temperature;
        self
    }

    #[instrument(skip_all, fields(files = files.len(), model = %self.ctx.model()))]
    pub async fn scan(&self, files: &[String]) -> Result<QuickAnalysisResult> {
        let start = Instant::now();
        let facts = ProjectFacts::from_files(files);
        let prompt = prompts::scan_prompt(&facts, files);

        info!(ensemble = self.ensemble_size, "Starting quick scan");
        let answers = self.run_ensemble(&prompt).await;
        if answers.is_empty() {
            return Err(StrataError::Aggregation(format!(
                "all {} ensemble responses failed or were empty",
                self.ensemble_size
            )));
        }

        let voted = Self::vote(&answers);
        let (answer, consensus) = match self.synthesize(&answers).await {
            Ok(synthesized) if !synthesized.is_empty() => {
                (synthesized.or(voted), ConsensusSource::Synthesis)
            }
            Ok(_) => {
                warn!("Consensus response was unparseable, using plurality vote");
                (voted, ConsensusSource::Vote)
            }
            Err(e) if e.is_model_error() => {
                warn!("Consensus call failed ({}), using plurality vote", e);
                (voted, ConsensusSource::Vote)
            }
            Err(e) => return Err(e),
        };

        let result = QuickAnalysisResult {
            project_type: answer
                .project_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            main_language: answer
                .language
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            framework: answer.framework_name().map(String::from),
            description: answer.description.clone().unwrap_or_default(),
            file_count: facts.file_count,
            code_file_count: facts.code_file_count,
            key_directories: facts.key_directories,
            entry_points: facts.entry_points,
            duration_ms: start.elapsed().as_millis() as u64,
            model: self.ctx.model().to_string(),
            responses_used: answers.len(),
            consensus,
        };

        info!(
            project_type = %result.project_type,
            language = %result.main_language,
            responses = result.responses_used,
            %consensus,
            "Quick scan complete"
        );
        Ok(result)
    }

    /// Non-empty answers in call order
    async fn run_ensemble(&self, prompt: &str) -> Vec<ScanAnswer> {
        let calls = (0..self.ensemble_size).map(|i| {
            let ctx = self
                .ctx
                .clone()
                .with_temperature(self.ensemble_temperature);
            async move {
                match ctx.complete(prompts::SCAN_SYSTEM, prompt).await {
                    Ok(text) => {
                        let answer = parse_scan_answer(&text);
                        if answer.is_empty() {
                            debug!(member = i, "Ensemble response had no usable fields");
                            None
                        } else {
                            Some(answer)
                        }
                    }
                    Err(e) => {
                        warn!(member = i, "Ensemble call failed: {}", e);
                        None
                    }
                }
            }
        });

        join_all(calls).await.into_iter().flatten().collect()
    }

    async fn synthesize(&self, answers: &[ScanAnswer]) -> Result<ScanAnswer> {
        let prompt = prompts::synthesis_prompt(answers);
        let text = self.ctx.complete(prompts::SYNTHESIS_SYSTEM, &prompt).await?;
        Ok(parse_scan_answer(&text))
    }

    /// Deterministic per-field vote
    pub fn vote(answers: &[ScanAnswer]) -> ScanAnswer {
        ScanAnswer {
            project_type: winner(answers.iter().filter_map(|a| a.project_type.as_deref())),
            language: winner(answers.iter().filter_map(|a| a.language.as_deref())),
            framework: winner(answers.iter().filter_map(|a| a.framework.as_deref())),
            description: longest(answers.iter().filter_map(|a| a.description.as_deref()))
                .map(String::from),
        }
    }
}

fn winner<'a>(ballots: impl Iterator<Item = &'a str>) -> Option<String> {
    ballots
        .collect::<PluralityVote>()
        .winner()
        .map(String::from)
}
