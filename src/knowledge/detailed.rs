//! Detailed-tier knowledge synthesis.
//!
//! Phase 1 writes `structure.md` and `patterns.md` from the file analysis
//! summary in parallel. Phase 2 (`context.md`, `overview.md`) starts only
//! after both phase-1 documents are written, and quotes excerpts of them.
//! Any failure aborts the tier; documents already written stay on disk.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};

use super::prompts;
use super::{
    KnowledgeKind, KnowledgeReport, KnowledgeStore, KnowledgeTier, document_context,
    document_error, generate_with_escalation,
};
use crate::ai::provider::ModelContext;
use crate::ai::response::strip_code_fences;
use crate::analysis::types::AnalysisSummary;
use crate::constants::knowledge as knowledge_constants;
use crate::types::Result;

const TIER: KnowledgeTier = KnowledgeTier::Detailed;

pub struct KnowledgeSynthesizer {
    ctx: ModelContext,
    store: KnowledgeStore,
    windows: Vec<u32>,
    excerpt_chars: usize,
}

impl KnowledgeSynthesizer {
    pub fn new(ctx: ModelContext, store: KnowledgeStore) -> Self {
        Self {
            ctx: document_context(ctx),
            store,
            windows: knowledge_constants::CONTEXT_WINDOWS.to_vec(),
            excerpt_chars: knowledge_constants::EXCERPT_CHARS,
        }
    }

    pub fn with_context_windows(mut self, windows: Vec<u32>) -> Self {
        self.windows = windows;
        self
    }

    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self
    }

    #[instrument(skip_all, fields(files = summary.files.len(), model = %self.ctx.model()))]
    pub async fn synthesize(&self, summary: &AnalysisSummary) -> Result<KnowledgeReport> {
        let start = Instant::now();
        info!("Generating detailed knowledge documents");

        let (structure, patterns) = tokio::join!(
            self.document(KnowledgeKind::Structure, prompts::structure_prompt(summary)),
            self.document(KnowledgeKind::Patterns, prompts::patterns_prompt(summary)),
        );
        let (structure, structure_path) = structure?;
        let (patterns, patterns_path) = patterns?;

        let (context, overview) = tokio::join!(
            self.document(
                KnowledgeKind::Context,
                prompts::synthesis_prompt(
                    KnowledgeKind::Context,
                    summary,
                    &structure,
                    &patterns,
                    self.excerpt_chars,
                ),
            ),
            self.document(
                KnowledgeKind::Overview,
                prompts::synthesis_prompt(
                    KnowledgeKind::Overview,
                    summary,
                    &structure,
                    &patterns,
                    self.excerpt_chars,
                ),
            ),
        );
        let (_, context_path) = context?;
        let (_, overview_path) = overview?;

        let report = KnowledgeReport {
            documents: vec![
                (KnowledgeKind::Structure, structure_path),
                (KnowledgeKind::Patterns, patterns_path),
                (KnowledgeKind::Context, context_path),
                (KnowledgeKind::Overview, overview_path),
            ],
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(duration_ms = report.duration_ms, "Detailed knowledge complete");
        Ok(report)
    }

    /// Generate and write one document; returns its cleaned text and path
    async fn document(&self, kind: KnowledgeKind, prompt: String) -> Result<(String, PathBuf)> {
        let text = generate_with_escalation(&self.ctx, &self.windows, prompts::SYSTEM, &prompt)
            .await
            .map_err(|e| document_error(TIER, kind, e))?;
        let path = self
            .store
            .write(TIER, kind, &text)
            .await
            .map_err(|e| document_error(TIER, kind, e))?;
        Ok((strip_code_fences(&text), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::{FileAnalysisRecord, FileType};
    use crate::ai::provider::GenerationOptions;
    use crate::testing::{RecordedCall, ScriptedInvoker};
    use crate::types::{ErrorCategory, StrataError};
    use chrono::Utc;
    use tempfile::TempDir;

    fn document_of(call: &RecordedCall) -> String {
        call.user_prompt
            .lines()
            .find_map(|l| l.strip_prefix("IMPORTANT: Focus EXCLUSIVELY on: "))
            .unwrap_or_default()
            .to_string()
    }

    fn summary() -> AnalysisSummary {
        let record = FileAnalysisRecord {
            path: "src/main.rs".into(),
            purpose: "Entry point".into(),
            importance: 9,
            summary: "Parses arguments.".into(),
            dependencies: vec!["clap".into()],
            exports: vec![],
            file_type: FileType::Source,
            duration_ms: 1,
            error: None,
            analyzed_at: Utc::now(),
            model: "m".into(),
            fingerprint: "fp".into(),
        };
        AnalysisSummary::from_records(vec![record], 0)
    }

    fn ctx(invoker: &std::sync::Arc<ScriptedInvoker>) -> ModelContext {
        ModelContext::new(invoker.shared(), "m", GenerationOptions::default())
    }

    #[tokio::test]
    async fn test_phase_two_waits_for_phase_one() {
        let dir = TempDir::new().unwrap();
        let invoker = ScriptedInvoker::new(|call| {
            let doc = document_of(call);
            Ok(format!("```markdown\n# {doc}\nbody of {doc}\n```"))
        });
        let synthesizer = KnowledgeSynthesizer::new(ctx(&invoker), KnowledgeStore::new(dir.path()));

        let report = synthesizer.synthesize(&summary()).await.unwrap();
        assert_eq!(report.documents.len(), 4);

        let calls = invoker.calls();
        let order: Vec<String> = calls.iter().map(document_of).collect();
        let position = |name: &str| order.iter().position(|d| d == name).unwrap();
        let phase_one_done = position("structure.md").max(position("patterns.md"));
        assert!(position("context.md") > phase_one_done);
        assert!(position("overview.md") > phase_one_done);

        // Phase-2 prompts quote the cleaned phase-1 documents
        let overview_call = &calls[position("overview.md")];
        assert!(overview_call.user_prompt.contains("body of structure.md"));
        assert!(overview_call.user_prompt.contains("body of patterns.md"));

        let written =
            std::fs::read_to_string(dir.path().join("knowledge/detailed/context.md")).unwrap();
        assert_eq!(written, "# context.md\nbody of context.md\n");
    }

    #[tokio::test]
    async fn test_phase_one_failure_aborts_tier() {
        let dir = TempDir::new().unwrap();
        let invoker = ScriptedInvoker::new(|call| {
            if document_of(call) == "patterns.md" {
                Err(StrataError::llm_with_category(ErrorCategory::Network, "connection reset"))
            } else {
                Ok("# Doc".to_string())
            }
        });
        let synthesizer = KnowledgeSynthesizer::new(ctx(&invoker), KnowledgeStore::new(dir.path()));

        let err = synthesizer.synthesize(&summary()).await.unwrap_err();
        match err {
            StrataError::Knowledge { tier, document, .. } => {
                assert_eq!(tier, "detailed");
                assert_eq!(document, "patterns.md");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Sibling stays written; phase 2 never ran
        assert!(dir.path().join("knowledge/detailed/structure.md").exists());
        assert_eq!(invoker.call_count(), 2);
        assert!(
            invoker
                .calls()
                .iter()
                .all(|c| !matches!(document_of(c).as_str(), "context.md" | "overview.md"))
        );
    }

    #[tokio::test]
    async fn test_overflow_escalates_per_document() {
        let dir = TempDir::new().unwrap();
        let invoker = ScriptedInvoker::new(|call| {
            if document_of(call) == "structure.md" && call.options.context_window == 8_192 {
                Err(StrataError::llm_with_category(
                    ErrorCategory::ContextOverflow,
                    "maximum context length exceeded",
                ))
            } else {
                Ok("# Doc".to_string())
            }
        });
        let synthesizer = KnowledgeSynthesizer::new(ctx(&invoker), KnowledgeStore::new(dir.path()));
        synthesizer.synthesize(&summary()).await.unwrap();

        let structure_windows: Vec<u32> = invoker
            .calls()
            .iter()
            .filter(|c| document_of(c) == "structure.md")
            .map(|c| c.options.context_window)
            .collect();
        assert_eq!(structure_windows, vec![8_192, 16_384]);
        assert_eq!(invoker.call_count(), 5);
    }

    #[tokio::test]
    async fn test_non_overflow_error_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let invoker = ScriptedInvoker::new(|call| {
            if document_of(call) == "structure.md" {
                Err(StrataError::llm_with_category(ErrorCategory::Auth, "invalid key"))
            } else {
                Ok("# Doc".to_string())
            }
        });
        let synthesizer = KnowledgeSynthesizer::new(ctx(&invoker), KnowledgeStore::new(dir.path()));

        let err = synthesizer.synthesize(&summary()).await.unwrap_err();
        assert!(matches!(err, StrataError::Knowledge { .. }));
        let structure_calls = invoker
            .calls()
            .iter()
            .filter(|c| document_of(c) == "structure.md")
            .count();
        assert_eq!(structure_calls, 1);
    }
}
