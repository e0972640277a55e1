//! Quick-tier knowledge from the quick-scan result alone.
//!
//! The four documents are generated one after another with a fast model; no
//! source file is read. The first failure stops the run.

use std::time::Instant;

use tracing::{debug, info, instrument};

use super::prompts;
use super::{
    KnowledgeKind, KnowledgeReport, KnowledgeStore, KnowledgeTier, document_context,
    document_error, generate_with_escalation,
};
use crate::ai::provider::ModelContext;
use crate::analysis::types::QuickAnalysisResult;
use crate::constants::knowledge as knowledge_constants;
use crate::types::Result;

const TIER: KnowledgeTier = KnowledgeTier::Quick;

pub struct QuickKnowledgeGenerator {
    ctx: ModelContext,
    store: KnowledgeStore,
    windows: Vec<u32>,
}

impl QuickKnowledgeGenerator {
    pub fn new(ctx: ModelContext, store: KnowledgeStore) -> Self {
        Self {
            ctx: document_context(ctx),
            store,
            windows: knowledge_constants::CONTEXT_WINDOWS.to_vec(),
        }
    }

    pub fn with_context_windows(mut self, windows: Vec<u32>) -> Self {
        self.windows = windows;
        self
    }

    #[instrument(skip_all, fields(project_type = %result.project_type, model = %self.ctx.model()))]
    pub async fn generate(&self, result: &QuickAnalysisResult) -> Result<KnowledgeReport> {
        let start = Instant::now();
        let mut documents = Vec::with_capacity(KnowledgeKind::ALL.len());

        for kind in KnowledgeKind::ALL {
            debug!(document = kind.file_name(), "Generating");
            let prompt = prompts::quick_prompt(kind, result);
            let text = generate_with_escalation(&self.ctx, &self.windows, prompts::SYSTEM, &prompt)
                .await
                .map_err(|e| document_error(TIER, kind, e))?;
            let path = self
                .store
                .write(TIER, kind, &text)
                .await
                .map_err(|e| document_error(TIER, kind, e))?;
            documents.push((kind, path));
        }

        let report = KnowledgeReport {
            documents,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(duration_ms = report.duration_ms, "Quick knowledge complete");
        Ok(report)
    }
}
