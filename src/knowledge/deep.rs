//! Deep-tier refinement of the detailed documents.
//!
//! Each detailed document is critiqued and rewritten by a larger model. The
//! four calls run in parallel and fail independently: every successful
//! document is written, then the first failure in document order is
//! returned.

use std::path::PathBuf;
use std::time::Instant;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use super::prompts;
use super::{
    KnowledgeKind, KnowledgeReport, KnowledgeStore, KnowledgeTier, document_context,
    document_error, generate_with_escalation,
};
use crate::ai::provider::ModelContext;
use crate::constants::knowledge as knowledge_constants;
use crate::types::{Result, StrataError};

const TIER: KnowledgeTier = KnowledgeTier::Deep;

pub struct DeepKnowledgeRefiner {
    ctx: ModelContext,
    store: KnowledgeStore,
    windows: Vec<u32>,
}

impl DeepKnowledgeRefiner {
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

    #[instrument(skip_all, fields(model = %self.ctx.model()))]
    pub async fn refine(&self) -> Result<KnowledgeReport> {
        let start = Instant::now();

        let outcomes = join_all(KnowledgeKind::ALL.map(|kind| self.refine_one(kind))).await;

        let mut documents = Vec::new();
        let mut first_error = None;
        for (kind, outcome) in KnowledgeKind::ALL.into_iter().zip(outcomes) {
            match outcome {
                Ok(path) => documents.push((kind, path)),
                Err(e) => {
                    warn!(document = kind.file_name(), "Refinement failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(err) = first_error {
            info!(written = documents.len(), "Deep knowledge partially written");
            return Err(err);
        }

        let report = KnowledgeReport {
            documents,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(duration_ms = report.duration_ms, "Deep knowledge complete");
        Ok(report)
    }

    async fn refine_one(&self, kind: KnowledgeKind) -> Result<PathBuf> {
        let detailed = self
            .store
            .read(KnowledgeTier::Detailed, kind)
            .await
            .map_err(|e| document_error(TIER, kind, e))?
            .ok_or_else(|| {
                document_error(
                    TIER,
                    kind,
                    StrataError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!(
                            "detailed {} is missing; generate the detailed tier first",
                            kind.file_name()
                        ),
                    )),
                )
            })?;

        let prompt = prompts::refine_prompt(kind, &detailed);
        let text = generate_with_escalation(&self.ctx, &self.windows, prompts::SYSTEM, &prompt)
            .await
            .map_err(|e| document_error(TIER, kind, e))?;
        self.store
            .write(TIER, kind, &text)
            .await
            .map_err(|e| document_error(TIER, kind, e))
    }
}
