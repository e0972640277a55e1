//! Knowledge Documents
//!
//! Each tier writes the same four markdown documents under
//! `.strata/knowledge/<tier>/`:
//!
//! | Tier | Input | Generator |
//! |------|-------|-----------|
//! | quick | quick-scan result | [`QuickKnowledgeGenerator`], sequential |
//! | detailed | file analysis summary | [`KnowledgeSynthesizer`], two parallel phases |
//! | deep | detailed documents | [`DeepKnowledgeRefiner`], four isolated critiques |
//!
//! Every generation call goes through [`generate_with_escalation`], which
//! retries at larger context windows only for context-overflow errors.

pub mod deep;
pub mod detailed;
pub mod prompts;
pub mod quick;

pub use deep::DeepKnowledgeRefiner;
pub use detailed::KnowledgeSynthesizer;
pub use quick::QuickKnowledgeGenerator;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ai::provider::{GenerationOptions, ModelContext};
use crate::ai::response::strip_code_fences;
use crate::constants::knowledge as knowledge_constants;
use crate::types::{ErrorCategory, Result, StrataError};

pub const KNOWLEDGE_DIR: &str = "knowledge";

// =============================================================================
// Tiers and Kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeTier {
    Quick,
    Detailed,
    Deep,
}

impl KnowledgeTier {
    pub const ALL: [KnowledgeTier; 3] = [Self::Quick, Self::Detailed, Self::Deep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Detailed => "detailed",
            Self::Deep => "deep",
        }
    }
}

impl fmt::Display for KnowledgeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "detailed" => Ok(Self::Detailed),
            "deep" => Ok(Self::Deep),
            _ => Err(format!(
                "Invalid tier '{}'. Valid values: quick, detailed, deep",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeKind {
    Structure,
    Patterns,
    Context,
    Overview,
}

impl KnowledgeKind {
    /// Document order; also the order errors are reported in
    pub const ALL: [KnowledgeKind; 4] = [
        Self::Structure,
        Self::Patterns,
        Self::Context,
        Self::Overview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Patterns => "patterns",
            Self::Context => "context",
            Self::Overview => "overview",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Structure => "structure.md",
            Self::Patterns => "patterns.md",
            Self::Context => "context.md",
            Self::Overview => "overview.md",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Structure => "Project Structure",
            Self::Patterns => "Code Patterns",
            Self::Context => "Project Context",
            Self::Overview => "Project Overview",
        }
    }
}

impl fmt::Display for KnowledgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Wrap a failure with the tier and document it belongs to
pub(crate) fn document_error(
    tier: KnowledgeTier,
    kind: KnowledgeKind,
    source: StrataError,
) -> StrataError {
    StrataError::knowledge(tier.as_str(), kind.file_name(), source)
}

/// Raise the token budget to the document floor; a larger configured budget
/// is kept
pub(crate) fn document_context(ctx: ModelContext) -> ModelContext {
    let max_tokens = ctx.options().max_tokens.max(knowledge_constants::MAX_TOKENS);
    ctx.with_max_tokens(max_tokens)
}

// =============================================================================
// Store
// =============================================================================

/// Reads and writes `knowledge/<tier>/<kind>.md` under the metadata directory
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    root: PathBuf,
}

impl KnowledgeStore {
    pub fn new<P: AsRef<Path>>(metadata_dir: P) -> Self {
        Self {
            root: metadata_dir.as_ref().join(KNOWLEDGE_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tier_dir(&self, tier: KnowledgeTier) -> PathBuf {
        self.root.join(tier.as_str())
    }

    pub fn path(&self, tier: KnowledgeTier, kind: KnowledgeKind) -> PathBuf {
        self.tier_dir(tier).join(kind.file_name())
    }

    /// Write a generated document, removing a wrapping code fence
    pub async fn write(
        &self,
        tier: KnowledgeTier,
        kind: KnowledgeKind,
        content: &str,
    ) -> Result<PathBuf> {
        let path = self.path(tier, kind);
        tokio::fs::create_dir_all(self.tier_dir(tier)).await?;

        let mut body = strip_code_fences(content);
        body.push('\n');
        tokio::fs::write(&path, body).await?;
        debug!(path = %path.display(), "Wrote knowledge document");
        Ok(path)
    }

    pub async fn read(&self, tier: KnowledgeTier, kind: KnowledgeKind) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path(tier, kind)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Kinds present on disk for `tier`
    pub fn existing(&self, tier: KnowledgeTier) -> Vec<KnowledgeKind> {
        KnowledgeKind::ALL
            .into_iter()
            .filter(|kind| self.path(tier, *kind).is_file())
            .collect()
    }

    /// Remove every tier; returns whether anything existed
    pub async fn clear(&self) -> Result<bool> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Documents written by one tier run
#[derive(Debug, Clone, Default)]
pub struct KnowledgeReport {
    pub documents: Vec<(KnowledgeKind, PathBuf)>,
    pub duration_ms: u64,
}

// =============================================================================
// Context-Window Escalation
// =============================================================================

/// Generate one document, widening the context window on overflow
///
/// Non-overflow errors return immediately. Overflow at the last window is
/// surfaced as a plain model error. An empty answer counts as a parse error.
pub async fn generate_with_escalation(
    ctx: &ModelContext,
    windows: &[u32],
    system_prompt: &str,
    user_prompt: &str,
) -> Result<String> {
    let ladder: Vec<u32> = if windows.is_empty() {
        vec![ctx.options().context_window]
    } else {
        windows.to_vec()
    };

    for (attempt, window) in ladder.iter().enumerate() {
        let options = GenerationOptions {
            context_window: *window,
            ..ctx.options()
        };

        match ctx.complete_with(system_prompt, user_prompt, options).await {
            Ok(text) if text.trim().is_empty() => {
                return Err(StrataError::llm_with_category(
                    ErrorCategory::ParseError,
                    "model returned an empty document",
                ));
            }
            Ok(text) => return Ok(text),
            Err(e) if e.is_context_overflow() => {
                if attempt + 1 < ladder.len() {
                    warn!(
                        context_window = window,
                        next = ladder[attempt + 1],
                        "Context overflow, retrying with a larger window"
                    );
                    continue;
                }
                return Err(StrataError::llm(format!(
                    "prompt does not fit the largest context window ({} tokens): {}",
                    window, e
                )));
            }
            Err(e) => return Err(e),
        }
    }

    // The ladder is never empty, so the loop always returns.
    Err(StrataError::llm("no context window configured"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInvoker;
    use tempfile::TempDir;

    fn overflow() -> StrataError {
        StrataError::llm_with_category(ErrorCategory::ContextOverflow, "too long")
    }

    #[test]
    fn test_document_context_keeps_larger_budget() {
        let invoker = ScriptedInvoker::constant("ok");
        let small = GenerationOptions {
            max_tokens: 1_024,
            ..GenerationOptions::default()
        };
        let ctx = document_context(ModelContext::new(invoker.shared(), "m", small));
        assert_eq!(ctx.options().max_tokens, knowledge_constants::MAX_TOKENS);

        let large = GenerationOptions {
            max_tokens: 16_000,
            ..GenerationOptions::default()
        };
        let ctx = document_context(ModelContext::new(invoker.shared(), "m", large));
        assert_eq!(ctx.options().max_tokens, 16_000);
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("Deep".parse::<KnowledgeTier>(), Ok(KnowledgeTier::Deep));
        assert!("medium".parse::<KnowledgeTier>().is_err());
        assert_eq!(KnowledgeTier::Quick.to_string(), "quick");
    }

    #[tokio::test]
    async fn test_store_write_strips_fence() {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::new(dir.path());
        let path = store
            .write(
                KnowledgeTier::Detailed,
                KnowledgeKind::Overview,
                "```markdown\n# Overview\n```",
            )
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("knowledge/detailed/overview.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Overview\n");
        assert_eq!(
            store.existing(KnowledgeTier::Detailed),
            vec![KnowledgeKind::Overview]
        );
        assert!(store.existing(KnowledgeTier::Deep).is_empty());
    }

    #[tokio::test]
    async fn test_store_write_keeps_leading_code_block() {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::new(dir.path());
        let doc = "```bash\nmake build\n```\n\n# Build\nRun make first.";
        let path = store
            .write(KnowledgeTier::Quick, KnowledgeKind::Context, doc)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("{doc}\n")
        );
    }

    #[tokio::test]
    async fn test_store_read_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = KnowledgeStore::new(dir.path());
        assert!(
            store
                .read(KnowledgeTier::Quick, KnowledgeKind::Context)
                .await
                .unwrap()
                .is_none()
        );
        store
            .write(KnowledgeTier::Quick, KnowledgeKind::Context, "# C")
            .await
            .unwrap();
        assert_eq!(
            store
                .read(KnowledgeTier::Quick, KnowledgeKind::Context)
                .await
                .unwrap()
                .as_deref(),
            Some("# C\n")
        );
        assert!(store.clear().await.unwrap());
        assert!(!store.clear().await.unwrap());
    }

    #[tokio::test]
    async fn test_escalation_on_overflow() {
        let invoker = ScriptedInvoker::new(|call| {
            if call.options.context_window < 32_768 {
                Err(overflow())
            } else {
                Ok("# Doc".to_string())
            }
        });
        let ctx = ModelContext::new(invoker.shared(), "m", GenerationOptions::default());

        let text = generate_with_escalation(&ctx, &[8_192, 16_384, 32_768], "s", "u")
            .await
            .unwrap();
        assert_eq!(text, "# Doc");

        let windows: Vec<u32> = invoker
            .calls()
            .iter()
            .map(|c| c.options.context_window)
            .collect();
        assert_eq!(windows, vec![8_192, 16_384, 32_768]);
    }

    #[tokio::test]
    async fn test_persistent_overflow_becomes_plain_model_error() {
        let invoker = ScriptedInvoker::new(|_| Err(overflow()));
        let ctx = ModelContext::new(invoker.shared(), "m", GenerationOptions::default());

        let err = generate_with_escalation(&ctx, &[8_192, 16_384], "s", "u")
            .await
            .unwrap_err();
        assert!(err.is_model_error());
        assert!(!err.is_context_overflow());
        assert_eq!(invoker.call_count(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_do_not_retry() {
        let invoker = ScriptedInvoker::new(|_| {
            Err(StrataError::llm_with_category(ErrorCategory::Auth, "bad key"))
        });
        let ctx = ModelContext::new(invoker.shared(), "m", GenerationOptions::default());

        let err = generate_with_escalation(&ctx, &[8_192, 16_384, 32_768], "s", "u")
            .await
            .unwrap_err();
        assert!(err.is_model_error());
        assert_eq!(invoker.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_answer_is_error() {
        let invoker = ScriptedInvoker::constant("   ");
        let ctx = ModelContext::new(invoker.shared(), "m", GenerationOptions::default());
        assert!(
            generate_with_escalation(&ctx, &[8_192], "s", "u")
                .await
                .is_err()
        );
    }
}
