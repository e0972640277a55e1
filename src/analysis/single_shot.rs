//! Single-file analysis outside the pipeline.
//!
//! Uses the Tier-2 prompt, skips the cache entirely and is the only path with
//! a wall-clock deadline.

use std::path::Path;
use std::time::Duration;

use tracing::instrument;

use super::hasher::ContentHasher;
use super::incremental::analyze_file;
use super::types::{AnalysisTarget, FileAnalysisRecord};
use crate::ai::provider::ModelContext;
use crate::ai::timeout::with_timeout;
use crate::types::{Result, StrataError};

/// Analyze `relative` under `root`, failing with a timeout error past `deadline`
#[instrument(skip(ctx), fields(model = %ctx.model()))]
pub async fn explain_file(
    ctx: &ModelContext,
    root: &Path,
    relative: &str,
    max_chars: usize,
    deadline: Duration,
) -> Result<FileAnalysisRecord> {
    let full_path = root.join(relative);
    if !full_path.is_file() {
        return Err(StrataError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a file", full_path.display()),
        )));
    }

    let fingerprint = ContentHasher::hash_file(&full_path).await?;
    let target = AnalysisTarget::new(relative, fingerprint);

    with_timeout(
        deadline,
        async { Ok(analyze_file(ctx, root, &target, max_chars).await) },
        &format!("analysis of {}", relative),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::GenerationOptions;
    use crate::testing::ScriptedInvoker;
    use tempfile::TempDir;

    const ANSWER: &str = "PURPOSE: Entry\nIMPORTANCE: 8\nSUMMARY: Starts the app.\nTYPE: source";

    #[tokio::test]
    async fn test_explain_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        let invoker = ScriptedInvoker::constant(ANSWER);
        let ctx = ModelContext::new(invoker.shared(), "m", GenerationOptions::default());

        let record = explain_file(&ctx, dir.path(), "main.rs", 1000, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(record.importance, 8);
        assert_eq!(record.purpose, "Entry");
        // No cache is written
        assert!(!dir.path().join(".strata").exists());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let invoker = ScriptedInvoker::constant(ANSWER);
        let ctx = ModelContext::new(invoker.shared(), "m", GenerationOptions::default());
        let err = explain_file(&ctx, dir.path(), "nope.rs", 1000, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::Io(_)));
        assert_eq!(invoker.call_count(), 0);
    }

    #[tokio::test]
    async fn test_deadline_enforced() {
        use async_trait::async_trait;
        use crate::ai::provider::{CompletionRequest, ModelInvoker};
        use std::sync::Arc;

        struct Stalled;

        #[async_trait]
        impl ModelInvoker for Stalled {
            async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ANSWER.to_string())
            }
            fn name(&self) -> &str {
                "stalled"
            }
        }

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        let ctx = ModelContext::new(Arc::new(Stalled), "m", GenerationOptions::default());

        let err = explain_file(&ctx, dir.path(), "main.rs", 1000, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::Timeout { .. }));
    }
}
