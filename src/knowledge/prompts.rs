//! Knowledge Prompt Inputs
//!
//! Renders analysis results into compact markdown blocks for the document
//! prompts: directory-grouped listings, file-type histograms, dependency
//! frequency tables and excerpts of earlier documents.

use std::collections::BTreeMap;

use super::{KnowledgeKind, KnowledgeTier};
use crate::ai::prompt::PromptBuilder;
use crate::ai::response::truncate_chars;
use crate::analysis::types::{AnalysisSummary, FileType, QuickAnalysisResult};
use crate::constants::knowledge as knowledge_constants;

pub const SYSTEM: &str = "You are a senior engineer writing internal project documentation \
for other engineers. Write GitHub-flavored markdown. Be concrete: name files, directories and \
dependencies. Never invent files that are not listed.";

// =============================================================================
// Renderers
// =============================================================================

/// Successful records grouped by parent directory, most important first
pub fn directory_listing(summary: &AnalysisSummary, max_per_dir: usize) -> String {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for record in summary.successful() {
        let dir = record
            .path
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or(".");
        groups.entry(dir).or_default().push(format!(
            "- `{}` ({}, importance {}): {}",
            record.path, record.file_type, record.importance, record.purpose
        ));
    }

    let mut out = String::new();
    for (dir, entries) in groups {
        out.push_str(&format!("## {}/ ({} files)\n", dir, entries.len()));
        for entry in entries.iter().take(max_per_dir) {
            out.push_str(entry);
            out.push('\n');
        }
        if entries.len() > max_per_dir {
            out.push_str(&format!("- ... {} more\n", entries.len() - max_per_dir));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Count of successful records per file type
pub fn file_type_histogram(summary: &AnalysisSummary) -> String {
    let mut counts: BTreeMap<FileType, usize> = BTreeMap::new();
    for record in summary.successful() {
        *counts.entry(record.file_type).or_default() += 1;
    }

    FileType::ALL
        .iter()
        .filter_map(|t| counts.get(t).map(|n| format!("- {}: {}", t, n)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dependencies ranked by how many files use them
pub fn dependency_table(summary: &AnalysisSummary, max_rows: usize) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in summary.successful() {
        for dep in &record.dependencies {
            *counts.entry(dep.as_str()).or_default() += 1;
        }
    }
    if counts.is_empty() {
        return "(no dependencies reported)".to_string();
    }

    let mut rows: Vec<(&str, usize)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    let mut out = String::from("| Dependency | Files |\n|---|---|\n");
    for (dep, count) in rows.iter().take(max_rows) {
        out.push_str(&format!("| {} | {} |\n", dep, count));
    }
    out.trim_end().to_string()
}

pub fn summary_stats(summary: &AnalysisSummary) -> String {
    format!(
        "- Files listed: {}\n- Files analyzed: {}\n- Files skipped: {}\n- Analysis errors: {}\n- Models: {}",
        summary.total_files,
        summary.analyzed_files,
        summary.skipped_files,
        summary.error_count,
        if summary.models_used.is_empty() {
            "none".to_string()
        } else {
            summary.models_used.join(", ")
        }
    )
}

/// The `n` most important files with their summaries
pub fn key_files(summary: &AnalysisSummary, n: usize) -> String {
    summary
        .successful()
        .take(n)
        .map(|r| format!("- `{}` ({}): {}", r.path, r.importance, r.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Leading part of an earlier document
pub fn excerpt(document: &str, max_chars: usize) -> String {
    let (head, truncated) = truncate_chars(document.trim(), max_chars);
    if truncated {
        format!("{}\n\n[... excerpt truncated]", head.trim_end())
    } else {
        head.to_string()
    }
}

fn quick_facts(result: &QuickAnalysisResult) -> PromptBuilder {
    PromptBuilder::new()
        .context_item("Project type", result.project_type.as_str())
        .context_item("Main language", result.main_language.as_str())
        .context_item(
            "Framework",
            result.framework.as_deref().unwrap_or("none"),
        )
        .context_item("Description", result.description.as_str())
        .context_item(
            "Files",
            format!("{} ({} code)", result.file_count, result.code_file_count),
        )
        .context_item("Key directories", result.key_directories.join(", "))
        .context_item("Entry points", result.entry_points.join(", "))
}

fn objectives(kind: KnowledgeKind) -> &'static [&'static str] {
    match kind {
        KnowledgeKind::Structure => &[
            "Describe the directory layout and what each area is responsible for",
            "Identify entry points and the core modules",
            "Explain how the main pieces connect",
        ],
        KnowledgeKind::Patterns => &[
            "Describe recurring code patterns and conventions",
            "Summarize the dependency stack and what each major dependency is used for",
            "Note testing, configuration and error-handling conventions",
        ],
        KnowledgeKind::Context => &[
            "Explain the problem domain and who uses the project",
            "Describe the main workflows end to end",
            "List the things a new contributor must know before changing code",
        ],
        KnowledgeKind::Overview => &[
            "Give a one-paragraph summary of the project",
            "Summarize architecture, key patterns and workflows",
            "Point readers to the most important files",
        ],
    }
}

fn header(tier: KnowledgeTier, kind: KnowledgeKind) -> PromptBuilder {
    PromptBuilder::new()
        .role(
            "technical writer",
            &format!("{} documentation ({} tier)", kind.title(), tier),
        )
        .focus(
            kind.file_name(),
            &["Write only this document", "Start with a level-1 heading"],
        )
        .objectives(objectives(kind))
}

// =============================================================================
// Detailed Tier
// =============================================================================

pub fn structure_prompt(summary: &AnalysisSummary) -> String {
    header(KnowledgeTier::Detailed, KnowledgeKind::Structure)
        .section("Statistics", summary_stats(summary))
        .section(
            "Files by directory",
            directory_listing(summary, knowledge_constants::MAX_FILES_PER_DIRECTORY),
        )
        .section("File types", file_type_histogram(summary))
        .build()
}

pub fn patterns_prompt(summary: &AnalysisSummary) -> String {
    header(KnowledgeTier::Detailed, KnowledgeKind::Patterns)
        .section("File types", file_type_histogram(summary))
        .section(
            "Dependency frequency",
            dependency_table(summary, knowledge_constants::MAX_DEPENDENCY_ROWS),
        )
        .section("Key files", key_files(summary, 15))
        .build()
}

/// Phase-2 prompt fed with excerpts of the phase-1 documents
pub fn synthesis_prompt(
    kind: KnowledgeKind,
    summary: &AnalysisSummary,
    structure: &str,
    patterns: &str,
    excerpt_chars: usize,
) -> String {
    header(KnowledgeTier::Detailed, kind)
        .section("Statistics", summary_stats(summary))
        .section("Key files", key_files(summary, 10))
        .section("structure.md (excerpt)", excerpt(structure, excerpt_chars))
        .section("patterns.md (excerpt)", excerpt(patterns, excerpt_chars))
        .build()
}

// =============================================================================
// Quick and Deep Tiers
// =============================================================================

pub fn quick_prompt(kind: KnowledgeKind, result: &QuickAnalysisResult) -> String {
    let facts = quick_facts(result).build();
    header(KnowledgeTier::Quick, kind)
        .section("Project facts", facts)
        .text("Only the facts above are known. Keep the document short and say what is unknown.")
        .build()
}

pub fn refine_prompt(kind: KnowledgeKind, detailed: &str) -> String {
    header(KnowledgeTier::Deep, kind)
        .section("Current document", detailed.trim().to_string())
        .text(
            "Critique the current document: find gaps, vague claims and missing connections. \
             Then output the complete improved document. Output only the document.",
        )
        .anti_patterns(
            &["A list of review comments without the document", "Dropping correct sections"],
            &["The full revised document with the gaps filled"],
        )
        .build()
}
