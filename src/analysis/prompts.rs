//! Prompts for the quick scan and per-file analysis

use super::parsers::ScanAnswer;
use super::quick_scan::ProjectFacts;
use crate::ai::prompt::PromptBuilder;
use crate::constants::quick_scan as scan_constants;

pub const SCAN_SYSTEM: &str = "You classify software projects from their file listings. \
Answer only in the requested line format.";

pub const SYNTHESIS_SYSTEM: &str = "You reconcile several independent classifications of the \
same project into one answer. Prefer what most answers agree on. Answer only in the requested \
line format.";

pub const FILE_SYSTEM: &str = "You are a senior engineer writing terse notes about one source \
file at a time. Only state facts visible in the file. Answer only in the requested line format.";

const SCAN_FORMAT: &[(&str, &str)] = &[
    ("PROJECT_TYPE", "CLI, library, web app, web service, mobile app, desktop app, game, ..."),
    ("LANGUAGE", "main programming language"),
    ("FRAMEWORK", "main framework, or none"),
    ("DESCRIPTION", "one sentence describing what the project does"),
];

const FILE_FORMAT: &[(&str, &str)] = &[
    ("PURPOSE", "one sentence"),
    ("IMPORTANCE", "integer 1-10, 10 = core to the project"),
    ("SUMMARY", "2-4 sentences on what the file does and how"),
    ("DEPENDENCIES", "comma-separated imports/modules it relies on, or none"),
    ("EXPORTS", "comma-separated public items it provides, or none"),
    ("TYPE", "source, test, config, documentation, build, script, data or other"),
];

/// Ensemble prompt: project facts plus a bounded file listing
pub fn scan_prompt(facts: &ProjectFacts, files: &[String]) -> String {
    let shown = files.len().min(scan_constants::MAX_LISTED_PATHS);
    let mut listing = files[..shown].join("\n");
    if files.len() > shown {
        listing.push_str(&format!("\n... and {} more files", files.len() - shown));
    }

    PromptBuilder::new()
        .role("software architect", "identifying what a project is at a glance")
        .context_item("Files", facts.file_count.to_string())
        .context_item("Code files", facts.code_file_count.to_string())
        .context_item("Top extensions", facts.extension_summary())
        .context_item("Key directories", join_or_none(&facts.key_directories))
        .context_item("Entry points", join_or_none(&facts.entry_points))
        .section("File listing", listing)
        .key_value_format(SCAN_FORMAT)
        .build()
}

/// Consensus prompt over the non-empty ensemble answers
pub fn synthesis_prompt(answers: &[ScanAnswer]) -> String {
    let mut rendered = String::new();
    for (i, answer) in answers.iter().enumerate() {
        rendered.push_str(&format!("Answer {}:\n", i + 1));
        for (key, value) in [
            ("PROJECT_TYPE", &answer.project_type),
            ("LANGUAGE", &answer.language),
            ("FRAMEWORK", &answer.framework),
            ("DESCRIPTION", &answer.description),
        ] {
            rendered.push_str(&format!(
                "{}: {}\n",
                key,
                value.as_deref().unwrap_or("(missing)")
            ));
        }
        rendered.push('\n');
    }

    PromptBuilder::new()
        .role("software architect", "reconciling project classifications")
        .objectives(&[
            "Pick the classification most answers agree on",
            "Write the most informative accurate description",
        ])
        .section("Independent answers", rendered.trim_end().to_string())
        .key_value_format(SCAN_FORMAT)
        .build()
}

/// Per-file analysis prompt
pub fn file_prompt(path: &str, content: &str, truncated: bool) -> String {
    let language = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let mut builder = PromptBuilder::new()
        .focus(
            path,
            &[
                "Describe only this file",
                "Do NOT speculate about code you cannot see",
            ],
        )
        .code(language, content);
    if truncated {
        builder = builder.text("(file truncated)");
    }
    builder.key_value_format(FILE_FORMAT).build()
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_prompt_bounds_listing() {
        let files: Vec<String> = (0..250).map(|i| format!("src/f{i}.rs")).collect();
        let facts = ProjectFacts::from_files(&files);
        let prompt = scan_prompt(&facts, &files);

        assert!(prompt.contains("src/f199.rs"));
        assert!(!prompt.contains("src/f200.rs"));
        assert!(prompt.contains("and 50 more files"));
        assert!(prompt.contains("PROJECT_TYPE: <"));
    }

    #[test]
    fn test_synthesis_prompt_lists_answers() {
        let answers = vec![
            ScanAnswer {
                project_type: Some("CLI".into()),
                ..Default::default()
            },
            ScanAnswer {
                language: Some("Rust".into()),
                ..Default::default()
            },
        ];
        let prompt = synthesis_prompt(&answers);
        assert!(prompt.contains("Answer 2:"));
        assert!(prompt.contains("PROJECT_TYPE: CLI"));
        assert!(prompt.contains("LANGUAGE: (missing)"));
    }

    #[test]
    fn test_file_prompt() {
        let prompt = file_prompt("src/lib.rs", "pub fn f() {}", true);
        assert!(prompt.contains("```rs\npub fn f() {}\n```"));
        assert!(prompt.contains("(file truncated)"));
        assert!(prompt.contains("IMPORTANCE: <integer 1-10"));
    }
}
