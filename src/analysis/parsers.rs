//! Model Response Parsers
//!
//! Parsing never fails outright. Missing fields come back as `None` or
//! defaults; only a file analysis without a summary is reported as a parse
//! failure, and the caller turns that into a flagged record.

use regex::Regex;
use std::sync::LazyLock;

use super::types::{FileType, clamp_importance};
use crate::ai::response::{KeyValueBlock, is_none_marker};
use crate::constants::analysis as analysis_constants;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+").expect("integer pattern is valid"));

// =============================================================================
// Quick Scan Answers
// =============================================================================

pub const SCAN_KEYS: &[&str] = &["PROJECT_TYPE", "LANGUAGE", "FRAMEWORK", "DESCRIPTION"];

/// One (possibly partial) ensemble answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanAnswer {
    pub project_type: Option<String>,
    pub language: Option<String>,
    /// Raw framework value; "none" is kept so it can win the vote
    pub framework: Option<String>,
    pub description: Option<String>,
}

impl ScanAnswer {
    /// No field populated
    pub fn is_empty(&self) -> bool {
        self.project_type.is_none()
            && self.language.is_none()
            && self.framework.is_none()
            && self.description.is_none()
    }

    /// Every field except the optional framework populated
    pub fn is_complete(&self) -> bool {
        self.project_type.is_some() && self.language.is_some() && self.description.is_some()
    }

    /// Fill missing fields from `other`
    pub fn or(self, other: ScanAnswer) -> ScanAnswer {
        ScanAnswer {
            project_type: self.project_type.or(other.project_type),
            language: self.language.or(other.language),
            framework: self.framework.or(other.framework),
            description: self.description.or(other.description),
        }
    }

    /// Framework with "none"-style values mapped to `None`
    pub fn framework_name(&self) -> Option<&str> {
        self.framework
            .as_deref()
            .filter(|f| !is_none_marker(f))
    }
}

pub fn parse_scan_answer(text: &str) -> ScanAnswer {
    let block = KeyValueBlock::parse(text, SCAN_KEYS);
    let informative = |key: &str| {
        block
            .get(key)
            .filter(|v| !is_none_marker(v))
            .map(String::from)
    };

    ScanAnswer {
        project_type: informative("PROJECT_TYPE"),
        language: informative("LANGUAGE"),
        // "none" is an answer for the framework, "unknown" is not
        framework: block
            .get("FRAMEWORK")
            .filter(|v| !v.trim().eq_ignore_ascii_case("unknown"))
            .map(String::from),
        description: informative("DESCRIPTION"),
    }
}

// =============================================================================
// File Analysis
// =============================================================================

pub const FILE_KEYS: &[&str] = &[
    "PURPOSE",
    "IMPORTANCE",
    "SUMMARY",
    "DEPENDENCIES",
    "EXPORTS",
    "TYPE",
];

/// Fields extracted from a per-file analysis answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileAnalysis {
    pub purpose: String,
    pub importance: u8,
    pub summary: String,
    pub dependencies: Vec<String>,
    pub exports: Vec<String>,
    pub file_type: Option<FileType>,
}

/// Parse a per-file answer; `Err` carries the reason when no summary is found
pub fn parse_file_analysis(text: &str) -> std::result::Result<ParsedFileAnalysis, String> {
    let block = KeyValueBlock::parse(text, FILE_KEYS);

    let summary = block
        .get("SUMMARY")
        .filter(|s| !is_none_marker(s))
        .map(String::from)
        .ok_or_else(|| {
            if block.is_empty() {
                "response did not follow the expected format".to_string()
            } else {
                "response is missing SUMMARY".to_string()
            }
        })?;

    let purpose = block
        .get("PURPOSE")
        .map(String::from)
        .unwrap_or_else(|| first_sentence(&summary));

    Ok(ParsedFileAnalysis {
        purpose,
        importance: block
            .get("IMPORTANCE")
            .map(parse_importance)
            .unwrap_or(analysis_constants::DEFAULT_IMPORTANCE),
        summary,
        dependencies: block.list("DEPENDENCIES"),
        exports: block.list("EXPORTS"),
        file_type: block.get("TYPE").and_then(FileType::from_label),
    })
}

/// First integer in `value`, clamped to 1..=10; default when absent
///
/// Integers too large for `i64` saturate toward their sign.
pub fn parse_importance(value: &str) -> u8 {
    let Some(digits) = INTEGER.find(value).map(|m| m.as_str()) else {
        return analysis_constants::DEFAULT_IMPORTANCE;
    };
    let number = digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    });
    clamp_importance(number)
}

fn first_sentence(text: &str) -> String {
    match text.find(". ") {
        Some(idx) => text[..=idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_full_scan_answer() {
        let answer = parse_scan_answer(
            "PROJECT_TYPE: CLI\nLANGUAGE: Rust\nFRAMEWORK: clap\nDESCRIPTION: A code analysis tool.",
        );
        assert_eq!(answer.project_type.as_deref(), Some("CLI"));
        assert_eq!(answer.language.as_deref(), Some("Rust"));
        assert_eq!(answer.framework_name(), Some("clap"));
        assert!(answer.is_complete());
    }

    #[test]
    fn test_partial_scan_answer_is_kept() {
        let answer = parse_scan_answer("Sure!\nLANGUAGE: Go\nPROJECT_TYPE: unknown");
        assert!(!answer.is_empty());
        assert!(answer.project_type.is_none());
        assert!(!answer.is_complete());
    }

    #[test]
    fn test_framework_none_is_an_answer() {
        let answer = parse_scan_answer("FRAMEWORK: none");
        assert!(!answer.is_empty());
        assert_eq!(answer.framework.as_deref(), Some("none"));
        assert_eq!(answer.framework_name(), None);
    }

    #[test]
    fn test_garbage_scan_answer_is_empty() {
        assert!(parse_scan_answer("I'm not sure what this project is.").is_empty());
        assert!(parse_scan_answer("").is_empty());
    }

    #[test]
    fn test_scan_answer_gap_filling() {
        let synthesized = ScanAnswer {
            project_type: Some("CLI".into()),
            ..Default::default()
        };
        let voted = ScanAnswer {
            project_type: Some("library".into()),
            language: Some("Rust".into()),
            ..Default::default()
        };
        let merged = synthesized.or(voted);
        assert_eq!(merged.project_type.as_deref(), Some("CLI"));
        assert_eq!(merged.language.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_parse_file_analysis() {
        let parsed = parse_file_analysis(
            "PURPOSE: Defines the CLI entry point\n\
             IMPORTANCE: 9/10\n\
             SUMMARY: Parses arguments and runs the selected command.\n\
             DEPENDENCIES: clap, tokio, crate::cli\n\
             EXPORTS: none\n\
             TYPE: source",
        )
        .unwrap();

        assert_eq!(parsed.purpose, "Defines the CLI entry point");
        assert_eq!(parsed.importance, 9);
        assert_eq!(parsed.dependencies, vec!["clap", "tokio", "crate::cli"]);
        assert!(parsed.exports.is_empty());
        assert_eq!(parsed.file_type, Some(FileType::Source));
    }

    #[test]
    fn test_file_analysis_defaults() {
        let parsed = parse_file_analysis("SUMMARY: Helper functions. Used by tests.").unwrap();
        assert_eq!(parsed.importance, 5);
        assert_eq!(parsed.purpose, "Helper functions.");
        assert_eq!(parsed.file_type, None);
    }

    #[test]
    fn test_file_analysis_without_summary_is_flagged() {
        let err = parse_file_analysis("PURPOSE: something\nIMPORTANCE: 4").unwrap_err();
        assert!(err.contains("SUMMARY"));
        assert!(parse_file_analysis("no idea").is_err());
    }

    #[test]
    fn test_importance_parsing() {
        assert_eq!(parse_importance("8"), 8);
        assert_eq!(parse_importance("**7** (core)"), 7);
        assert_eq!(parse_importance("42"), 10);
        assert_eq!(parse_importance("0"), 1);
        assert_eq!(parse_importance("-3"), 1);
        assert_eq!(parse_importance("high"), 5);
        assert_eq!(parse_importance("99999999999999999999"), 10);
        assert_eq!(parse_importance("-99999999999999999999"), 1);
    }

    proptest! {
        #[test]
        fn prop_importance_always_in_range(text in ".{0,20}") {
            let value = parse_importance(&text);
            prop_assert!((1..=10).contains(&value));
        }
    }
}
