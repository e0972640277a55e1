//! Response Text Helpers
//!
//! Models are asked for plain `KEY: value` blocks rather than JSON; small local
//! models follow that format far more reliably. These helpers tolerate the
//! usual decorations (markdown bullets, bold keys, code fences) and never fail:
//! missing keys are simply absent from the result.

use std::collections::HashMap;

/// Parsed `KEY: value` block
///
/// Keys are normalized to upper case. A line that does not start with a known
/// key continues the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueBlock {
    values: HashMap<String, String>,
}

impl KeyValueBlock {
    /// Parse `text`, recognizing only the given keys
    pub fn parse(text: &str, keys: &[&str]) -> Self {
        let mut values: HashMap<String, String> = HashMap::new();
        let mut current: Option<String> = None;

        for raw_line in strip_code_fences(text).lines() {
            let line = clean_line(raw_line);
            if line.is_empty() || line.starts_with("```") {
                continue;
            }

            if let Some((key, value)) = match_key(line, keys) {
                // First occurrence wins; models sometimes repeat the template.
                if values.contains_key(&key) {
                    current = None;
                    continue;
                }
                values.insert(key.clone(), value.trim().to_string());
                current = Some(key);
            } else if let Some(key) = &current
                && let Some(existing) = values.get_mut(key)
            {
                if !existing.is_empty() {
                    existing.push(' ');
                }
                existing.push_str(line);
            }
        }

        values.retain(|_, v| !v.is_empty());
        Self { values }
    }

    /// Value for `key`, if present and non-empty
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_uppercase()).map(String::as_str)
    }

    /// Comma/semicolon separated list; "none" and similar yield an empty list
    pub fn list(&self, key: &str) -> Vec<String> {
        let Some(value) = self.get(key) else {
            return Vec::new();
        };
        if is_none_marker(value) {
            return Vec::new();
        }
        value
            .split([',', ';'])
            .map(|s| s.trim().trim_matches('`').trim())
            .filter(|s| !s.is_empty() && !is_none_marker(s))
            .map(String::from)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// True for values models use to say "nothing here"
pub fn is_none_marker(value: &str) -> bool {
    matches!(
        value.trim().trim_end_matches('.').to_lowercase().as_str(),
        "" | "none" | "n/a" | "na" | "null" | "nil" | "-" | "unknown" | "not applicable"
    )
}

/// Strip a wrapping markdown code fence (```lang ... ```)
///
/// Only a fence around the whole text is removed: the text must open with a
/// bare, `markdown`, `md` or `text` fence line and close with ```. Anything
/// else, such as a document that merely starts with a code block, is returned
/// trimmed but otherwise unchanged.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    let (lang, body) = match rest.split_once('\n') {
        Some((lang, body)) => (lang.trim(), body),
        None if rest.trim().is_empty() => return String::new(),
        None => return trimmed.to_string(),
    };
    if !WRAPPER_LANGS.contains(&lang.to_ascii_lowercase().as_str()) {
        return trimmed.to_string();
    }

    match body.trim_end().strip_suffix("```") {
        Some(inner) if inner.is_empty() || inner.ends_with('\n') => inner.trim_end().to_string(),
        _ => trimmed.to_string(),
    }
}

const WRAPPER_LANGS: &[&str] = &["", "markdown", "md", "text", "txt"];

/// Truncate to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

fn clean_line(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['-', '*', '#', '>'])
        .trim_start()
}

fn match_key(line: &str, keys: &[&str]) -> Option<(String, String)> {
    let (head, tail) = line.split_once(':')?;
    let head = head.trim().trim_matches('*').trim_matches('_').trim();
    let normalized = head.to_uppercase().replace([' ', '-'], "_");

    keys.iter()
        .find(|k| k.eq_ignore_ascii_case(&normalized))
        .map(|k| {
            let value = tail.trim().trim_start_matches('*').trim_start_matches('_');
            (k.to_uppercase(), value.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &["PURPOSE", "IMPORTANCE", "SUMMARY", "DEPENDENCIES"];

    #[test]
    fn test_parse_plain_block() {
        let text = "PURPOSE: Entry point\nIMPORTANCE: 9\nSUMMARY: Parses args.\nDEPENDENCIES: clap, tokio";
        let block = KeyValueBlock::parse(text, KEYS);
        assert_eq!(block.get("purpose"), Some("Entry point"));
        assert_eq!(block.get("IMPORTANCE"), Some("9"));
        assert_eq!(block.list("DEPENDENCIES"), vec!["clap", "tokio"]);
    }

    #[test]
    fn test_parse_decorated_block() {
        let text = "```\n- **Purpose:** Entry point\n* **Summary**: Parses args\n  and dispatches commands.\n```";
        let block = KeyValueBlock::parse(text, KEYS);
        assert_eq!(block.get("PURPOSE"), Some("Entry point"));
        assert_eq!(
            block.get("SUMMARY"),
            Some("Parses args and dispatches commands.")
        );
    }

    #[test]
    fn test_fence_lines_never_join_values() {
        let text = "```yaml\nPURPOSE: Entry point\nSUMMARY: Parses args.\n```";
        let block = KeyValueBlock::parse(text, KEYS);
        assert_eq!(block.get("PURPOSE"), Some("Entry point"));
        assert_eq!(block.get("SUMMARY"), Some("Parses args."));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "PURPOSE: first\nPURPOSE: second";
        let block = KeyValueBlock::parse(text, KEYS);
        assert_eq!(block.get("PURPOSE"), Some("first"));
    }

    #[test]
    fn test_none_markers() {
        let block = KeyValueBlock::parse("DEPENDENCIES: none", KEYS);
        assert!(block.list("DEPENDENCIES").is_empty());
        assert!(is_none_marker("N/A"));
        assert!(is_none_marker("None."));
        assert!(!is_none_marker("axum"));
    }

    #[test]
    fn test_garbage_yields_empty_block() {
        let block = KeyValueBlock::parse("I cannot help with that.", KEYS);
        assert!(block.is_empty());
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```markdown\n# Title\n```"), "# Title");
        assert_eq!(strip_code_fences("# Title"), "# Title");
        assert_eq!(strip_code_fences("```"), "");
        assert_eq!(strip_code_fences("```\n```"), "");
    }

    #[test]
    fn test_leading_code_block_is_kept() {
        let doc = "```bash\nmake build\n```\n\n# Title\nBody";
        assert_eq!(strip_code_fences(doc), doc);

        let doc = "```\ncargo test\n```\n\nRun the suite first.";
        assert_eq!(strip_code_fences(doc), doc);
    }

    #[test]
    fn test_wrapper_keeps_inner_code_blocks() {
        let doc = "```markdown\n# Build\n```bash\nmake\n```\nDone.\n```";
        assert_eq!(strip_code_fences(doc), "# Build\n```bash\nmake\n```\nDone.");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        let (head, truncated) = truncate_chars("héllo", 2);
        assert_eq!(head, "hé");
        assert!(truncated);

        let (head, truncated) = truncate_chars("abc", 10);
        assert_eq!(head, "abc");
        assert!(!truncated);
    }
}
