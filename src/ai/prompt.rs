//! Prompt Builder
//!
//! Standardized prompt construction for every pipeline call. Sections are
//! rendered in insertion order so identical inputs always produce identical
//! prompts.

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Numbered objectives
    Objectives(Vec<String>),
    /// Ordered key-value facts
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Code block with language
    Code { language: String, content: String },
    /// Focus enforcement with restrictions
    Focus {
        target: String,
        restrictions: Vec<String>,
    },
    /// `KEY: value` response template
    KeyValueFormat(Vec<(String, String)>),
    /// Anti-patterns with good/bad examples
    AntiPatterns { bad: Vec<String>, good: Vec<String> },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add objectives section
    pub fn objectives(mut self, objectives: &[&str]) -> Self {
        self.sections.push(PromptSection::Objectives(
            objectives.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Add a context item, appending to the existing context section
    pub fn context_item(mut self, key: &str, value: impl Into<String>) -> Self {
        let item = (key.to_string(), value.into());
        for section in &mut self.sections {
            if let PromptSection::Context(ctx) = section {
                ctx.push(item);
                return self;
            }
        }
        self.sections.push(PromptSection::Context(vec![item]));
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.into(),
        });
        self
    }

    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.into(),
        });
        self
    }

    /// Add code block
    pub fn code(mut self, language: &str, content: impl Into<String>) -> Self {
        self.sections.push(PromptSection::Code {
            language: language.to_string(),
            content: content.into(),
        });
        self
    }

    /// Add focus enforcement section
    pub fn focus(mut self, target: &str, restrictions: &[&str]) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Require a `KEY: value` answer; each pair is (key, description)
    pub fn key_value_format(mut self, fields: &[(&str, &str)]) -> Self {
        self.sections.push(PromptSection::KeyValueFormat(
            fields
                .iter()
                .map(|(k, d)| (k.to_string(), d.to_string()))
                .collect(),
        ));
        self
    }

    /// Add anti-patterns section
    pub fn anti_patterns(mut self, bad: &[&str], good: &[&str]) -> Self {
        self.sections.push(PromptSection::AntiPatterns {
            bad: bad.iter().map(|s| s.to_string()).collect(),
            good: good.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Objectives(objectives) => {
                    prompt.push_str("<OBJECTIVES>\n");
                    for (i, obj) in objectives.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, obj));
                    }
                    prompt.push_str("</OBJECTIVES>\n\n");
                }
                PromptSection::Context(ctx) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in ctx {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Code { language, content } => {
                    prompt.push_str(&format!("```{}\n", language));
                    prompt.push_str(&content);
                    prompt.push_str("\n```\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str("<FOCUS>\n");
                    prompt.push_str(&format!("IMPORTANT: Focus EXCLUSIVELY on: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push_str("</FOCUS>\n\n");
                }
                PromptSection::KeyValueFormat(fields) => {
                    prompt.push_str("<OUTPUT_FORMAT>\n");
                    prompt.push_str(
                        "Respond with exactly these lines and nothing else. No markdown, no preamble.\n",
                    );
                    for (key, description) in fields {
                        prompt.push_str(&format!("{}: <{}>\n", key, description));
                    }
                    prompt.push_str("</OUTPUT_FORMAT>\n\n");
                }
                PromptSection::AntiPatterns { bad, good } => {
                    prompt.push_str("## ANTI-PATTERNS\n\n");
                    prompt.push_str("<what_not_to_do>\n");
                    for example in bad {
                        prompt.push_str(&format!("WRONG: {}\n", example));
                    }
                    prompt.push_str("</what_not_to_do>\n\n");
                    prompt.push_str("<what_to_do>\n");
                    for example in good {
                        prompt.push_str(&format!("CORRECT: {}\n", example));
                    }
                    prompt.push_str("</what_to_do>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("code analyst", "Rust projects")
            .objectives(&["Classify the project", "Name the language"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("code analyst"));
        assert!(prompt.contains("1. Classify the project"));
        assert!(prompt.contains("2. Name the language"));
    }

    #[test]
    fn test_context_items_keep_order() {
        let prompt = PromptBuilder::new()
            .context_item("Project", "strata")
            .context_item("Language", "Rust")
            .build();

        let project = prompt.find("**Project**: strata").unwrap();
        let language = prompt.find("**Language**: Rust").unwrap();
        assert!(project < language);
        assert_eq!(prompt.matches("# Context").count(), 1);
    }

    #[test]
    fn test_key_value_format() {
        let prompt = PromptBuilder::new()
            .key_value_format(&[("PURPOSE", "one sentence"), ("IMPORTANCE", "1-10")])
            .build();
        assert!(prompt.contains("PURPOSE: <one sentence>"));
        assert!(prompt.contains("IMPORTANCE: <1-10>"));
    }

    #[test]
    fn test_focus_and_code() {
        let prompt = PromptBuilder::new()
            .focus("src/main.rs", &["Do NOT speculate"])
            .code("rust", "fn main() {}")
            .build();

        assert!(prompt.contains("<FOCUS>"));
        assert!(prompt.contains("- Do NOT speculate"));
        assert!(prompt.contains("```rust\nfn main() {}\n```"));
    }

    #[test]
    fn test_anti_patterns() {
        let prompt = PromptBuilder::new()
            .anti_patterns(&["Generic statements"], &["Specific file references"])
            .build();

        assert!(prompt.contains("WRONG: Generic statements"));
        assert!(prompt.contains("CORRECT: Specific file references"));
    }
}
