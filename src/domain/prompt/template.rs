//! Prompt templating
//!
//! Variable syntax: `${var:name}`, or `${var:name:default}` with a
//! fallback. Variables without a value and without a default render
//! empty, so templates stay total over partial inputs.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

static VARIABLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{var:([a-zA-Z0-9][-a-zA-Z0-9]*)(?::([^}]*))?\}").unwrap());

/// A textual substitution template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    content: String,
}

impl PromptTemplate {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Substitute every variable occurrence with its value, its default,
    /// or the empty string
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        VARIABLE_PATTERN
            .replace_all(&self.content, |caps: &regex::Captures| {
                values
                    .get(&caps[1])
                    .cloned()
                    .or_else(|| caps.get(2).map(|m| m.as_str().to_string()))
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_values() {
        let template = PromptTemplate::new("Hello, ${var:name}!");
        assert_eq!(template.render(&values(&[("name", "Alice")])), "Hello, Alice!");
    }

    #[test]
    fn test_render_uses_default() {
        let template = PromptTemplate::new("Hello, ${var:name:World}!");
        assert_eq!(template.render(&HashMap::new()), "Hello, World!");
        assert_eq!(template.render(&values(&[("name", "Bob")])), "Hello, Bob!");
    }

    #[test]
    fn test_render_missing_variable_is_empty() {
        let template = PromptTemplate::new("[${var:gone}]");
        assert_eq!(template.render(&HashMap::new()), "[]");
    }

    #[test]
    fn test_render_repeated_variable() {
        let template = PromptTemplate::new("${var:x} and ${var:x}");
        assert_eq!(template.render(&values(&[("x", "a")])), "a and a");
    }

    #[test]
    fn test_render_hyphenated_names() {
        let template = PromptTemplate::new("${var:tool-names:none}");
        assert_eq!(template.render(&HashMap::new()), "none");
    }

    #[test]
    fn test_plain_text_untouched() {
        let template = PromptTemplate::new("no variables here");
        assert_eq!(template.render(&HashMap::new()), "no variables here");
    }
}
