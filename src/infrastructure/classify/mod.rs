use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Classifier, CompleteOptions, Completer, DomainError, Message, PromptTemplate};

static LABEL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").unwrap());

const CLASSIFIER_TEMPLATE: &str = r#"Classify the input into exactly one of these categories:

${var:categories}

Answer with the category name and nothing else.

Input:
${var:input}

Category:"#;

/// One category a classifier may assign
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub description: String,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Classifier prompting a completer to pick one category.
///
/// Completions are requested at low temperature with a newline stop, and
/// the reply is reduced to its first alphabetic token so chatty models
/// still yield a usable label.
pub struct LlmClassifier {
    completer: Arc<dyn Completer>,
    categories: Vec<Category>,
    template: PromptTemplate,
}

impl LlmClassifier {
    pub fn new(completer: Arc<dyn Completer>, categories: Vec<Category>) -> Self {
        Self {
            completer,
            categories,
            template: PromptTemplate::new(CLASSIFIER_TEMPLATE),
        }
    }

    fn render_prompt(&self, input: &str) -> String {
        let categories = self
            .categories
            .iter()
            .map(|category| {
                if category.description.is_empty() {
                    category.name.clone()
                } else {
                    format!("{}: {}", category.name, category.description)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let values = HashMap::from([
            ("categories".to_string(), categories),
            ("input".to_string(), input.to_string()),
        ]);

        self.template.render(&values)
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, input: &str) -> Result<String, DomainError> {
        let prompt = self.render_prompt(input);

        let options = CompleteOptions::new()
            .with_temperature(0.1)
            .with_stop(vec!["\n".to_string()]);

        let completion = self
            .completer
            .complete(&[Message::user(prompt)], options)
            .await?;

        Ok(extract_label(completion.content()))
    }
}

/// Normalize a raw model reply down to a category label
fn extract_label(raw: &str) -> String {
    let mut label = raw.trim().to_lowercase();

    for prefix in ["class:", "category:"] {
        if let Some(stripped) = label.strip_prefix(prefix) {
            label = stripped.trim().to_string();
        }
    }

    LABEL_TOKEN
        .find(&label)
        .map(|found| found.as_str().to_string())
        .unwrap_or_default()
}
