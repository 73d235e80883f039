use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    CompleteOptions, Completer, Completion, DomainError, Message, MessageRole, PromptTemplate,
};

const CONTEXTUALIZE_TEMPLATE: &str = r#"Given the conversation below, rewrite the latest user question as a single standalone question that keeps all relevant context. Return only the question.

Conversation:
${var:history}

Standalone question:"#;

/// Condenses a conversation into one standalone question.
///
/// Wired in front of the Refine chain so follow-up questions carry their
/// context into retrieval.
pub struct Contextualizer {
    completer: Arc<dyn Completer>,
    template: PromptTemplate,
}

impl Contextualizer {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            template: PromptTemplate::new(CONTEXTUALIZE_TEMPLATE),
        }
    }

    fn render_history(messages: &[Message]) -> String {
        messages
            .iter()
            .filter(|message| message.role != MessageRole::System)
            .map(|message| {
                let role = match message.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                    MessageRole::Tool => "tool",
                    MessageRole::System => "system",
                };

                format!("{}: {}", role, message.content.trim())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Completer for Contextualizer {
    async fn complete(
        &self,
        messages: &[Message],
        _options: CompleteOptions,
    ) -> Result<Completion, DomainError> {
        let values = HashMap::from([("history".to_string(), Self::render_history(messages))]);

        let prompt = self.template.render(&values);
        let options = CompleteOptions::new().with_temperature(0.0);

        self.completer.complete(&[Message::user(prompt)], options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::mock::MockCompleter;

    #[tokio::test]
    async fn test_renders_history_into_condense_prompt() {
        let inner = Arc::new(MockCompleter::new().with_completion(Completion::new(
            "c",
            Message::assistant("When was Rust released?"),
        )));

        let contextualizer = Contextualizer::new(inner.clone());

        let messages = vec![
            Message::system("be helpful"),
            Message::user("tell me about rust"),
            Message::assistant("Rust is a systems language."),
            Message::user("when was it released?"),
        ];

        let completion = contextualizer
            .complete(&messages, CompleteOptions::default())
            .await
            .unwrap();

        assert_eq!(completion.content(), "When was Rust released?");

        let (inner_messages, options) = &inner.calls()[0];
        let prompt = &inner_messages[0].content;

        assert!(prompt.contains("user: tell me about rust"));
        assert!(prompt.contains("assistant: Rust is a systems language."));
        assert!(prompt.contains("user: when was it released?"));
        assert!(!prompt.contains("be helpful"));

        assert_eq!(options.temperature, Some(0.0));
    }
}
