use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{
    CompleteOptions, Completer, Completion, CompletionReason, DomainError, FunctionCall, Message,
    MessageRole, PromptTemplate,
};

/// Halts generation before the model invents a tool result
const PROMPT_STOP: &str = "\nObservation:";

const REACT_TEMPLATE: &str = r#"Answer the following questions as best you can. You have access to the following tools:

${var:tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, must be one of [${var:tool-names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original question

Begin!

${var:transcript}
Thought:"#;

static ACTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Action: (.*)\s+Action Input: (.*)").unwrap());
static ANSWER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"Final Answer: (.*)").unwrap());

/// Tool-use reasoning over a plain text transcript.
///
/// Without tools the chain is a passthrough. With tools, every invocation
/// flattens the whole history into a Question/Thought/Action/Observation
/// transcript and asks the completer for the next step. The chain keeps
/// no state of its own: the model's raw output rides along as a base64
/// correlation token on the emitted function call, and the next turn's
/// tool result echoes it back for replay.
pub struct ReactChain {
    completer: Arc<dyn Completer>,
    template: PromptTemplate,
    system: Option<String>,
}

impl ReactChain {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            template: PromptTemplate::new(REACT_TEMPLATE),
            system: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    fn render_prompt(&self, messages: &[Message], options: &CompleteOptions) -> String {
        let tools = options
            .tools
            .iter()
            .map(|tool| format!("{}: {}", tool.name, tool.description))
            .collect::<Vec<_>>()
            .join("\n");

        let tool_names = options
            .tools
            .iter()
            .map(|tool| tool.name.clone())
            .collect::<Vec<_>>()
            .join(", ");

        let transcript = flatten_transcript(messages).join("\n");

        let values = HashMap::from([
            ("tools".to_string(), tools),
            ("tool-names".to_string(), tool_names),
            ("transcript".to_string(), transcript),
        ]);

        self.template.render(&values).trim().to_string()
    }
}

#[async_trait]
impl Completer for ReactChain {
    async fn complete(
        &self,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<Completion, DomainError> {
        if options.tools.is_empty() {
            return self.completer.complete(messages, options).await;
        }

        let prompt = self.render_prompt(messages, &options);

        let mut inner_messages = Vec::new();

        if let Some(ref system) = self.system {
            inner_messages.push(Message::system(system.trim()));
        }

        inner_messages.push(Message::user(prompt));

        let inner_options = CompleteOptions::new()
            .with_stop(vec![PROMPT_STOP.to_string()])
            .with_temperature(0.0);

        let completion = self.completer.complete(&inner_messages, inner_options).await?;
        let content = completion.content().trim().to_string();

        if let Some(answer) = extract_answer(&content) {
            return Ok(Completion::new(completion.id, Message::assistant(answer))
                .with_reason(CompletionReason::Stop));
        }

        if let Some((action, input)) = extract_action(&content) {
            let arguments = serde_json::json!({ "query": input }).to_string();
            let token = STANDARD_NO_PAD.encode(content.as_bytes());

            let call = FunctionCall::new(action, arguments).with_id(token);
            let message = Message::assistant("").with_function_calls(vec![call]);

            return Ok(Completion::new(completion.id, message)
                .with_reason(CompletionReason::Function));
        }

        Err(DomainError::chain("no answer found"))
    }
}

/// Rewrite the message history as labelled transcript lines.
///
/// Tool results first replay the lines of the correlation token they
/// carry, so the model sees its own prior reasoning, then land as an
/// Observation entry.
fn flatten_transcript(messages: &[Message]) -> Vec<String> {
    let mut entries = Vec::new();

    for message in messages {
        match message.role {
            MessageRole::User => {
                entries.push(format!("Question: {}", message.content.trim()));
            }
            MessageRole::Assistant => {
                if message.content.is_empty() {
                    continue;
                }

                entries.push("Thought: I now know the final answer.".to_string());
                entries.push(format!("Final Answer: {}", message.content.trim()));
            }
            MessageRole::Tool => {
                if let Some(raw) = message
                    .function
                    .as_deref()
                    .and_then(|token| STANDARD_NO_PAD.decode(token).ok())
                {
                    for line in String::from_utf8_lossy(&raw).trim().lines() {
                        let line = line.trim();

                        if line.is_empty() {
                            continue;
                        }

                        let Some((label, content)) = line.split_once(':') else {
                            continue;
                        };

                        entries.push(format!("{}: {}", label.trim(), content.trim()));
                    }
                }

                entries.push(format!("Observation: {}", message.content.trim()));
            }
            MessageRole::System => {}
        }
    }

    entries
}

fn extract_answer(content: &str) -> Option<String> {
    ANSWER_PATTERN
        .captures_iter(content)
        .last()
        .map(|caps| caps[1].to_string())
}

fn extract_action(content: &str) -> Option<(String, String)> {
    ACTION_PATTERN
        .captures_iter(content)
        .last()
        .map(|caps| (caps[1].trim().to_string(), caps[2].trim().to_string()))
}
