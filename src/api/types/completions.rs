//! Legacy text completion wire types

use serde::{Deserialize, Serialize};

use super::chat::{FinishReason, StopSequence, Usage};
use crate::domain::llm::Completion;

/// Prompt input, either one string or an array of strings.
/// Only the last entry of an array is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptInput {
    Single(String),
    Multiple(Vec<String>),
}

impl PromptInput {
    pub fn last(&self) -> Option<&str> {
        match self {
            Self::Single(prompt) => Some(prompt.as_str()),
            Self::Multiple(prompts) => prompts.last().map(String::as_str),
        }
    }
}

/// Legacy completion request (OpenAI `/v1/completions` format)
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionRequest {
    pub model: String,

    pub prompt: PromptInput,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub stop: Option<StopSequence>,

    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub text: String,
    pub index: u32,
    pub finish_reason: Option<FinishReason>,
}

/// Legacy completion response; streaming reuses the same shape with
/// partial `text` per frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    fn new(id: &str, model: &str, text: &str, finish_reason: Option<FinishReason>) -> Self {
        Self {
            id: id.to_string(),
            object: "text_completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![CompletionChoice {
                text: text.to_string(),
                index: 0,
                finish_reason,
            }],
            usage: None,
        }
    }

    pub fn from_completion(id: &str, model: &str, completion: &Completion) -> Self {
        let mut response = Self::new(
            id,
            model,
            completion.content(),
            completion.reason.map(FinishReason::from),
        );
        response.usage = completion.usage.map(Usage::from);
        response
    }

    /// One streaming frame carrying a text delta
    pub fn delta(id: &str, model: &str, text: &str) -> Self {
        Self::new(id, model, text, None)
    }

    /// Terminal streaming frame carrying the finish reason
    pub fn finish(id: &str, model: &str, reason: FinishReason) -> Self {
        Self::new(id, model, "", Some(reason))
    }
}
