use serde::{Deserialize, Serialize};

use super::Message;

/// Why a completion stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionReason {
    Stop,
    Length,
    Function,
}

/// Token usage reported by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// One completion produced by a backend or chain.
///
/// Streaming backends emit a sequence of these: every item carries a
/// content delta in `message`, and only the terminal item has a `reason`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CompletionReason>,

    pub message: Message,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn new(id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            reason: None,
            message,
            usage: None,
        }
    }

    pub fn with_reason(mut self, reason: CompletionReason) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Content of the carried message
    pub fn content(&self) -> &str {
        &self.message.content
    }
}
