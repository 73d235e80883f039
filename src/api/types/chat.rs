//! OpenAI-compatible chat completion wire types

use serde::{Deserialize, Serialize};

use crate::domain::llm::{
    Completion, CompletionReason, FunctionCall, Message, MessageRole, Tool,
};

/// Role of a chat message on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl From<ChatMessageRole> for MessageRole {
    fn from(role: ChatMessageRole) -> Self {
        match role {
            ChatMessageRole::System => Self::System,
            ChatMessageRole::User => Self::User,
            ChatMessageRole::Assistant => Self::Assistant,
            ChatMessageRole::Tool => Self::Tool,
        }
    }
}

impl From<MessageRole> for ChatMessageRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::System => Self::System,
            MessageRole::User => Self::User,
            MessageRole::Assistant => Self::Assistant,
            MessageRole::Tool => Self::Tool,
        }
    }
}

/// Message content, either a bare string or an array of typed parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One entry of a multi-part message; non-text parts are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },

    #[serde(other)]
    Unsupported,
}

impl MessageContent {
    /// Flatten to plain text, joining text parts with blank lines
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::Unsupported => None,
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

/// A chat message in the OpenAI request/response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatMessageRole,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Correlation id of the call a tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn to_domain(&self) -> Message {
        let content = self
            .content
            .as_ref()
            .map(MessageContent::to_text)
            .unwrap_or_default();

        let mut message = Message::new(self.role.into(), content);

        if let Some(id) = &self.tool_call_id {
            message = message.with_function(id.clone());
        }

        if let Some(calls) = &self.tool_calls {
            let calls = calls
                .iter()
                .map(|call| {
                    FunctionCall::new(&call.function.name, &call.function.arguments)
                        .with_id(&call.id)
                })
                .collect();
            message = message.with_function_calls(calls);
        }

        message
    }

    pub fn from_domain(message: &Message) -> Self {
        let tool_calls: Vec<ToolCall> = message
            .function_calls
            .iter()
            .map(ToolCall::from_domain)
            .collect();

        // Assistant turns that only carry tool calls have no content field
        let content = if message.content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(MessageContent::Text(message.content.clone()))
        };

        Self {
            role: message.role.into(),
            content,
            name: None,
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: message.function.clone(),
        }
    }
}

/// A function invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub function: ToolCallFunction,
}

impl ToolCall {
    pub fn from_domain(call: &FunctionCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: "function".to_string(),
            function: ToolCallFunction {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    pub arguments: String,
}

/// A tool advertised by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,

    pub function: ToolFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Map client tool definitions to the domain, skipping non-function kinds
pub fn to_tools(definitions: &[ToolDefinition]) -> Vec<Tool> {
    definitions
        .iter()
        .filter(|d| d.kind == "function")
        .map(|d| {
            let mut tool = Tool::new(&d.function.name, &d.function.description);
            if let Some(parameters) = &d.function.parameters {
                tool = tool.with_parameters(parameters.clone());
            }
            tool
        })
        .collect()
}

/// Stop sequences, either a single string or an array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequence {
    Single(String),
    Multiple(Vec<String>),
}

impl StopSequence {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Single(stop) => vec![stop.clone()],
            Self::Multiple(stops) => stops.clone(),
        }
    }
}

/// Chat completion request (OpenAI format)
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    /// Backend model or chain name
    pub model: String,

    pub messages: Vec<ChatMessage>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub stop: Option<StopSequence>,

    #[serde(default)]
    pub tools: Option<Vec<ToolDefinition>>,

    #[serde(default)]
    pub stream: bool,
}

/// Why a choice stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
}

impl From<CompletionReason> for FinishReason {
    fn from(reason: CompletionReason) -> Self {
        match reason {
            CompletionReason::Stop => Self::Stop,
            CompletionReason::Length => Self::Length,
            CompletionReason::Function => Self::ToolCalls,
        }
    }
}

/// Token usage on the wire
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<crate::domain::llm::Usage> for Usage {
    fn from(usage: crate::domain::llm::Usage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: Option<FinishReason>,
}

/// Buffered chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    pub fn from_completion(id: &str, model: &str, completion: &Completion) -> Self {
        Self {
            id: id.to_string(),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: ChatMessage::from_domain(&completion.message),
                finish_reason: completion.reason.map(FinishReason::from),
            }],
            usage: completion.usage.map(Usage::from),
        }
    }
}

/// Delta carried by one streaming chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ChatMessageRole>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunkChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<FinishReason>,
}

/// One frame of a streamed chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatCompletionChunkChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletionChunk {
    fn new(id: &str, model: &str, delta: Delta, finish_reason: Option<FinishReason>) -> Self {
        Self {
            id: id.to_string(),
            object: "chat.completion.chunk".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![ChatCompletionChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
            usage: None,
        }
    }

    /// Opening frame announcing the assistant role
    pub fn role(id: &str, model: &str) -> Self {
        Self::new(
            id,
            model,
            Delta {
                role: Some(ChatMessageRole::Assistant),
                ..Delta::default()
            },
            None,
        )
    }

    pub fn content(id: &str, model: &str, content: &str) -> Self {
        Self::new(
            id,
            model,
            Delta {
                content: Some(content.to_string()),
                ..Delta::default()
            },
            None,
        )
    }

    /// Single frame carrying a whole buffered completion
    pub fn message(id: &str, model: &str, completion: &Completion) -> Self {
        let tool_calls: Vec<ToolCall> = completion
            .message
            .function_calls
            .iter()
            .map(ToolCall::from_domain)
            .collect();

        let mut chunk = Self::new(
            id,
            model,
            Delta {
                role: Some(ChatMessageRole::Assistant),
                content: Some(completion.content().to_string()),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            },
            completion.reason.map(FinishReason::from),
        );
        chunk.usage = completion.usage.map(Usage::from);
        chunk
    }

    /// Terminal frame carrying the finish reason
    pub fn finish(id: &str, model: &str, reason: FinishReason, usage: Option<Usage>) -> Self {
        let mut chunk = Self::new(id, model, Delta::default(), Some(reason));
        chunk.usage = usage;
        chunk
    }
}
