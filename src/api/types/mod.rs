//! Wire types for the HTTP surface, mirroring the OpenAI API format

pub mod chat;
pub mod completions;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod json;
pub mod models;

pub use chat::{
    to_tools, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ChatMessageRole, FinishReason, MessageContent, StopSequence, ToolDefinition, Usage,
};
pub use completions::{CompletionRequest, CompletionResponse, PromptInput};
pub use embeddings::{EmbeddingInput, EmbeddingRequest, EmbeddingResponse};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use index::{
    IndexDocument, IndexQueryRequest, IndexQueryResult, Segment, SegmentRequest, SegmentResponse,
};
pub use json::Json;
pub use models::{ModelObject, ModelsResponse};
