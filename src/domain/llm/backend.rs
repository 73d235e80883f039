use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use super::{CompleteOptions, Completion, Message};
use crate::domain::DomainError;

/// Stream of completion deltas; the terminal item carries a reason
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<Completion, DomainError>> + Send>>;

/// A model advertised by a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
}

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Capability contract for completion backends (OpenAI-compatible APIs,
/// the dispatcher, local runtimes behind the same wire format).
#[async_trait]
pub trait LlmBackend: Send + Sync + Debug {
    /// Models this backend can serve
    async fn models(&self) -> Result<Vec<Model>, DomainError>;

    /// Buffered chat completion
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<Completion, DomainError>;

    /// Streaming chat completion
    async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<CompletionStream, DomainError>;

    /// Embed a batch of texts, one vector per input
    async fn embed(&self, model: &str, input: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;
}

/// Capability that turns a message history into one completion.
///
/// Reasoning chains implement this so a chain can stand in for a model.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<Completion, DomainError>;
}

/// Opaque `Debug` so completer handles can sit in `Debug` containers
impl Debug for dyn Completer + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Completer")
    }
}

/// Routes a fixed model through a backend as a plain completer
#[derive(Debug, Clone)]
pub struct ModelCompleter {
    backend: Arc<dyn LlmBackend>,
    model: String,
}

impl ModelCompleter {
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Completer for ModelCompleter {
    async fn complete(
        &self,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<Completion, DomainError> {
        self.backend.chat(&self.model, messages, options).await
    }
}
