use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    CompleteOptions, Completion, CompletionStream, DomainError, LlmBackend, Message, Model,
};

/// Routes every model id to the backend that serves it.
///
/// The routing table is built once at construction by interrogating each
/// backend for its catalog. When two backends advertise the same id, the
/// later registration wins.
#[derive(Debug)]
pub struct Dispatcher {
    backends: Vec<Arc<dyn LlmBackend>>,
    routes: HashMap<String, usize>,
}

impl Dispatcher {
    pub async fn new(backends: Vec<Arc<dyn LlmBackend>>) -> Result<Self, DomainError> {
        let mut routes = HashMap::new();

        for (position, backend) in backends.iter().enumerate() {
            for model in backend.models().await? {
                routes.insert(model.id, position);
            }
        }

        Ok(Self { backends, routes })
    }

    /// Whether any backend serves this model
    pub fn serves(&self, model: &str) -> bool {
        self.routes.contains_key(model)
    }

    fn backend_for(&self, model: &str) -> Result<&Arc<dyn LlmBackend>, DomainError> {
        self.routes
            .get(model)
            .map(|&position| &self.backends[position])
            .ok_or_else(|| DomainError::unconfigured_model(model))
    }
}

#[async_trait]
impl LlmBackend for Dispatcher {
    async fn models(&self) -> Result<Vec<Model>, DomainError> {
        let mut ids: Vec<String> = self.routes.keys().cloned().collect();
        ids.sort();

        Ok(ids.into_iter().map(Model::new).collect())
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<Completion, DomainError> {
        self.backend_for(model)?.chat(model, messages, options).await
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<CompletionStream, DomainError> {
        self.backend_for(model)?
            .chat_stream(model, messages, options)
            .await
    }

    async fn embed(&self, model: &str, input: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        self.backend_for(model)?.embed(model, input).await
    }
}
