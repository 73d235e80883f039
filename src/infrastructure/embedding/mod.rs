use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DomainError, Embedder, LlmBackend};

/// Embeds through a completion backend under a fixed model.
///
/// Indexes hold one of these so their ingest and query paths share the
/// model routing of the chat surface.
#[derive(Debug, Clone)]
pub struct BackendEmbedder {
    backend: Arc<dyn LlmBackend>,
    model: String,
}

impl BackendEmbedder {
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for BackendEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        self.backend.embed(&self.model, texts).await
    }
}
