//! Shared application state

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::llm::{Completer, LlmBackend, ModelCompleter};
use crate::domain::text::TextSplitter;
use crate::domain::{DomainError, VectorIndex};
use crate::infrastructure::extraction::ExtractorRegistry;
use crate::infrastructure::llm::Dispatcher;

/// Everything the handlers need, built once at startup.
///
/// All registries are immutable snapshots; `Clone` is cheap.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,

    /// Chains shadow backend models of the same name
    pub chains: Arc<HashMap<String, Arc<dyn Completer>>>,

    pub indexes: Arc<HashMap<String, Arc<dyn VectorIndex>>>,

    pub extractors: Arc<ExtractorRegistry>,

    /// Splitter carrying the configured segmentation defaults
    pub splitter: TextSplitter,

    pub auth_token: Option<String>,
}

/// Manual impl: the chain and index maps hold non-`Debug` trait objects,
/// so only their names are shown; the token is never printed.
impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("dispatcher", &self.dispatcher)
            .field("chains", &self.chains.keys().collect::<Vec<_>>())
            .field("indexes", &self.indexes.keys().collect::<Vec<_>>())
            .field("extractors", &self.extractors)
            .field("splitter", &self.splitter)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AppState {
    /// Resolve a model name to a completer, chains first
    pub fn completer(&self, model: &str) -> Result<Arc<dyn Completer>, DomainError> {
        if let Some(chain) = self.chains.get(model) {
            return Ok(chain.clone());
        }

        if self.dispatcher.serves(model) {
            let backend = self.dispatcher.clone() as Arc<dyn LlmBackend>;
            return Ok(Arc::new(ModelCompleter::new(backend, model)));
        }

        Err(DomainError::unconfigured_model(model))
    }

    /// True when `model` resolves through a chain, not a backend
    pub fn is_chain(&self, model: &str) -> bool {
        self.chains.contains_key(model)
    }

    pub fn index(&self, name: &str) -> Result<Arc<dyn VectorIndex>, DomainError> {
        self.indexes
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("index '{name}' not found")))
    }

    /// All model names the gateway answers for: backend models plus
    /// chain names, sorted, chains deduplicated over backends
    pub async fn model_ids(&self) -> Result<Vec<String>, DomainError> {
        let mut ids: Vec<String> = self
            .dispatcher
            .models()
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        ids.extend(self.chains.keys().cloned());
        ids.sort();
        ids.dedup();

        Ok(ids)
    }

    pub fn serves(&self, model: &str) -> bool {
        self.chains.contains_key(model) || self.dispatcher.serves(model)
    }
}
