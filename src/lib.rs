//! Nexus AI Gateway
//!
//! An OpenAI-compatible gateway over pluggable completion backends with:
//! - Model routing across multiple upstream providers
//! - In-memory vector indexes embedding through the same backends
//! - Retrieval (refine) and tool-use (react) chains served as models

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use api::state::AppState;
pub use config::AppConfig;

use std::collections::HashMap;
use std::sync::Arc;

use config::{BackendKind, ChainKind};
use domain::llm::{Completer, LlmBackend, ModelCompleter};
use domain::text::TextSplitter;
use domain::{Classifier, DomainError, VectorIndex};
use infrastructure::chain::{Contextualizer, ReactChain, RefineChain};
use infrastructure::classify::{Category, LlmClassifier};
use infrastructure::embedding::BackendEmbedder;
use infrastructure::extraction::ExtractorRegistry;
use infrastructure::index::MemoryIndex;
use infrastructure::llm::{Dispatcher, HttpClient, OpenAiBackend};
use tracing::info;

/// Create the application state from configuration.
///
/// Backends feed the dispatcher, indexes embed through it, and chains
/// resolve their completers against it. Every cross reference in the
/// configuration is checked here so a bad config fails at startup, not
/// on the first request.
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let client = HttpClient::new();

    let mut backends: Vec<Arc<dyn LlmBackend>> = Vec::new();

    for backend in &config.backends {
        match backend.kind {
            BackendKind::OpenAi => backends.push(Arc::new(OpenAiBackend::new(
                client.clone(),
                backend.base_url.clone(),
                backend.api_key.clone(),
                backend.models.clone(),
            ))),
        }
    }

    let dispatcher = Arc::new(Dispatcher::new(backends).await?);

    let indexes = build_indexes(config, &dispatcher)?;
    let classifiers = build_classifiers(config, &dispatcher)?;
    let chains = build_chains(config, &dispatcher, &indexes, &classifiers)?;

    let splitter = TextSplitter::new()
        .with_chunk_size(config.extraction.chunk_size)
        .with_chunk_overlap(config.extraction.chunk_overlap);

    info!(
        backends = config.backends.len(),
        indexes = indexes.len(),
        chains = chains.len(),
        "application state initialized"
    );

    Ok(AppState {
        dispatcher,
        chains: Arc::new(chains),
        indexes: Arc::new(indexes),
        extractors: Arc::new(ExtractorRegistry::new(splitter.clone())),
        splitter,
        auth_token: config.auth.token.clone(),
    })
}

/// A completer over the dispatcher, or `None` when no backend serves the model
fn completer_for(dispatcher: &Arc<Dispatcher>, model: &str) -> Option<Arc<dyn Completer>> {
    if !dispatcher.serves(model) {
        return None;
    }

    let backend = dispatcher.clone() as Arc<dyn LlmBackend>;
    Some(Arc::new(ModelCompleter::new(backend, model)))
}

fn build_indexes(
    config: &AppConfig,
    dispatcher: &Arc<Dispatcher>,
) -> Result<HashMap<String, Arc<dyn VectorIndex>>, DomainError> {
    let mut indexes: HashMap<String, Arc<dyn VectorIndex>> = HashMap::new();

    for (name, index) in &config.indexes {
        if !dispatcher.serves(&index.embedding) {
            return Err(DomainError::configuration(format!(
                "index '{name}': embedding model '{}' is not served by any backend",
                index.embedding
            )));
        }

        let embedder =
            BackendEmbedder::new(dispatcher.clone() as Arc<dyn LlmBackend>, &index.embedding);

        indexes.insert(
            name.clone(),
            Arc::new(MemoryIndex::new().with_embedder(Arc::new(embedder))),
        );
    }

    Ok(indexes)
}

fn build_classifiers(
    config: &AppConfig,
    dispatcher: &Arc<Dispatcher>,
) -> Result<HashMap<String, Arc<dyn Classifier>>, DomainError> {
    let mut classifiers: HashMap<String, Arc<dyn Classifier>> = HashMap::new();

    for (name, classifier) in &config.classifiers {
        let completer = completer_for(dispatcher, &classifier.model).ok_or_else(|| {
            DomainError::configuration(format!(
                "classifier '{name}': model '{}' is not served by any backend",
                classifier.model
            ))
        })?;

        let categories = classifier
            .categories
            .iter()
            .map(|(category, description)| Category::new(category, description))
            .collect();

        classifiers.insert(
            name.clone(),
            Arc::new(LlmClassifier::new(completer, categories)),
        );
    }

    Ok(classifiers)
}

fn build_chains(
    config: &AppConfig,
    dispatcher: &Arc<Dispatcher>,
    indexes: &HashMap<String, Arc<dyn VectorIndex>>,
    classifiers: &HashMap<String, Arc<dyn Classifier>>,
) -> Result<HashMap<String, Arc<dyn Completer>>, DomainError> {
    let mut chains: HashMap<String, Arc<dyn Completer>> = HashMap::new();

    for (name, chain) in &config.chains {
        let completer = completer_for(dispatcher, &chain.model).ok_or_else(|| {
            DomainError::configuration(format!(
                "chain '{name}': model '{}' is not served by any backend",
                chain.model
            ))
        })?;

        let built: Arc<dyn Completer> = match chain.kind {
            ChainKind::React => {
                let mut react = ReactChain::new(completer);

                if let Some(system) = &chain.system {
                    react = react.with_system(system);
                }

                Arc::new(react)
            }
            ChainKind::Refine => {
                let index_name = chain.index.as_deref().ok_or_else(|| {
                    DomainError::configuration(format!(
                        "chain '{name}': refine chains need an index"
                    ))
                })?;

                let index = indexes.get(index_name).cloned().ok_or_else(|| {
                    DomainError::configuration(format!(
                        "chain '{name}': index '{index_name}' is not configured"
                    ))
                })?;

                let mut refine = RefineChain::new(index, completer);

                if let Some(model) = &chain.contextualizer {
                    let contextualizer = completer_for(dispatcher, model).ok_or_else(|| {
                        DomainError::configuration(format!(
                            "chain '{name}': contextualizer model '{model}' is not served by any backend"
                        ))
                    })?;

                    refine =
                        refine.with_contextualizer(Arc::new(Contextualizer::new(contextualizer)));
                }

                for (key, classifier_name) in &chain.filters {
                    let classifier = classifiers.get(classifier_name).cloned().ok_or_else(|| {
                        DomainError::configuration(format!(
                            "chain '{name}': classifier '{classifier_name}' is not configured"
                        ))
                    })?;

                    refine = refine.with_classifier(key, classifier);
                }

                if let Some(limit) = chain.limit {
                    refine = refine.with_limit(limit);
                }

                if let Some(distance) = chain.distance {
                    refine = refine.with_distance(distance);
                }

                Arc::new(refine)
            }
        };

        chains.insert(name.clone(), built);
    }

    Ok(chains)
}
