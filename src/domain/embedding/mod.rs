//! Embedding capability

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

/// Capability that turns texts into fixed-length vectors
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    /// One vector per input text, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;

    /// Embedder returning fixed vectors per known text
    #[derive(Debug, Default)]
    pub struct MockEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        fallback: Option<Vec<f32>>,
        error: Option<String>,
    }

    impl MockEmbedder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.into(), vector);
            self
        }

        /// Vector returned for texts without an explicit mapping
        pub fn with_fallback(mut self, vector: Vec<f32>) -> Self {
            self.fallback = Some(vector);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock-embedder", error));
            }

            texts
                .iter()
                .map(|text| {
                    self.vectors
                        .get(text)
                        .or(self.fallback.as_ref())
                        .cloned()
                        .ok_or_else(|| {
                            DomainError::provider(
                                "mock-embedder",
                                format!("no vector configured for '{text}'"),
                            )
                        })
                })
                .collect()
        }
    }
}
