//! Document extraction capability

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

/// Raw input handed to an extractor
#[derive(Debug, Clone)]
pub struct File {
    pub name: String,
    pub content: Bytes,
}

impl File {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A bounded block of extracted content, id `<name>#<index>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: String,
    pub content: String,
}

/// Result of extracting one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedDocument {
    pub name: String,
    pub content: String,
    pub blocks: Vec<Block>,
}

/// Capability that turns a raw file into indexable blocks
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, file: &File) -> Result<ExtractedDocument, DomainError>;
}

/// Opaque `Debug` so extractor handles can sit in `Debug` containers
impl std::fmt::Debug for dyn Extractor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Extractor")
    }
}
