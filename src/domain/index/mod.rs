//! Vector index contract shared by every retrieval engine

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A unit of retrievable content.
///
/// Immutable once indexed; changed only by re-indexing under the same id
/// or by an explicit delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// Options for a similarity query
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub limit: Option<usize>,

    /// Exclude results whose distance (1 - similarity) exceeds this
    pub distance: Option<f32>,

    /// AND-combined, case-insensitive exact matches against metadata
    pub filters: HashMap<String, String>,
}

impl QueryOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_filters(mut self, filters: HashMap<String, String>) -> Self {
        self.filters = filters;
        self
    }
}

/// Options for listing stored documents
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

/// One page of listed documents
#[derive(Debug, Clone, Default)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
}

/// A query hit with its ranking
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,

    /// Cosine similarity, higher is better
    pub score: f32,

    /// Engine distance, lower is better
    pub distance: Option<f32>,
}

/// Capability contract implemented by every vector store engine
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Upsert documents by id; ids are generated when absent
    async fn index(&self, documents: Vec<Document>) -> Result<(), DomainError>;

    /// Remove documents; absent ids are not an error
    async fn delete(&self, ids: &[String]) -> Result<(), DomainError>;

    /// All stored documents, unranked
    async fn list(&self, options: ListOptions) -> Result<Page<Document>, DomainError>;

    /// Ranked similarity search over the stored documents
    async fn query(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> Result<Vec<ScoredDocument>, DomainError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("body")
            .with_id("d1")
            .with_title("t")
            .with_metadata(HashMap::from([("lang".to_string(), "en".to_string())]));

        assert_eq!(doc.id, "d1");
        assert_eq!(doc.content, "body");
        assert_eq!(doc.metadata.get("lang").map(String::as_str), Some("en"));
    }

    #[test]
    fn test_document_serde_skips_empty_fields() {
        let json = serde_json::to_value(Document::new("x").with_id("d")).unwrap();

        assert!(json.get("title").is_none());
        assert!(json.get("embedding").is_none());
        assert_eq!(json["content"], "x");
    }

    #[test]
    fn test_query_options_builder() {
        let options = QueryOptions::default().with_limit(3).with_distance(0.5);
        assert_eq!(options.limit, Some(3));
        assert_eq!(options.distance, Some(0.5));
    }
}
