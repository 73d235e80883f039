//! Wire types for the index management and segmentation surfaces

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Document, ScoredDocument};

/// A document as sent to and returned from the index surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl IndexDocument {
    pub fn into_domain(self) -> Document {
        Document::new(self.content)
            .with_id(self.id)
            .with_title(self.title)
            .with_metadata(self.metadata)
    }

    pub fn from_domain(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            title: document.title.clone(),
            content: document.content.clone(),
            metadata: document.metadata.clone(),
        }
    }
}

/// Similarity query against a named index
#[derive(Debug, Clone, Deserialize)]
pub struct IndexQueryRequest {
    pub text: String,

    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub distance: Option<f32>,

    #[serde(default)]
    pub filters: HashMap<String, String>,
}

/// One ranked query hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexQueryResult {
    #[serde(flatten)]
    pub document: IndexDocument,

    /// Cosine similarity, higher is better
    pub score: f32,

    /// 1 - score, lower is better
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl IndexQueryResult {
    pub fn from_scored(scored: &ScoredDocument) -> Self {
        Self {
            document: IndexDocument::from_domain(&scored.document),
            score: scored.score,
            distance: scored.distance,
        }
    }
}

/// Split raw content into bounded segments
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentRequest {
    pub content: String,

    #[serde(default)]
    pub segment_length: Option<usize>,

    #[serde(default)]
    pub segment_overlap: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentResponse {
    pub segments: Vec<Segment>,
}
