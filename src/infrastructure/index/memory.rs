use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Document, DomainError, Embedder, ListOptions, Page, QueryOptions, ScoredDocument, VectorIndex,
};

/// In-process vector store with an exhaustive cosine scan.
///
/// Documents without a vector are embedded on ingest when an embedder is
/// attached; documents that still end up without one are dropped.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    documents: RwLock<HashMap<String, Document>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn index(&self, documents: Vec<Document>) -> Result<(), DomainError> {
        let mut store = self.documents.write().await;

        for mut document in documents {
            if document.id.is_empty() {
                document.id = Uuid::new_v4().to_string();
            }

            if document.embedding.is_empty() {
                if let Some(ref embedder) = self.embedder {
                    let mut vectors = embedder
                        .embed(std::slice::from_ref(&document.content))
                        .await?;

                    if !vectors.is_empty() {
                        document.embedding = vectors.remove(0);
                    }
                }
            }

            if document.embedding.is_empty() {
                tracing::warn!(id = %document.id, "dropping document without embedding");
                continue;
            }

            store.insert(document.id.clone(), document);
        }

        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<(), DomainError> {
        let mut store = self.documents.write().await;

        for id in ids {
            store.remove(id);
        }

        Ok(())
    }

    async fn list(&self, options: ListOptions) -> Result<Page<Document>, DomainError> {
        let store = self.documents.read().await;

        let mut items: Vec<Document> = store.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(limit) = options.limit {
            items.truncate(limit);
        }

        // This store holds everything in one page; continuation stays empty
        Ok(Page {
            items,
            cursor: None,
        })
    }

    async fn query(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> Result<Vec<ScoredDocument>, DomainError> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| DomainError::configuration("no embedder configured for index"))?;

        let input = [query.to_string()];
        let vectors = embedder.embed(&input).await?;

        let needle = vectors
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("embedder", "empty embedding response"))?;

        let store = self.documents.read().await;
        let mut results = Vec::new();

        for document in store.values() {
            if !matches_filters(document, &options.filters) {
                continue;
            }

            let score = cosine_similarity(&needle, &document.embedding);
            let distance = 1.0 - score;

            if let Some(threshold) = options.distance {
                if distance > threshold {
                    continue;
                }
            }

            results.push(ScoredDocument {
                document: document.clone(),
                score,
                distance: Some(distance),
            });
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        if let Some(limit) = options.limit {
            results.truncate(limit);
        }

        Ok(results)
    }
}

fn matches_filters(document: &Document, filters: &HashMap<String, String>) -> bool {
    filters.iter().all(|(key, expected)| {
        document
            .metadata
            .get(key)
            .is_some_and(|value| value.to_lowercase() == expected.to_lowercase())
    })
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::mock::MockEmbedder;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(
            MockEmbedder::new()
                .with_vector("right", vec![1.0, 0.0])
                .with_vector("up", vec![0.0, 1.0])
                .with_fallback(vec![0.6, 0.8]),
        )
    }

    #[tokio::test]
    async fn test_index_assigns_ids_and_embeds() {
        let index = MemoryIndex::new().with_embedder(embedder());

        index.index(vec![Document::new("right")]).await.unwrap();

        let page = index.list(ListOptions::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert!(!page.items[0].id.is_empty());
        assert_eq!(page.items[0].embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_index_upserts_by_id() {
        let index = MemoryIndex::new().with_embedder(embedder());

        index
            .index(vec![Document::new("right").with_id("d1")])
            .await
            .unwrap();
        index
            .index(vec![Document::new("up").with_id("d1")])
            .await
            .unwrap();

        let page = index.list(ListOptions::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].content, "up");
        assert_eq!(page.items[0].embedding, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_documents_without_vectors_are_dropped() {
        // No embedder attached, so content-only documents cannot be stored
        let index = MemoryIndex::new();

        index
            .index(vec![
                Document::new("no vector").with_id("dropped"),
                Document::new("has vector")
                    .with_id("kept")
                    .with_embedding(vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let page = index.list(ListOptions::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "kept");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let index = MemoryIndex::new().with_embedder(embedder());

        index
            .index(vec![
                Document::new("right").with_id("a"),
                Document::new("up").with_id("b"),
            ])
            .await
            .unwrap();

        index
            .delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        index.delete(&["a".to_string()]).await.unwrap();

        let page = index.list(ListOptions::default()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "b");
    }

    #[tokio::test]
    async fn test_query_ranks_by_similarity() {
        let index = MemoryIndex::new().with_embedder(embedder());

        index
            .index(vec![
                Document::new("up").with_id("orthogonal"),
                Document::new("right").with_id("aligned"),
                Document::new("other").with_id("diagonal"),
            ])
            .await
            .unwrap();

        let results = index
            .query("right", QueryOptions::default())
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.document.id.as_str()).collect();
        assert_eq!(ids, vec!["aligned", "diagonal", "orthogonal"]);

        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!((results[1].score - 0.6).abs() < 1e-6);
        assert_eq!(results[0].distance, Some(0.0));
    }

    #[tokio::test]
    async fn test_query_distance_threshold_excludes() {
        let index = MemoryIndex::new().with_embedder(embedder());

        index
            .index(vec![
                Document::new("right").with_id("near"),
                Document::new("up").with_id("far"),
            ])
            .await
            .unwrap();

        let results = index
            .query("right", QueryOptions::default().with_distance(0.5))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "near");
    }

    #[tokio::test]
    async fn test_query_limit_truncates() {
        let index = MemoryIndex::new().with_embedder(embedder());

        index
            .index(vec![
                Document::new("right").with_id("a"),
                Document::new("other").with_id("b"),
                Document::new("up").with_id("c"),
            ])
            .await
            .unwrap();

        let results = index
            .query("right", QueryOptions::default().with_limit(2))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.id, "a");
    }

    #[tokio::test]
    async fn test_query_filters_match_case_insensitively() {
        let index = MemoryIndex::new().with_embedder(embedder());

        index
            .index(vec![
                Document::new("right")
                    .with_id("english")
                    .with_metadata(HashMap::from([("lang".to_string(), "EN".to_string())])),
                Document::new("right")
                    .with_id("german")
                    .with_metadata(HashMap::from([("lang".to_string(), "de".to_string())])),
                Document::new("right").with_id("untagged"),
            ])
            .await
            .unwrap();

        let filters = HashMap::from([("lang".to_string(), "en".to_string())]);
        let results = index
            .query("right", QueryOptions::default().with_filters(filters))
            .await
            .unwrap();

        // Documents missing the filter key are excluded too
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "english");
    }

    #[tokio::test]
    async fn test_query_without_embedder_fails() {
        let index = MemoryIndex::new();

        let error = index
            .query("anything", QueryOptions::default())
            .await
            .unwrap_err();

        assert!(error.to_string().contains("no embedder"));
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_unpaged() {
        let index = MemoryIndex::new().with_embedder(embedder());

        index
            .index(vec![
                Document::new("right").with_id("c"),
                Document::new("right").with_id("a"),
                Document::new("right").with_id("b"),
            ])
            .await
            .unwrap();

        let page = index.list(ListOptions::default()).await.unwrap();

        let ids: Vec<&str> = page.items.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(page.cursor.is_none());

        let truncated = index
            .list(ListOptions {
                cursor: None,
                limit: Some(2),
            })
            .await
            .unwrap();

        assert_eq!(truncated.items.len(), 2);
        assert!(truncated.cursor.is_none());
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
