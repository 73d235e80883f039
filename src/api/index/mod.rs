//! Index management and segmentation endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::api::middleware::RequireAuth;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, IndexDocument, IndexQueryRequest, IndexQueryResult, Json, Segment, SegmentRequest,
    SegmentResponse,
};
use crate::domain::{Document, File, ListOptions, QueryOptions};

/// Create the index management router
pub fn create_index_router() -> Router<AppState> {
    Router::new()
        .route(
            "/index/{index}",
            get(list_documents)
                .post(upsert_documents)
                .delete(delete_documents),
        )
        .route("/index/{index}/query", post(query_index))
        .route("/index/{index}/files", post(ingest_files))
        .route("/segment", post(segment_content))
}

/// GET /index/{index}
///
/// Returns the stored documents as a bare array.
pub async fn list_documents(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(name): Path<String>,
) -> Result<Json<Vec<IndexDocument>>, ApiError> {
    let index = state.index(&name)?;

    let page = index.list(ListOptions::default()).await?;

    let documents = page.items.iter().map(IndexDocument::from_domain).collect();

    Ok(Json(documents))
}

/// POST /index/{index}
///
/// Bulk upsert; the body is a bare array of documents.
pub async fn upsert_documents(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(name): Path<String>,
    Json(documents): Json<Vec<IndexDocument>>,
) -> Result<StatusCode, ApiError> {
    let index = state.index(&name)?;

    info!(index = %name, count = documents.len(), "upserting documents");

    let documents = documents
        .into_iter()
        .map(IndexDocument::into_domain)
        .collect();

    index.index(documents).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /index/{index}
///
/// The body is a bare array of document ids.
pub async fn delete_documents(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(name): Path<String>,
    Json(ids): Json<Vec<String>>,
) -> Result<StatusCode, ApiError> {
    let index = state.index(&name)?;

    info!(index = %name, count = ids.len(), "deleting documents");

    index.delete(&ids).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /index/{index}/query
pub async fn query_index(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(name): Path<String>,
    Json(request): Json<IndexQueryRequest>,
) -> Result<Json<Vec<IndexQueryResult>>, ApiError> {
    let index = state.index(&name)?;

    if request.text.is_empty() {
        return Err(ApiError::bad_request("text cannot be empty").with_param("text"));
    }

    let mut options = QueryOptions::default().with_filters(request.filters);

    if let Some(limit) = request.limit {
        options = options.with_limit(limit);
    }

    if let Some(distance) = request.distance {
        options = options.with_distance(distance);
    }

    let results = index.query(&request.text, options).await?;

    Ok(Json(results.iter().map(IndexQueryResult::from_scored).collect()))
}

/// POST /index/{index}/files
///
/// Multipart ingestion: each uploaded file is extracted into blocks and
/// indexed under `<filename>#<position>` ids.
pub async fn ingest_files(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(name): Path<String>,
    mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    let index = state.index(&name)?;

    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if !matches!(field.name(), Some("file" | "files" | "input")) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();

        if file_name.is_empty() {
            return Err(ApiError::bad_request("file name is required").with_param("file"));
        }

        let content = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;

        files.push(File::new(file_name, content));
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("no file provided").with_param("file"));
    }

    let mut documents = Vec::new();

    for file in &files {
        let extractor = state.extractors.for_file(&file.name)?;
        let extracted = extractor.extract(file).await?;

        info!(
            index = %name,
            file = %file.name,
            blocks = extracted.blocks.len(),
            "ingesting file"
        );

        for block in extracted.blocks {
            documents.push(
                Document::new(block.content)
                    .with_id(block.id)
                    .with_title(file.name.clone()),
            );
        }
    }

    index.index(documents).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /segment
///
/// Splits raw content into bounded segments without touching any index.
pub async fn segment_content(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Json(request): Json<SegmentRequest>,
) -> Result<Json<SegmentResponse>, ApiError> {
    let mut splitter = state.splitter.clone();

    if let Some(length) = request.segment_length {
        splitter = splitter.with_chunk_size(length);
    }

    if let Some(overlap) = request.segment_overlap {
        splitter = splitter.with_chunk_overlap(overlap);
    }

    let segments = splitter
        .split(&request.content)
        .into_iter()
        .map(|text| Segment { text })
        .collect();

    Ok(Json(SegmentResponse { segments }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::test_support::state_with;
    use crate::domain::index::mock::MockVectorIndex;
    use crate::domain::llm::mock::MockBackend;
    use crate::domain::{ScoredDocument, VectorIndex};
    use axum::body::Body;
    use axum::http::{header, Request};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn scored(id: &str, content: &str, score: f32) -> ScoredDocument {
        ScoredDocument {
            document: Document::new(content).with_id(id),
            score,
            distance: Some(1.0 - score),
        }
    }

    #[tokio::test]
    async fn test_list_returns_bare_array() {
        let index: Arc<dyn VectorIndex> = Arc::new(
            MockVectorIndex::new().with_results(vec![scored("d1", "first", 0.9)]),
        );

        let state = state_with(MockBackend::new("mock"), vec![], vec![("docs", index)]).await;

        let Json(documents) =
            list_documents(State(state), RequireAuth, Path("docs".to_string()))
                .await
                .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "d1");
        assert_eq!(documents[0].content, "first");
    }

    #[tokio::test]
    async fn test_unknown_index_rejected() {
        let state = state_with(MockBackend::new("mock"), vec![], vec![]).await;

        let error = list_documents(State(state), RequireAuth, Path("ghost".to_string()))
            .await
            .unwrap_err();

        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upsert_and_delete_return_no_content() {
        let index: Arc<dyn VectorIndex> = Arc::new(MockVectorIndex::new());
        let state = state_with(
            MockBackend::new("mock"),
            vec![],
            vec![("docs", index)],
        )
        .await;

        let status = upsert_documents(
            State(state.clone()),
            RequireAuth,
            Path("docs".to_string()),
            Json(vec![IndexDocument {
                id: "d1".to_string(),
                content: "body".to_string(),
                ..IndexDocument::default()
            }]),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let status = delete_documents(
            State(state),
            RequireAuth,
            Path("docs".to_string()),
            Json(vec!["d1".to_string()]),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_query_maps_options() {
        let index = Arc::new(MockVectorIndex::new().with_results(vec![scored(
            "d1",
            "match",
            0.8,
        )]));

        let state = state_with(
            MockBackend::new("mock"),
            vec![],
            vec![("docs", index.clone() as Arc<dyn VectorIndex>)],
        )
        .await;

        let Json(results) = query_index(
            State(state),
            RequireAuth,
            Path("docs".to_string()),
            Json(IndexQueryRequest {
                text: "question".to_string(),
                limit: Some(3),
                distance: Some(0.5),
                filters: HashMap::from([("lang".to_string(), "en".to_string())]),
            }),
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.id, "d1");
        assert!((results[0].score - 0.8).abs() < 1e-6);

        let queries = index.queries();
        assert_eq!(queries[0].0, "question");
        assert_eq!(queries[0].1.limit, Some(3));
        assert_eq!(queries[0].1.distance, Some(0.5));
        assert_eq!(queries[0].1.filters.get("lang").map(String::as_str), Some("en"));
    }

    #[tokio::test]
    async fn test_query_empty_text_rejected() {
        let index: Arc<dyn VectorIndex> = Arc::new(MockVectorIndex::new());
        let state = state_with(MockBackend::new("mock"), vec![], vec![("docs", index)]).await;

        let error = query_index(
            State(state),
            RequireAuth,
            Path("docs".to_string()),
            Json(IndexQueryRequest {
                text: String::new(),
                limit: None,
                distance: None,
                filters: HashMap::new(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.response.error.param.as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn test_segment_applies_overrides() {
        let state = state_with(MockBackend::new("mock"), vec![], vec![]).await;

        let Json(response) = segment_content(
            State(state),
            RequireAuth,
            Json(SegmentRequest {
                content: "one two\n\nthree four".to_string(),
                segment_length: Some(12),
                segment_overlap: None,
            }),
        )
        .await
        .unwrap();

        let texts: Vec<&str> = response.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["one two", "three four"]);
    }

    #[tokio::test]
    async fn test_multipart_ingest_indexes_blocks() {
        let index: Arc<dyn VectorIndex> = Arc::new(MockVectorIndex::new());
        let state = state_with(MockBackend::new("mock"), vec![], vec![("docs", index)]).await;

        let boundary = "ingest-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             hello from a file\r\n\
             --{boundary}--\r\n"
        );

        let request = Request::builder()
            .method("POST")
            .uri("/index/docs/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = create_index_router()
            .with_state(state)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_multipart_without_file_rejected() {
        let index: Arc<dyn VectorIndex> = Arc::new(MockVectorIndex::new());
        let state = state_with(MockBackend::new("mock"), vec![], vec![("docs", index)]).await;

        let boundary = "ingest-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"unrelated\"\r\n\r\n\
             value\r\n\
             --{boundary}--\r\n"
        );

        let request = Request::builder()
            .method("POST")
            .uri("/index/docs/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = create_index_router()
            .with_state(state)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
