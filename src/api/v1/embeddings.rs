//! Embeddings endpoint

use std::time::Instant;

use axum::extract::State;
use tracing::info;

use crate::api::middleware::RequireAuth;
use crate::api::state::AppState;
use crate::api::types::{ApiError, EmbeddingRequest, EmbeddingResponse, Json};
use crate::domain::llm::LlmBackend;
use crate::infrastructure::observability::record_embedding;

/// POST /v1/embeddings
pub async fn create_embeddings(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Json(request): Json<EmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let input = request.input.into_vec();

    info!(model = %request.model, inputs = input.len(), "embedding request");

    if input.is_empty() {
        return Err(ApiError::bad_request("no input provided").with_param("input"));
    }

    let started = Instant::now();
    let result = state.dispatcher.embed(&request.model, &input).await;
    record_embedding(&request.model, result.is_ok(), started.elapsed());

    Ok(Json(EmbeddingResponse::new(&request.model, result?)))
}
