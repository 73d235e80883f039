//! OpenAI-compatible v1 API endpoints

pub mod chat;
pub mod completions;
pub mod embeddings;
pub mod models;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/chat/completions", post(chat::create_chat_completion))
        .route("/completions", post(completions::create_completion))
        .route("/embeddings", post(embeddings::create_embeddings))
        .route("/models", get(models::list_models))
        .route("/models/{model_id}", get(models::get_model))
}
