//! Model catalog endpoints

use axum::extract::{Path, State};

use crate::api::middleware::RequireAuth;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ModelObject, ModelsResponse};

/// GET /v1/models
///
/// Lists backend models and configured chains as one catalog.
pub async fn list_models(
    State(state): State<AppState>,
    _auth: RequireAuth,
) -> Result<Json<ModelsResponse>, ApiError> {
    let models = state
        .model_ids()
        .await?
        .into_iter()
        .map(ModelObject::new)
        .collect();

    Ok(Json(ModelsResponse::new(models)))
}

/// GET /v1/models/{id}
pub async fn get_model(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<ModelObject>, ApiError> {
    if !state.serves(&id) {
        return Err(ApiError::not_found(format!("model '{id}' not found"))
            .with_param("model")
            .with_code("model_not_found"));
    }

    Ok(Json(ModelObject::new(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::test_support::state_with;
    use crate::domain::llm::mock::{MockBackend, MockCompleter};
    use crate::domain::llm::Completer;
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_list_includes_backends_and_chains() {
        let chain: Arc<dyn Completer> = Arc::new(MockCompleter::new());

        let state = state_with(
            MockBackend::new("mock").with_models(vec!["llama", "mistral"]),
            vec![("rag", chain)],
            vec![],
        )
        .await;

        let Json(response) = list_models(State(state), RequireAuth).await.unwrap();

        let ids: Vec<&str> = response.data.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["llama", "mistral", "rag"]);
        assert_eq!(response.object, "list");
    }

    #[tokio::test]
    async fn test_get_known_model() {
        let state = state_with(
            MockBackend::new("mock").with_models(vec!["llama"]),
            vec![],
            vec![],
        )
        .await;

        let Json(model) = get_model(State(state), RequireAuth, Path("llama".to_string()))
            .await
            .unwrap();

        assert_eq!(model.id, "llama");
        assert_eq!(model.object, "model");
    }

    #[tokio::test]
    async fn test_get_unknown_model() {
        let state = state_with(MockBackend::new("mock"), vec![], vec![]).await;

        let error = get_model(State(state), RequireAuth, Path("ghost".to_string()))
            .await
            .unwrap_err();

        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }
}
