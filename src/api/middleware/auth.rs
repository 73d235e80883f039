//! Static bearer token authentication

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Extractor enforcing the configured bearer token.
///
/// When no token is configured the gateway is open and every request
/// passes.
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth;

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.auth_token.as_deref() else {
            return Ok(RequireAuth);
        };

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

        if token != expected {
            return Err(ApiError::unauthorized("invalid bearer token"));
        }

        Ok(RequireAuth)
    }
}

fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}
