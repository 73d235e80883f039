//! JSON extractor whose rejections use the OpenAI error shape

use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiErrorType};

/// Drop-in replacement for `axum::Json` that reports malformed bodies
/// as an OpenAI-style `invalid_request_error` instead of plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::new(
                rejection.status(),
                ApiErrorType::InvalidRequestError,
                rejection.body_text(),
            )
            .with_code("json_parse_error")),
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};

    #[derive(Debug, serde::Deserialize)]
    struct Probe {
        #[allow(dead_code)]
        name: String,
    }

    #[tokio::test]
    async fn test_malformed_body_rejects_with_openai_error() {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let rejection = Json::<Probe>::from_request(request, &())
            .await
            .expect_err("malformed body must reject");

        assert_eq!(rejection.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            rejection.response.error.code.as_deref(),
            Some("json_parse_error")
        );
    }

    #[tokio::test]
    async fn test_valid_body_extracts() {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"ok"}"#))
            .unwrap();

        let Json(probe) = Json::<Probe>::from_request(request, &()).await.unwrap();
        assert_eq!(probe.name, "ok");
    }
}
