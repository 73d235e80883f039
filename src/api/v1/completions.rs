//! Legacy text completions endpoint

use std::time::Instant;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};
use uuid::Uuid;

use super::chat::{build_options, send_done, send_frame};
use crate::api::middleware::RequireAuth;
use crate::api::state::AppState;
use crate::api::types::{ApiError, CompletionRequest, CompletionResponse, FinishReason, Json};
use crate::domain::llm::{CompleteOptions, LlmBackend, Message};
use crate::infrastructure::observability::record_completion;

/// POST /v1/completions
///
/// The prompt is wrapped into a single user message. Array prompts are
/// accepted for compatibility but only the last entry is completed.
pub async fn create_completion(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Json(request): Json<CompletionRequest>,
) -> Result<Response, ApiError> {
    info!(
        model = %request.model,
        stream = request.stream,
        "text completion request"
    );

    let prompt = request
        .prompt
        .last()
        .ok_or_else(|| ApiError::bad_request("prompt cannot be empty").with_param("prompt"))?;

    let messages = vec![Message::user(prompt)];

    let options = build_options(
        request.temperature,
        request.max_tokens,
        request.stop.as_ref(),
        None,
    )?;

    if request.stream {
        return stream_completion(state, request.model, messages, options).await;
    }

    let completer = state.completer(&request.model)?;

    let started = Instant::now();
    let result = completer.complete(&messages, options).await;
    record_completion(
        &request.model,
        result.is_ok(),
        started.elapsed(),
        result.as_ref().ok().and_then(|c| c.usage.as_ref()),
    );
    let completion = result?;

    let id = completion_id(&completion.id);
    let response = CompletionResponse::from_completion(&id, &request.model, &completion);

    Ok(Json(response).into_response())
}

fn completion_id(id: &str) -> String {
    if id.is_empty() {
        format!("cmpl-{}", Uuid::new_v4())
    } else {
        id.to_string()
    }
}

async fn stream_completion(
    state: AppState,
    model: String,
    messages: Vec<Message>,
    options: CompleteOptions,
) -> Result<Response, ApiError> {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, std::convert::Infallible>>(32);

    if state.is_chain(&model) {
        let completer = state.completer(&model)?;

        tokio::spawn(async move {
            let started = Instant::now();

            match completer.complete(&messages, options).await {
                Ok(completion) => {
                    record_completion(&model, true, started.elapsed(), completion.usage.as_ref());

                    let id = completion_id(&completion.id);
                    let frame = CompletionResponse::from_completion(&id, &model, &completion);
                    send_frame(&tx, &frame).await;
                }
                Err(e) => {
                    record_completion(&model, false, started.elapsed(), None);
                    error!(model = %model, error = %e, "chain stream failed");
                }
            }

            send_done(&tx).await;
        });
    } else {
        let mut stream = state
            .dispatcher
            .chat_stream(&model, &messages, options)
            .await?;

        tokio::spawn(async move {
            let started = Instant::now();
            let id = format!("cmpl-{}", Uuid::new_v4());
            let mut reason = None;
            let mut failed = false;

            while let Some(item) = stream.next().await {
                match item {
                    Ok(delta) => {
                        if !delta.content().is_empty() {
                            let frame = CompletionResponse::delta(&id, &model, delta.content());
                            if !send_frame(&tx, &frame).await {
                                break;
                            }
                        }

                        if delta.reason.is_some() {
                            reason = delta.reason;
                        }
                    }
                    Err(e) => {
                        failed = true;
                        error!(model = %model, error = %e, "completion stream failed");
                        break;
                    }
                }
            }

            record_completion(&model, !failed, started.elapsed(), None);

            let reason = reason.map(FinishReason::from).unwrap_or(FinishReason::Stop);
            send_frame(&tx, &CompletionResponse::finish(&id, &model, reason)).await;

            send_done(&tx).await;
        });
    }

    Ok(Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::test_support::state_with;
    use crate::api::types::PromptInput;
    use crate::domain::llm::mock::{MockBackend, MockCompleter};
    use crate::domain::llm::{Completer, Completion, CompletionReason};
    use axum::http::StatusCode;
    use std::sync::Arc;

    fn completion_request(model: &str, prompt: PromptInput, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            prompt,
            temperature: None,
            max_tokens: None,
            stop: None,
            stream,
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_buffered_completion() {
        let state = state_with(
            MockBackend::new("mock")
                .with_models(vec!["llama"])
                .with_response(
                    Completion::new("", Message::assistant("done"))
                        .with_reason(CompletionReason::Stop),
                ),
            vec![],
            vec![],
        )
        .await;

        let response = create_completion(
            State(state),
            RequireAuth,
            Json(completion_request(
                "llama",
                PromptInput::Single("say done".to_string()),
                false,
            )),
        )
        .await
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&body_text(response).await).unwrap();

        assert_eq!(json["object"], "text_completion");
        assert!(json["id"].as_str().unwrap().starts_with("cmpl-"));
        assert_eq!(json["choices"][0]["text"], "done");
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
    }

    #[tokio::test]
    async fn test_array_prompt_completes_last_entry() {
        let chain = Arc::new(
            MockCompleter::new()
                .with_completion(Completion::new("c-1", Message::assistant("ok"))),
        );

        let state = state_with(
            MockBackend::new("mock"),
            vec![("agent", chain.clone() as Arc<dyn Completer>)],
            vec![],
        )
        .await;

        create_completion(
            State(state),
            RequireAuth,
            Json(completion_request(
                "agent",
                PromptInput::Multiple(vec!["first".to_string(), "second".to_string()]),
                false,
            )),
        )
        .await
        .unwrap();

        let calls = chain.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.len(), 1);
        assert_eq!(calls[0].0[0].content, "second");
    }

    #[tokio::test]
    async fn test_empty_prompt_array_rejected() {
        let state = state_with(MockBackend::new("mock"), vec![], vec![]).await;

        let error = create_completion(
            State(state),
            RequireAuth,
            Json(completion_request(
                "llama",
                PromptInput::Multiple(vec![]),
                false,
            )),
        )
        .await
        .unwrap_err();

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.response.error.param.as_deref(), Some("prompt"));
    }

    #[tokio::test]
    async fn test_unknown_model_rejected() {
        let state = state_with(MockBackend::new("mock"), vec![], vec![]).await;

        let error = create_completion(
            State(state),
            RequireAuth,
            Json(completion_request(
                "ghost",
                PromptInput::Single("hi".to_string()),
                false,
            )),
        )
        .await
        .unwrap_err();

        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stream_relays_text_deltas_and_one_done() {
        let state = state_with(
            MockBackend::new("mock")
                .with_models(vec!["llama"])
                .with_response(
                    Completion::new("c-1", Message::assistant("hi"))
                        .with_reason(CompletionReason::Stop),
                ),
            vec![],
            vec![],
        )
        .await;

        let response = create_completion(
            State(state),
            RequireAuth,
            Json(completion_request(
                "llama",
                PromptInput::Single("greet".to_string()),
                true,
            )),
        )
        .await
        .unwrap();

        let body = body_text(response).await;

        assert!(body.contains("text_completion"));
        assert!(body.contains(r#""text":"h""#));
        assert!(body.contains(r#""text":"i""#));
        assert!(body.contains(r#""finish_reason":"stop""#));
        assert_eq!(body.matches("data: [DONE]").count(), 1);
    }
}
