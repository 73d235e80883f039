//! Chat completions endpoint

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

use crate::api::middleware::RequireAuth;
use crate::api::state::AppState;
use crate::api::types::{
    to_tools, ApiError, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse,
    FinishReason, Json, StopSequence, ToolDefinition, Usage,
};
use crate::domain::llm::{CompleteOptions, LlmBackend, Message};
use crate::infrastructure::observability::record_completion;

/// POST /v1/chat/completions
pub async fn create_chat_completion(
    State(state): State<AppState>,
    _auth: RequireAuth,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Response, ApiError> {
    info!(
        model = %request.model,
        stream = request.stream,
        "chat completion request"
    );

    if request.messages.is_empty() {
        return Err(ApiError::bad_request("messages cannot be empty").with_param("messages"));
    }

    let messages: Vec<Message> = request.messages.iter().map(|m| m.to_domain()).collect();

    let options = build_options(
        request.temperature,
        request.max_tokens,
        request.stop.as_ref(),
        request.tools.as_deref(),
    )?;

    if request.stream {
        return stream_chat_completion(state, request.model, messages, options).await;
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

    let id = response_id(&completion.id);
    let response = ChatCompletionResponse::from_completion(&id, &request.model, &completion);

    Ok(Json(response).into_response())
}

/// Map request fields onto domain options, validating ranges
pub(super) fn build_options(
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    stop: Option<&StopSequence>,
    tools: Option<&[ToolDefinition]>,
) -> Result<CompleteOptions, ApiError> {
    let mut options = CompleteOptions::new();

    if let Some(temperature) = temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ApiError::bad_request("temperature must be between 0 and 2")
                .with_param("temperature"));
        }
        options = options.with_temperature(temperature);
    }

    if let Some(max_tokens) = max_tokens {
        options = options.with_max_tokens(max_tokens);
    }

    if let Some(stop) = stop {
        options = options.with_stop(stop.to_vec());
    }

    if let Some(tools) = tools {
        options = options.with_tools(to_tools(tools));
    }

    Ok(options)
}

/// Keep a backend-assigned completion id, generate one otherwise
pub(super) fn response_id(completion_id: &str) -> String {
    if completion_id.is_empty() {
        format!("chatcmpl-{}", Uuid::new_v4())
    } else {
        completion_id.to_string()
    }
}

/// Relay a completion as Server-Sent Events.
///
/// Chain models are buffered and emitted as a single frame; backend
/// models relay deltas as they arrive. Either way the stream carries
/// exactly one terminal `[DONE]` frame, and failures after the stream
/// has started are logged rather than surfaced.
async fn stream_chat_completion(
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

                    let id = response_id(&completion.id);
                    let chunk = ChatCompletionChunk::message(&id, &model, &completion);
                    send_frame(&tx, &chunk).await;
                }
                Err(e) => {
                    record_completion(&model, false, started.elapsed(), None);
                    error!(model = %model, error = %e, "chain stream failed");
                }
            }

            send_done(&tx).await;
        });
    } else {
        // Resolve the stream before committing to an SSE response so
        // startup failures still reach the client as plain errors
        let mut stream = state
            .dispatcher
            .chat_stream(&model, &messages, options)
            .await?;

        tokio::spawn(async move {
            let started = Instant::now();
            let id = format!("chatcmpl-{}", Uuid::new_v4());
            let mut reason = None;
            let mut usage = None;
            let mut failed = false;

            send_frame(&tx, &ChatCompletionChunk::role(&id, &model)).await;

            while let Some(item) = stream.next().await {
                match item {
                    Ok(delta) => {
                        if !delta.content().is_empty() {
                            let chunk = ChatCompletionChunk::content(&id, &model, delta.content());
                            if !send_frame(&tx, &chunk).await {
                                break;
                            }
                        }

                        if delta.reason.is_some() {
                            reason = delta.reason;
                        }
                        if delta.usage.is_some() {
                            usage = delta.usage;
                        }
                    }
                    Err(e) => {
                        failed = true;
                        error!(model = %model, error = %e, "completion stream failed");
                        break;
                    }
                }
            }

            record_completion(&model, !failed, started.elapsed(), usage.as_ref());

            let reason = reason.map(FinishReason::from).unwrap_or(FinishReason::Stop);
            let usage = usage.map(Usage::from);
            send_frame(&tx, &ChatCompletionChunk::finish(&id, &model, reason, usage)).await;

            send_done(&tx).await;
        });
    }

    Ok(Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::default())
        .into_response())
}

pub(super) async fn send_frame<T: serde::Serialize>(
    tx: &tokio::sync::mpsc::Sender<Result<Event, std::convert::Infallible>>,
    payload: &T,
) -> bool {
    match Event::default().json_data(payload) {
        Ok(event) => tx.send(Ok(event)).await.is_ok(),
        Err(e) => {
            error!(error = %e, "failed to encode stream frame");
            false
        }
    }
}

pub(super) async fn send_done(
    tx: &tokio::sync::mpsc::Sender<Result<Event, std::convert::Infallible>>,
) {
    let _ = tx.send(Ok(Event::default().data("[DONE]"))).await;
}
