use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::http_client::HttpClientTrait;
use crate::domain::{
    CompleteOptions, Completion, CompletionReason, CompletionStream, DomainError, FunctionCall,
    LlmBackend, Message, MessageRole, Model, Usage,
};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Backend speaking the OpenAI wire format.
///
/// Serves the models declared in configuration; with an empty declaration
/// the upstream catalog is fetched instead.
#[derive(Debug)]
pub struct OpenAiBackend<C: HttpClientTrait> {
    client: C,
    auth_header: Option<String>,
    base_url: String,
    models: Vec<String>,
}

impl<C: HttpClientTrait> OpenAiBackend<C> {
    pub fn new(
        client: C,
        base_url: impl Into<String>,
        api_key: Option<String>,
        models: Vec<String>,
    ) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.is_empty() {
            DEFAULT_OPENAI_BASE_URL.to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };

        let auth_header = api_key
            .filter(|key| !key.is_empty())
            .map(|key| format!("Bearer {key}"));

        Self {
            client,
            auth_header,
            base_url,
            models,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];

        if let Some(ref auth) = self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }

        headers
    }

    fn build_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompleteOptions,
        stream: bool,
    ) -> serde_json::Value {
        let messages: Vec<OpenAiMessage> = messages.iter().map(OpenAiMessage::from_domain).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": stream,
        });

        if let Some(temperature) = options.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !options.stop.is_empty() {
            body["stop"] = serde_json::json!(options.stop);
        }

        if !options.tools.is_empty() {
            let tools: Vec<serde_json::Value> = options
                .tools
                .iter()
                .map(|tool| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters.clone().unwrap_or_else(|| {
                                serde_json::json!({"type": "object", "properties": {}})
                            }),
                        }
                    })
                })
                .collect();

            body["tools"] = serde_json::json!(tools);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Completion, DomainError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("openai", format!("failed to parse response: {e}"))
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider("openai", "no choices in response"))?;

        let mut message = Message::assistant(choice.message.content.unwrap_or_default());

        if let Some(calls) = choice.message.tool_calls {
            let calls = calls
                .into_iter()
                .map(|call| {
                    FunctionCall::new(call.function.name, call.function.arguments).with_id(call.id)
                })
                .collect();

            message = message.with_function_calls(calls);
        }

        let mut completion = Completion::new(response.id, message);

        if let Some(reason) = choice.finish_reason {
            completion = completion.with_reason(parse_reason(&reason));
        }

        if let Some(usage) = response.usage {
            completion = completion.with_usage(Usage::new(
                usage.prompt_tokens,
                usage.completion_tokens,
            ));
        }

        Ok(completion)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmBackend for OpenAiBackend<C> {
    async fn models(&self) -> Result<Vec<Model>, DomainError> {
        if !self.models.is_empty() {
            return Ok(self.models.iter().map(Model::new).collect());
        }

        let response = self
            .client
            .get_json(&self.models_url(), self.headers())
            .await?;

        let listing: OpenAiModelList = serde_json::from_value(response).map_err(|e| {
            DomainError::provider("openai", format!("failed to parse model list: {e}"))
        })?;

        Ok(listing.data.into_iter().map(|m| Model::new(m.id)).collect())
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<Completion, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, messages, &options, false);

        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(response)
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: CompleteOptions,
    ) -> Result<CompletionStream, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(model, messages, &options, true);

        let byte_stream = self
            .client
            .post_json_stream(&url, self.headers(), &body)
            .await?;

        // Events can split across network reads; carry partial lines forward
        let stream = byte_stream
            .scan(String::new(), |buffer, result| {
                let items: Vec<Result<Completion, DomainError>> = match result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        let mut parsed = Vec::new();

                        while let Some(position) = buffer.find('\n') {
                            let line = buffer[..position].trim_end_matches('\r').to_string();
                            buffer.drain(..=position);

                            if let Some(item) = parse_sse_line(&line) {
                                parsed.push(item);
                            }
                        }

                        parsed
                    }
                    Err(e) => vec![Err(e)],
                };

                futures::future::ready(Some(futures::stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }

    async fn embed(&self, model: &str, input: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let body = serde_json::json!({
            "model": model,
            "input": input,
        });

        let response = self
            .client
            .post_json(&self.embeddings_url(), self.headers(), &body)
            .await?;

        let parsed: OpenAiEmbeddingResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::provider("openai", format!("failed to parse embeddings: {e}"))
        })?;

        let mut data = parsed.data;
        data.sort_by_key(|entry| entry.index);

        Ok(data.into_iter().map(|entry| entry.embedding).collect())
    }
}

fn parse_sse_line(line: &str) -> Option<Result<Completion, DomainError>> {
    let data = line.strip_prefix("data: ")?;

    if data.trim() == "[DONE]" {
        return None;
    }

    let chunk: OpenAiStreamChunk = serde_json::from_str(data).ok()?;
    let choice = chunk.choices.into_iter().next()?;

    let delta = choice.delta.content.unwrap_or_default();
    let mut completion = Completion::new(chunk.id, Message::assistant(delta));

    if let Some(reason) = choice.finish_reason {
        completion = completion.with_reason(parse_reason(&reason));
    }

    Some(Ok(completion))
}

fn parse_reason(reason: &str) -> CompletionReason {
    match reason {
        "length" => CompletionReason::Length,
        "tool_calls" | "function_call" => CompletionReason::Function,
        _ => CompletionReason::Stop,
    }
}

// OpenAI wire types

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OpenAiToolCall>,
}

impl OpenAiMessage {
    fn from_domain(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };

        let tool_calls: Vec<OpenAiToolCall> = message
            .function_calls
            .iter()
            .map(|call| OpenAiToolCall {
                id: call.id.clone(),
                kind: "function".to_string(),
                function: OpenAiFunctionSpec {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect();

        // An assistant turn that only issues calls carries no content field
        let content = (!message.content.is_empty() || tool_calls.is_empty())
            .then(|| message.content.clone());

        Self {
            role,
            content,
            tool_call_id: message.function.clone(),
            tool_calls,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiToolCall {
    id: String,

    #[serde(rename = "type")]
    kind: String,

    function: OpenAiFunctionSpec,
}

#[derive(Debug, Serialize)]
struct OpenAiFunctionSpec {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCallResponse>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCallResponse {
    #[serde(default)]
    id: String,
    function: OpenAiFunctionResponse,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunctionResponse {
    name: String,

    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    id: String,
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    data: Vec<OpenAiModelEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingEntry {
    index: usize,
    embedding: Vec<f32>,
}
