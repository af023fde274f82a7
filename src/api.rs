use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{Credentials, Settings};
use crate::error::{GenError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model_id: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The parts of a completion the caller cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub total_tokens: u64,
    pub choices: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
struct Response {
    // Note: docs don't specify this as optional, but it was noticed in practice
    id: Option<String>,
    model: String,
    choices: Vec<Choice>,

    // Always returned for non-streaming requests, but proxies sometimes strip it
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize, Clone)]
struct Choice {
    // Ex: 'stop' | 'length' | 'content_filter'
    finish_reason: Option<String>,
    message: Message,
}

#[derive(Debug, Deserialize, Clone)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,

    // Sum of the above two fields
    total_tokens: u64,
}

#[derive(Debug, Deserialize, Clone)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize, Clone)]
struct ErrorResponseContainer {
    error: ErrorResponse,
}

/// Anything that can answer a chat-completion request.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// `ApiClient` talks to an OpenAI compatible chat-completion endpoint over HTTP.
pub struct ApiClient {
    api: String,
    credentials: Credentials,
    client: Client,
}

impl ApiClient {
    pub fn new(settings: &Settings, credentials: Credentials) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(ApiClient {
            api: settings.api.trim_end_matches('/').to_string(),
            credentials,
            client: builder.build()?,
        })
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.api)
    }
}

#[async_trait]
impl ChatCompletion for ApiClient {
    /// Posts the request and waits for the whole reply.
    ///
    /// A non-success status is turned into [`GenError::Service`] carrying the
    /// status code and, where the body is the usual `{"error": {...}}`
    /// envelope, the service's message.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = build_request_body(request);
        let url = self.url();
        info!(model = %request.model_id, url = %url, "sending chat completion request");

        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.api_key),
            )
            .json(&body);
        if let Some(org) = &self.credentials.organization {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.send().await?;
        let status = response.status();
        let response_text = response.text().await?;
        debug!(status = status.as_u16(), bytes = response_text.len(), "received response");

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorResponseContainer>(&response_text) {
                Ok(container) => container.error.message,
                Err(_) => response_text,
            };
            return Err(GenError::Service {
                status: status.as_u16(),
                message,
            });
        }

        parse_response(&response_text)
    }
}

/// Constructs the JSON body for a chat-completion call.
///
/// Streaming is always disabled; the whole reply is read in one go.
pub fn build_request_body(request: &ChatRequest) -> serde_json::Value {
    json!({
        "model": request.model_id,
        "messages": request.messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": false,
    })
}

/// Parses a successful response body.
///
/// Bodies that don't match the completion shape are tried as an error
/// envelope, since some providers answer 200 with an error payload.
pub fn parse_response(response_text: &str) -> Result<ChatResponse> {
    let api_result = match serde_json::from_str::<Response>(response_text) {
        Ok(r) => r,
        Err(e) => {
            return match serde_json::from_str::<ErrorResponseContainer>(response_text) {
                Ok(container) => Err(GenError::Service {
                    status: 200,
                    message: container.error.message,
                }),
                Err(_) => Err(GenError::MalformedResponse(format!(
                    "Failed to parse JSON: {}\nRaw JSON: {}",
                    e, response_text
                ))),
            };
        }
    };

    debug!(id = ?api_result.id, model = %api_result.model, "parsed completion");

    let usage = api_result
        .usage
        .ok_or_else(|| GenError::MalformedResponse("response has no usage data".to_string()))?;
    debug!(
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        "token usage"
    );

    if api_result.choices.is_empty() {
        return Err(GenError::MalformedResponse(
            "response has no choices".to_string(),
        ));
    }

    let choices = api_result
        .choices
        .into_iter()
        .map(|c| {
            debug!(finish_reason = ?c.finish_reason, "choice");
            c.message.content.unwrap_or_default()
        })
        .collect();

    Ok(ChatResponse {
        total_tokens: usage.total_tokens,
        choices,
    })
}
