/// LLM Client: the single point of entry for all provider calls in the service.
///
/// ARCHITECTURAL RULE: No other module may call the chat-completions or embeddings
/// endpoints directly. All LLM interactions MUST go through this module.
///
/// The provider key, model and temperature are chosen per request (`LlmParams`);
/// the base URL, embedding model and retry policy come from `Config`.
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Context;
use regex::Regex;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod failure;
pub mod prompts;

pub use failure::ProviderFailure;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No API key provided")]
    MissingApiKey,

    #[error("Unexpected provider response: {0}")]
    UnexpectedShape(String),
}

impl LlmError {
    /// Maps the error onto one of the provider failure categories shown to users.
    pub fn failure(&self) -> ProviderFailure {
        match self {
            LlmError::Api { status, message } => ProviderFailure::classify(Some(*status), message),
            LlmError::RateLimited { .. } => ProviderFailure::RateLimited,
            LlmError::MissingApiKey => ProviderFailure::InvalidApiKey,
            LlmError::Http(e) => {
                ProviderFailure::classify(e.status().map(|s| s.as_u16()), &e.to_string())
            }
            LlmError::Parse(_) | LlmError::EmptyContent | LlmError::UnexpectedShape(_) => {
                ProviderFailure::Unknown
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (OpenAI-compatible chat completions + embeddings)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Echo of an assistant turn that requested tool calls.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    #[serde(default)]
    pub arguments: String,
}

/// A function the model may call, described with a JSON schema.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec,
}

#[derive(Debug, Clone, Serialize)]
struct FunctionSpec {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

impl ToolSpec {
    pub fn function(name: &'static str, description: &'static str, parameters: Value) -> Self {
        Self {
            kind: "function",
            function: FunctionSpec {
                name,
                description,
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        self.function.name
    }
}

fn no_tools(tools: &&[ToolSpec]) -> bool {
    tools.is_empty()
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolSpec],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// One assistant turn: free text, tool calls, or both.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatReply {
    /// Trimmed text content, if the model produced any.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Per-request provider settings. Users bring their own key, model and temperature.
#[derive(Clone)]
pub struct LlmParams {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

// Deliberately not derived: the key must never reach the logs.
impl std::fmt::Debug for LlmParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmParams")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The single LLM client used by all services.
/// Wraps chat completions and embeddings with optional retry and structured-output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_base: String,
    fallback_api_key: Option<String>,
    default_model: String,
    embedding_model: String,
    max_retries: u32,
}

impl LlmClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.llm_api_base.trim_end_matches('/').to_string(),
            fallback_api_key: config.llm_api_key.clone(),
            default_model: config.default_model.clone(),
            embedding_model: config.embedding_model.clone(),
            max_retries: config.llm_max_retries,
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Resolves the per-request settings. A blank request key falls back to the configured one.
    pub fn params(
        &self,
        api_key: Option<&str>,
        model: Option<&str>,
        temperature: f32,
    ) -> Result<LlmParams, LlmError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.fallback_api_key.clone())
            .ok_or(LlmError::MissingApiKey)?;

        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model)
            .to_string();

        Ok(LlmParams {
            api_key,
            model,
            temperature,
        })
    }

    /// Sends a full conversation, optionally advertising tools, and returns the first choice.
    pub async fn chat(
        &self,
        params: &LlmParams,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatReply, LlmError> {
        let request_body = ChatCompletionRequest {
            model: &params.model,
            messages,
            temperature: params.temperature,
            tools,
        };

        let response: ChatCompletionResponse = self
            .post_json("chat/completions", &params.api_key, &request_body)
            .await?;

        if let Some(usage) = &response.usage {
            debug!(
                "LLM call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                params.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::UnexpectedShape("response has no choices".to_string()))?;

        Ok(ChatReply {
            content: message.content,
            tool_calls: message.tool_calls.unwrap_or_default(),
        })
    }

    /// System + user prompt in, trimmed text out.
    pub async fn complete(
        &self,
        params: &LlmParams,
        system: &str,
        user: &str,
    ) -> Result<String, LlmError> {
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        let reply = self.chat(params, &messages, &[]).await?;
        reply
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        params: &LlmParams,
        system: &str,
        user: &str,
    ) -> Result<T, LlmError> {
        let text = self.complete(params, system, user).await?;
        parse_json_lenient(&text).map_err(LlmError::Parse)
    }

    /// Embeds a batch of inputs. Output order matches input order.
    pub async fn embed(&self, api_key: &str, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request_body = EmbeddingRequest {
            model: &self.embedding_model,
            input: inputs,
        };
        let mut response: EmbeddingResponse =
            self.post_json("embeddings", api_key, &request_body).await?;

        if response.data.len() != inputs.len() {
            return Err(LlmError::UnexpectedShape(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    /// POSTs a JSON body and decodes a JSON response.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff when configured.
    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        api_key: &str,
        body: &B,
    ) -> Result<R, LlmError> {
        let url = format!("{}/{}", self.api_base, path);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if !status.is_success() {
                let raw = response.text().await.unwrap_or_default();
                let message = provider_message(&raw);
                warn!("LLM API returned {}: {}", status, message);

                let error = LlmError::Api {
                    status: status.as_u16(),
                    message,
                };
                if status.as_u16() == 429 || status.is_server_error() {
                    last_error = Some(error);
                    continue;
                }
                return Err(error);
            }

            return Ok(response.json::<R>().await?);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

/// Pulls `error.message` (and `error.code`) out of a provider error body, if it has that shape.
fn provider_message(raw: &str) -> String {
    match serde_json::from_str::<ProviderError>(raw) {
        Ok(ProviderError {
            error: ProviderErrorBody {
                message,
                code: Some(code),
            },
        }) => format!("{message} ({code})"),
        Ok(parsed) => parsed.error.message,
        Err(_) => raw.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response salvage
// ────────────────────────────────────────────────────────────────────────────

static JSON_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));
static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// The outermost `[...]` span in `text`, if any.
pub fn extract_json_array(text: &str) -> Option<&str> {
    JSON_ARRAY_RE.find(text).map(|m| m.as_str())
}

/// The outermost `{...}` span in `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT_RE.find(text).map(|m| m.as_str())
}

/// Parses model output as JSON, tolerating fences and prose around the payload.
pub fn parse_json_lenient<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let stripped = strip_json_fences(text);
    let first_error = match serde_json::from_str(stripped) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    for candidate in [extract_json_object(stripped), extract_json_array(stripped)]
        .into_iter()
        .flatten()
    {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Ok(value);
        }
    }

    Err(first_error)
}
