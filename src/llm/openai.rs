//! OpenAI-compatible chat completions client
//!
//! Async HTTP client for any endpoint speaking the `/chat/completions`
//! protocol, with tool calling support.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{ChatMessage, Config, Result, ToolCall, ToolDefinition, TroikaError};
use crate::llm::traits::{BackendResponse, ChatBackend, GenerateOptions, TokenUsage};

/// OpenAI-compatible API client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    debug: bool,
}

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<&'a ToolDefinition>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// Message in the wire format
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Tool call in the wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunction,
}

/// Function within a wire tool call; arguments are a JSON-encoded string
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.model.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.model.base_url.trim_end_matches('/').to_string(),
            api_key: config.model.api_key.clone(),
            model: config.model.name.clone(),
            temperature: config.model.temperature,
            debug: config.run.debug,
        }
    }

    /// The model identifier this client sends with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert internal ChatMessage to wire format
    fn to_wire_message(msg: &ChatMessage) -> WireMessage {
        WireMessage {
            role: msg.role.clone(),
            content: Some(msg.content.clone()),
            tool_calls: msg.tool_calls.as_ref().map(|calls| {
                calls
                    .iter()
                    .map(|tc| WireToolCall {
                        id: tc.id.clone(),
                        call_type: "function".to_string(),
                        function: WireFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect()
            }),
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    /// Convert a wire response to BackendResponse
    fn to_backend_response(response: ChatResponse) -> Result<BackendResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TroikaError::backend("Backend returned no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::Null);
                ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(BackendResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model: response.model,
            usage,
        })
    }

    /// Debug print if enabled
    fn debug_print(&self, label: &str, content: &str) {
        if self.debug {
            let shown = Self::truncate_to_boundary(content, 500);
            if shown.len() < content.len() {
                eprintln!("DEBUG {}: {}...", label, shown);
            } else {
                eprintln!("DEBUG {}: {}", label, shown);
            }
        }
    }

    /// Truncate to at most `max` bytes without splitting a UTF-8 character
    fn truncate_to_boundary(content: &str, max: usize) -> &str {
        if content.len() <= max {
            return content;
        }
        let mut end = max;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        &content[..end]
    }

    async fn chat_internal(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
        options: Option<GenerateOptions>,
    ) -> Result<BackendResponse> {
        let wire_messages: Vec<WireMessage> =
            messages.iter().map(Self::to_wire_message).collect();

        let opts = options.unwrap_or_default();
        let request = ChatRequest {
            model: &self.model,
            messages: wire_messages,
            tools: tools
                .filter(|t| !t.is_empty())
                .map(|t| t.iter().collect()),
            temperature: opts.temperature.unwrap_or(self.temperature),
            max_tokens: opts.max_tokens,
            stop: opts.stop,
        };

        let request_json = serde_json::to_string(&request)?;
        self.debug_print("Request", &request_json);

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);

        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                TroikaError::backend(format!(
                    "Cannot connect to backend at {}. Is the endpoint reachable?",
                    self.base_url
                ))
            } else {
                TroikaError::from(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TroikaError::backend(format!(
                "Backend API error ({}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        self.debug_print("Response", &body);

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TroikaError::backend(format!("Malformed backend response: {}", e)))?;

        Self::to_backend_response(parsed)
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: Option<GenerateOptions>,
    ) -> Result<BackendResponse> {
        self.chat_internal(messages, None, options).await
    }

    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<BackendResponse> {
        self.chat_internal(messages, Some(tools), options).await
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}
