//! Chat backend trait for abstracting the model API
//!
//! Enables swapping the HTTP client for scripted backends in tests.

use async_trait::async_trait;

use crate::core::{ChatMessage, Result, ToolCall, ToolDefinition};

/// Response from a chat backend
#[derive(Debug, Clone)]
pub struct BackendResponse {
    /// Text content of the response
    pub content: String,
    /// Any tool calls the model wants to make
    pub tool_calls: Vec<ToolCall>,
    /// Model that generated the response
    pub model: String,
    /// Token usage information
    pub usage: Option<TokenUsage>,
}

impl BackendResponse {
    /// Create a plain text response with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            model: String::new(),
            usage: None,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Options for generation
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 - 2.0); defaults to the client's
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

/// Trait for chat backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generate a response from messages
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: Option<GenerateOptions>,
    ) -> Result<BackendResponse>;

    /// Generate a response with tool definitions available
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<BackendResponse>;

    /// Get the backend name
    fn name(&self) -> &str;
}
