//! LLM module - chat backend integrations
//!
//! Provides the backend abstraction with an OpenAI-compatible HTTP client as
//! the primary implementation.

pub mod openai;
pub mod traits;

pub use openai::OpenAiClient;
pub use traits::{BackendResponse, ChatBackend, GenerateOptions, TokenUsage};
