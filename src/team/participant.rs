//! Participants
//!
//! Actors capable of producing the next message given the transcript.
//! Concrete backends (model-backed, human-proxy) are variants behind the
//! `Participant` trait.

use async_trait::async_trait;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chat::history::{History, Message, USER_SPEAKER};
use crate::core::{ChatMessage, Result, ToolDefinition, TroikaError};
use crate::llm::ChatBackend;
use crate::tools::PythonExecutor;

/// Immutable identity and role of one team member
#[derive(Debug, Clone)]
pub struct ParticipantDescriptor {
    /// Unique name within the team
    pub name: String,
    /// Role description shown to the coordinator selector
    pub description: String,
    /// System instructions for model-backed participants
    pub system_prompt: Option<String>,
    /// Whether this participant may invoke the code execution tool
    pub has_tools: bool,
}

impl ParticipantDescriptor {
    /// Create a descriptor with no system prompt and no tools
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            system_prompt: None,
            has_tools: false,
        }
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// An actor that produces exactly one message per turn, or fails.
///
/// Tool calls made while producing the message are internal to `act` and
/// never appear as separate transcript entries.
#[async_trait]
pub trait Participant: Send + Sync {
    /// Identity and role of this participant
    fn descriptor(&self) -> &ParticipantDescriptor;

    /// Participant name, unique within the team
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Produce the next message given the transcript so far
    async fn act(&self, history: &History) -> Result<Message>;
}

/// Model-backed participant, optionally able to run code via the executor.
///
/// `act` flattens the transcript into role-tagged messages (own turns become
/// assistant turns, everything else user turns), then loops over tool calls
/// up to a bounded number of round-trips before settling on a final message.
pub struct AssistantParticipant {
    descriptor: ParticipantDescriptor,
    backend: Arc<dyn ChatBackend>,
    executor: Option<Arc<PythonExecutor>>,
    max_tool_turns: usize,
    debug: bool,
}

impl AssistantParticipant {
    /// Create a model-backed participant without tools
    pub fn new(descriptor: ParticipantDescriptor, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            descriptor,
            backend,
            executor: None,
            max_tool_turns: 5,
            debug: false,
        }
    }

    /// Give the participant the code execution tool
    pub fn with_executor(mut self, executor: Arc<PythonExecutor>) -> Self {
        self.descriptor.has_tools = true;
        self.executor = Some(executor);
        self
    }

    /// Bound the number of tool round-trips inside one turn
    pub fn max_tool_turns(mut self, max: usize) -> Self {
        self.max_tool_turns = max.max(1);
        self
    }

    /// Enable debug output
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Flatten the transcript into the model-facing message list
    fn build_messages(&self, history: &History) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);

        if let Some(prompt) = &self.descriptor.system_prompt {
            messages.push(ChatMessage::system(prompt.clone()));
        }

        for entry in history.iter() {
            if entry.speaker == self.descriptor.name {
                messages.push(ChatMessage::assistant(entry.content.clone()));
            } else if entry.speaker == USER_SPEAKER {
                messages.push(ChatMessage::user(entry.content.clone()));
            } else {
                // Other participants' turns arrive as attributed user turns
                messages.push(ChatMessage::user(format!(
                    "{}: {}",
                    entry.speaker, entry.content
                )));
            }
        }

        messages
    }

    fn wrap_err(&self, e: TroikaError) -> TroikaError {
        match e {
            e @ TroikaError::Participant { .. } => e,
            other => TroikaError::participant(&self.descriptor.name, other.to_string()),
        }
    }
}

#[async_trait]
impl Participant for AssistantParticipant {
    fn descriptor(&self) -> &ParticipantDescriptor {
        &self.descriptor
    }

    async fn act(&self, history: &History) -> Result<Message> {
        let mut messages = self.build_messages(history);

        let tools: Vec<ToolDefinition> = self
            .executor
            .as_ref()
            .map(|_| vec![PythonExecutor::definition()])
            .unwrap_or_default();

        for _ in 0..self.max_tool_turns {
            let response = if tools.is_empty() {
                self.backend.chat(&messages, None).await
            } else {
                self.backend.chat_with_tools(&messages, &tools, None).await
            }
            .map_err(|e| self.wrap_err(e))?;

            if response.tool_calls.is_empty() {
                return Ok(Message::new(&self.descriptor.name, response.content));
            }

            let executor = self
                .executor
                .as_ref()
                .ok_or_else(|| {
                    TroikaError::participant(
                        &self.descriptor.name,
                        "Backend requested tools but none are configured",
                    )
                })?;

            messages.push(ChatMessage::assistant_with_tools(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                if self.debug {
                    eprintln!(
                        "DEBUG: {} invoking tool {}",
                        self.descriptor.name, call.name
                    );
                }
                let result = match call.get_string("code") {
                    Some(code) => executor.run_code(&code).await,
                    None => Err(TroikaError::tool(format!(
                        "Tool call '{}' missing 'code' argument",
                        call.name
                    ))),
                };

                let output = match result {
                    Ok(result) => result.output,
                    Err(e) => format!("Execution failed: {}", e),
                };

                let call_id = call.id.clone().unwrap_or_else(|| call.name.clone());
                messages.push(ChatMessage::tool(call_id, output));
            }
        }

        // Tool budget exhausted: ask for a final answer without tools
        let response = self
            .backend
            .chat(&messages, None)
            .await
            .map_err(|e| self.wrap_err(e))?;
        Ok(Message::new(&self.descriptor.name, response.content))
    }
}

/// Human-proxy participant reading one line from stdin per turn.
///
/// The original arrangement consults a human for the final summary when
/// verification cannot complete on its own.
pub struct HumanParticipant {
    descriptor: ParticipantDescriptor,
}

impl HumanParticipant {
    /// Create a human-proxy participant
    pub fn new(descriptor: ParticipantDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl Participant for HumanParticipant {
    fn descriptor(&self) -> &ParticipantDescriptor {
        &self.descriptor
    }

    async fn act(&self, _history: &History) -> Result<Message> {
        println!("\n[{}] Your response: ", self.descriptor.name);

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        let read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| TroikaError::participant(&self.descriptor.name, e.to_string()))?;

        if read == 0 {
            return Err(TroikaError::participant(
                &self.descriptor.name,
                "stdin closed before a response was entered",
            ));
        }

        Ok(Message::new(&self.descriptor.name, line.trim().to_string()))
    }
}
