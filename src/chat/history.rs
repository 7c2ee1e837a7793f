//! Conversation transcript
//!
//! Append-only message history shared by participants, the turn selector,
//! and the termination policy. Only the conversation loop appends.

use serde::{Deserialize, Serialize};

/// Speaker name used for the synthetic seed message
pub const USER_SPEAKER: &str = "user";

/// One entry in the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Name of the participant that produced this message
    pub speaker: String,
    /// Content of the message
    pub content: String,
    /// Position in the transcript, assigned on append, strictly increasing
    pub seq: u64,
}

impl Message {
    /// Create a message; `seq` is assigned when the loop appends it
    pub fn new(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            content: content.into(),
            seq: 0,
        }
    }

    /// Create a message attributed to the synthetic user speaker
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(USER_SPEAKER, content)
    }
}

/// Append-only ordered sequence of messages for one run
#[derive(Debug, Clone, Default)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history seeded with the initial task
    pub fn seeded(task: impl Into<String>) -> Self {
        let mut history = Self::new();
        history.append(Message::user(task));
        history
    }

    /// Append a message, assigning its sequence index. Returns the
    /// stored entry.
    pub fn append(&mut self, mut message: Message) -> &Message {
        message.seq = self.messages.len() as u64;
        self.messages.push(message);
        self.messages.last().unwrap()
    }

    /// Get the most recent message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Iterate over messages in order
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Render the transcript as `speaker: content` lines, used for the
    /// coordinator prompt and participant context.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.speaker, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
