//! Turn selectors
//!
//! Decide which participant acts next: a fixed round-robin cursor, or a
//! coordinator model that names the next speaker based on the transcript.

use async_trait::async_trait;
use std::sync::Arc;

use crate::chat::history::History;
use crate::core::{ChatMessage, Result, TroikaError};
use crate::llm::{ChatBackend, GenerateOptions};
use crate::team::ParticipantDescriptor;

/// Policy choosing the next speaker, returning an index into the roster
#[async_trait]
pub trait TurnSelector: Send + Sync {
    /// Select the participant that acts next
    async fn select(
        &mut self,
        history: &History,
        roster: &[ParticipantDescriptor],
    ) -> Result<usize>;
}

/// Fixed cyclic turn order.
///
/// A single cursor advances by one (mod team size) after each turn. With
/// `allow_repeat` disabled the same index is never returned twice in a row.
pub struct RoundRobinSelector {
    cursor: usize,
    allow_repeat: bool,
    last: Option<usize>,
}

impl RoundRobinSelector {
    /// Create a selector starting at the first participant
    pub fn new(allow_repeat: bool) -> Self {
        Self {
            cursor: 0,
            allow_repeat,
            last: None,
        }
    }

    /// Advance the cursor past an externally made choice so a later
    /// fallback continues the cycle instead of restarting it.
    pub fn sync_to(&mut self, index: usize, roster_len: usize) {
        self.cursor = (index + 1) % roster_len.max(1);
        self.last = Some(index);
    }

    fn next_index(&mut self, roster_len: usize) -> Result<usize> {
        if roster_len == 0 {
            return Err(TroikaError::selection("Roster is empty"));
        }

        let mut index = self.cursor % roster_len;
        if !self.allow_repeat && self.last == Some(index) {
            if roster_len == 1 {
                return Err(TroikaError::selection(
                    "Repeated speaker forbidden with a single-participant roster",
                ));
            }
            index = (index + 1) % roster_len;
        }

        self.cursor = (index + 1) % roster_len;
        self.last = Some(index);
        Ok(index)
    }
}

#[async_trait]
impl TurnSelector for RoundRobinSelector {
    async fn select(
        &mut self,
        _history: &History,
        roster: &[ParticipantDescriptor],
    ) -> Result<usize> {
        self.next_index(roster.len())
    }
}

/// Coordinator-driven turn order.
///
/// Renders the selector prompt with the roster's role descriptions and the
/// transcript, then asks the backend to name the next speaker. Unrecognized
/// replies are retried up to `max_attempts`; when the budget is exhausted the
/// selector falls back to its round-robin cursor, or fails the run when no
/// fallback is configured.
pub struct ModelSelector {
    backend: Arc<dyn ChatBackend>,
    prompt_template: String,
    max_attempts: usize,
    fallback: Option<RoundRobinSelector>,
    debug: bool,
}

impl ModelSelector {
    /// Create a selector asking `backend` to pick the next speaker
    pub fn new(backend: Arc<dyn ChatBackend>, prompt_template: impl Into<String>) -> Self {
        Self {
            backend,
            prompt_template: prompt_template.into(),
            max_attempts: 3,
            fallback: Some(RoundRobinSelector::new(true)),
            debug: false,
        }
    }

    /// Set the retry budget for unrecognized replies
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Enable or disable the round-robin fallback
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled.then(|| RoundRobinSelector::new(true));
        self
    }

    /// Enable debug output
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn build_prompt(&self, history: &History, roster: &[ParticipantDescriptor]) -> String {
        let roles = roster
            .iter()
            .map(|d| format!("{}: {}", d.name, d.description))
            .collect::<Vec<_>>()
            .join("\n");
        let participants = roster
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        self.prompt_template
            .replace("{roles}", &roles)
            .replace("{participants}", &participants)
            .replace("{history}", &history.render())
    }

    /// Parse an untrusted free-text reply into a roster index.
    ///
    /// Exact trimmed match first, then a unique substring hit. Ambiguous or
    /// unknown replies are rejected.
    fn parse_choice(reply: &str, roster: &[ParticipantDescriptor]) -> Option<usize> {
        let cleaned = reply
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.');

        if let Some(index) = roster.iter().position(|d| d.name == cleaned) {
            return Some(index);
        }

        let hits: Vec<usize> = roster
            .iter()
            .enumerate()
            .filter(|(_, d)| reply.contains(&d.name))
            .map(|(index, _)| index)
            .collect();

        match hits.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }
}

#[async_trait]
impl TurnSelector for ModelSelector {
    async fn select(
        &mut self,
        history: &History,
        roster: &[ParticipantDescriptor],
    ) -> Result<usize> {
        if roster.is_empty() {
            return Err(TroikaError::selection("Roster is empty"));
        }

        // The first turn always goes to the first participant; there is no
        // transcript yet for the coordinator to reason about.
        if history.is_empty() {
            if let Some(fallback) = &mut self.fallback {
                fallback.sync_to(0, roster.len());
            }
            return Ok(0);
        }

        let prompt = self.build_prompt(history, roster);
        let messages = vec![ChatMessage::user(prompt)];

        for attempt in 1..=self.max_attempts {
            let response = self
                .backend
                .chat(
                    &messages,
                    Some(GenerateOptions {
                        temperature: Some(0.0),
                        ..Default::default()
                    }),
                )
                .await?;

            if let Some(index) = Self::parse_choice(&response.content, roster) {
                if let Some(fallback) = &mut self.fallback {
                    fallback.sync_to(index, roster.len());
                }
                return Ok(index);
            }

            if self.debug {
                eprintln!(
                    "DEBUG: Selector attempt {}/{} returned unrecognized speaker: {:?}",
                    attempt, self.max_attempts, response.content
                );
            }
        }

        match &mut self.fallback {
            Some(fallback) => {
                if self.debug {
                    eprintln!("DEBUG: Selector retry budget exhausted, falling back to round-robin");
                }
                fallback.next_index(roster.len())
            }
            None => Err(TroikaError::selection(format!(
                "No valid speaker after {} attempts and no fallback configured",
                self.max_attempts
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::history::Message;
    use crate::llm::BackendResponse;
    use crate::core::ToolDefinition;

    fn roster() -> Vec<ParticipantDescriptor> {
        vec![
            ParticipantDescriptor::new("writer", "writes tests"),
            ParticipantDescriptor::new("verifier", "verifies tests"),
            ParticipantDescriptor::new("summary", "summarizes"),
        ]
    }

    /// Backend that replays a fixed list of replies
    struct ScriptedBackend {
        replies: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: std::sync::Mutex::new(
                    replies.iter().rev().map(|s| s.to_string()).collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: Option<GenerateOptions>,
        ) -> Result<BackendResponse> {
            let mut replies = self.replies.lock().unwrap();
            let reply = replies.pop().unwrap_or_else(|| "no reply".to_string());
            Ok(BackendResponse::text(reply))
        }

        async fn chat_with_tools(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolDefinition],
            options: Option<GenerateOptions>,
        ) -> Result<BackendResponse> {
            self.chat(messages, options).await
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_round_robin_cycles_with_period_n() {
        let roster = roster();
        let mut selector = RoundRobinSelector::new(true);
        let history = History::new();

        let mut picks = Vec::new();
        for _ in 0..6 {
            picks.push(selector.select(&history, &roster).await.unwrap());
        }
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[tokio::test]
    async fn test_round_robin_never_repeats_when_restricted() {
        let roster = roster();
        let mut selector = RoundRobinSelector::new(false);
        let history = History::new();

        let mut last = None;
        for _ in 0..10 {
            let pick = selector.select(&history, &roster).await.unwrap();
            assert_ne!(Some(pick), last);
            last = Some(pick);
        }
    }

    #[tokio::test]
    async fn test_round_robin_single_roster_repeat_forbidden() {
        let roster = vec![ParticipantDescriptor::new("only", "alone")];
        let mut selector = RoundRobinSelector::new(false);
        let history = History::new();

        assert_eq!(selector.select(&history, &roster).await.unwrap(), 0);
        assert!(selector.select(&history, &roster).await.is_err());
    }

    #[tokio::test]
    async fn test_model_selector_empty_history_picks_first() {
        let backend = Arc::new(ScriptedBackend::new(&[]));
        let mut selector = ModelSelector::new(backend, "{participants}");
        let pick = selector.select(&History::new(), &roster()).await.unwrap();
        assert_eq!(pick, 0);
    }

    #[tokio::test]
    async fn test_model_selector_accepts_exact_name() {
        let backend = Arc::new(ScriptedBackend::new(&["verifier"]));
        let mut selector = ModelSelector::new(backend, "{history}");
        let mut history = History::seeded("task");
        history.append(Message::new("writer", "draft"));

        let pick = selector.select(&history, &roster()).await.unwrap();
        assert_eq!(pick, 1);
    }

    #[tokio::test]
    async fn test_model_selector_accepts_unique_substring() {
        let backend = Arc::new(ScriptedBackend::new(&["I pick the summary agent."]));
        let mut selector = ModelSelector::new(backend, "{history}");
        let history = History::seeded("task");

        // Non-empty history so the backend is consulted
        let pick = selector.select(&history, &roster()).await.unwrap();
        assert_eq!(pick, 2);
    }

    #[tokio::test]
    async fn test_model_selector_falls_back_after_three_bad_replies() {
        let backend = Arc::new(ScriptedBackend::new(&["nobody", "nobody", "nobody"]));
        let mut selector = ModelSelector::new(backend, "{history}").max_attempts(3);
        let history = History::seeded("task");

        // Fallback cursor continues the cycle rather than failing the run
        let pick = selector.select(&history, &roster()).await.unwrap();
        assert_eq!(pick, 0);
    }

    #[tokio::test]
    async fn test_model_selector_errors_without_fallback() {
        let backend = Arc::new(ScriptedBackend::new(&["nobody", "nobody", "nobody"]));
        let mut selector = ModelSelector::new(backend, "{history}")
            .max_attempts(3)
            .with_fallback(false);
        let history = History::seeded("task");

        assert!(matches!(
            selector.select(&history, &roster()).await,
            Err(TroikaError::Selection(_))
        ));
    }

    #[test]
    fn test_parse_choice_rejects_ambiguity() {
        let roster = roster();
        assert!(ModelSelector::parse_choice("writer or verifier", &roster).is_none());
        assert_eq!(ModelSelector::parse_choice(" \"writer\" ", &roster), Some(0));
        assert!(ModelSelector::parse_choice("unknown", &roster).is_none());
    }
}
