//! End-to-end conversation flow tests with scripted participants
//!
//! Exercises the full select → act → append → check cycle without any
//! network backend.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use troika::chat::{
    CancelToken, ConversationLoop, History, LoopState, Message, ModelSelector,
    RoundRobinSelector, RunStatus, TextMentionTermination,
};
use troika::core::{ChatMessage, Result, ToolDefinition, TroikaError};
use troika::llm::{BackendResponse, ChatBackend, GenerateOptions};
use troika::team::{Participant, ParticipantDescriptor, Team};

/// Participant that replays fixed responses in order
struct Scripted {
    descriptor: ParticipantDescriptor,
    replies: Mutex<Vec<String>>,
}

impl Scripted {
    fn boxed(name: &str, replies: &[&str]) -> Box<dyn Participant> {
        Box::new(Self {
            descriptor: ParticipantDescriptor::new(name, format!("{} (scripted)", name)),
            replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
        })
    }
}

#[async_trait]
impl Participant for Scripted {
    fn descriptor(&self) -> &ParticipantDescriptor {
        &self.descriptor
    }

    async fn act(&self, _history: &History) -> Result<Message> {
        let mut replies = self.replies.lock().unwrap();
        let content = replies
            .pop()
            .ok_or_else(|| TroikaError::participant(&self.descriptor.name, "script exhausted"))?;
        Ok(Message::new(&self.descriptor.name, content))
    }
}

/// Participant failing with a backend-unreachable error on every turn
struct Failing {
    descriptor: ParticipantDescriptor,
}

impl Failing {
    fn boxed(name: &str) -> Box<dyn Participant> {
        Box::new(Self {
            descriptor: ParticipantDescriptor::new(name, "always fails"),
        })
    }
}

#[async_trait]
impl Participant for Failing {
    fn descriptor(&self) -> &ParticipantDescriptor {
        &self.descriptor
    }

    async fn act(&self, _history: &History) -> Result<Message> {
        Err(TroikaError::backend("backend unreachable"))
    }
}

/// Chat backend replaying fixed replies, used to drive the model selector
struct ScriptedBackend {
    replies: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn shared(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
        })
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
        Ok(BackendResponse::text(
            replies.pop().unwrap_or_else(|| "???".to_string()),
        ))
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
async fn round_robin_run_stops_on_termination_token() {
    let team = Team::new(
        vec![
            Scripted::boxed("writer", &["draft tests"]),
            Scripted::boxed("verifier", &["looks good TERMINATE"]),
            Scripted::boxed("summary", &["unused"]),
        ],
        Box::new(RoundRobinSelector::new(true)),
        Box::new(TextMentionTermination::new("TERMINATE")),
    )
    .unwrap();

    let mut run_loop = ConversationLoop::new(team);
    let mut history = History::seeded("Write tests for a fibonacci function");

    let status = run_loop.run(&mut history, &CancelToken::new()).await.unwrap();

    // Two turns: writer then verifier; the summary agent never speaks
    assert_eq!(status, RunStatus::Terminated);
    assert_eq!(history.len(), 3);

    let speakers: Vec<&str> = history.iter().map(|m| m.speaker.as_str()).collect();
    assert_eq!(speakers, vec!["user", "writer", "verifier"]);
}

#[tokio::test]
async fn failing_participant_fails_the_run_with_seed_only_history() {
    let team = Team::new(
        vec![Failing::boxed("writer"), Scripted::boxed("verifier", &[])],
        Box::new(RoundRobinSelector::new(true)),
        Box::new(TextMentionTermination::new("TERMINATE")),
    )
    .unwrap();

    let mut run_loop = ConversationLoop::new(team);
    let mut history = History::seeded("task");

    let err = run_loop
        .run(&mut history, &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TroikaError::Backend(_)));
    assert_eq!(err.to_string(), "Backend error: backend unreachable");
    assert_eq!(run_loop.state(), LoopState::Failed);
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn model_selector_routes_speakers_by_name() {
    // Coordinator sends the draft through verification before letting the
    // writer finish
    let backend = ScriptedBackend::shared(&["writer", "verifier", "writer"]);

    let team = Team::new(
        vec![
            Scripted::boxed("writer", &["first draft", "final draft TERMINATE"]),
            Scripted::boxed("verifier", &["needs another pass"]),
        ],
        Box::new(ModelSelector::new(backend, "{history}")),
        Box::new(TextMentionTermination::new("TERMINATE")),
    )
    .unwrap();

    let mut run_loop = ConversationLoop::new(team);
    let mut history = History::seeded("task");

    let status = run_loop.run(&mut history, &CancelToken::new()).await.unwrap();

    assert_eq!(status, RunStatus::Terminated);
    let speakers: Vec<&str> = history.iter().map(|m| m.speaker.as_str()).collect();
    assert_eq!(speakers, vec!["user", "writer", "verifier", "writer"]);
}

#[tokio::test]
async fn model_selector_fallback_keeps_the_run_alive() {
    // The coordinator never produces a valid name; the fallback cursor
    // must keep the conversation moving instead of failing the run.
    let backend = ScriptedBackend::shared(&[]);

    let team = Team::new(
        vec![
            Scripted::boxed("writer", &["draft"]),
            Scripted::boxed("verifier", &["TERMINATE"]),
        ],
        Box::new(ModelSelector::new(backend, "{history}").max_attempts(3)),
        Box::new(TextMentionTermination::new("TERMINATE")),
    )
    .unwrap();

    let mut run_loop = ConversationLoop::new(team);
    let mut history = History::seeded("task");

    let status = run_loop.run(&mut history, &CancelToken::new()).await.unwrap();
    assert_eq!(status, RunStatus::Terminated);
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn cancelled_run_never_reports_terminated() {
    struct Stalled {
        descriptor: ParticipantDescriptor,
    }

    #[async_trait]
    impl Participant for Stalled {
        fn descriptor(&self) -> &ParticipantDescriptor {
            &self.descriptor
        }

        async fn act(&self, _history: &History) -> Result<Message> {
            std::future::pending().await
        }
    }

    let team = Team::new(
        vec![Box::new(Stalled {
            descriptor: ParticipantDescriptor::new("writer", "stalls"),
        }) as Box<dyn Participant>],
        Box::new(RoundRobinSelector::new(true)),
        Box::new(TextMentionTermination::new("TERMINATE")),
    )
    .unwrap();

    let mut run_loop = ConversationLoop::new(team);
    let mut history = History::seeded("task");
    let cancel = CancelToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let status = run_loop.run(&mut history, &cancel).await.unwrap();
    assert_eq!(status, RunStatus::Cancelled);
    assert_eq!(run_loop.state(), LoopState::Cancelled);
}
