//! Conversation loop
//!
//! Drives repeated select → act → append → check cycles over a team until
//! the termination policy fires, a participant or selector fails, or the
//! run is cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::chat::history::{History, Message};
use crate::core::Result;
use crate::team::Team;

/// Phase of the conversation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No turn started yet
    Init,
    /// Choosing the next speaker
    Selecting,
    /// Waiting on the selected participant
    Acting,
    /// Evaluating the termination policy
    Checking,
    /// The termination policy fired; terminal
    Terminated,
    /// A participant or selector error ended the run; terminal
    Failed,
    /// The cancel token fired; terminal
    Cancelled,
}

impl LoopState {
    /// Whether no further turns can occur
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoopState::Terminated | LoopState::Failed | LoopState::Cancelled
        )
    }
}

/// How a run reached a terminal state without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The termination policy fired
    Terminated,
    /// The cancel token fired
    Cancelled,
}

/// Cooperative cancellation signal observable by an in-flight turn
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// Create a fresh, untriggered token
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation; wakes any waiting turn
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation is requested
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);

        // Register the waiter before re-checking the flag, otherwise a
        // cancel() landing between the check and the await is lost.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Callback invoked for each message as it is appended
pub type MessageObserver = Box<dyn Fn(&Message) + Send + Sync>;

/// Drives a team through the conversation state machine.
///
/// Exactly one participant acts per turn and the history grows by exactly
/// one message per turn; participants never write to the history directly.
pub struct ConversationLoop {
    team: Team,
    state: LoopState,
    observer: Option<MessageObserver>,
}

impl ConversationLoop {
    /// Create a loop over an assembled team
    pub fn new(team: Team) -> Self {
        Self {
            team,
            state: LoopState::Init,
            observer: None,
        }
    }

    /// Stream each appended message to the given callback
    pub fn with_observer(mut self, observer: MessageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Current phase of the state machine
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run the loop to a terminal state.
    ///
    /// Returns the terminal status, or the first selection/participant
    /// error unchanged. No retries happen at this layer. On error the
    /// history holds every message appended before the failure.
    pub async fn run(&mut self, history: &mut History, cancel: &CancelToken) -> Result<RunStatus> {
        self.state = LoopState::Selecting;
        let mut next_speaker = 0usize;

        loop {
            match self.state {
                LoopState::Init | LoopState::Selecting => {
                    if cancel.is_cancelled() {
                        self.state = LoopState::Cancelled;
                        continue;
                    }

                    match self.team.select_next(history).await {
                        Ok(index) => {
                            next_speaker = index;
                            self.state = LoopState::Acting;
                        }
                        Err(e) => {
                            self.state = LoopState::Failed;
                            return Err(e);
                        }
                    }
                }
                LoopState::Acting => {
                    let participant = self.team.participant(next_speaker);

                    let acted = tokio::select! {
                        result = participant.act(history) => Some(result),
                        () = cancel.cancelled() => None,
                    };

                    match acted {
                        Some(Ok(message)) => {
                            let appended = history.append(message);
                            if let Some(observer) = &self.observer {
                                observer(appended);
                            }
                            self.state = LoopState::Checking;
                        }
                        Some(Err(e)) => {
                            self.state = LoopState::Failed;
                            return Err(e);
                        }
                        None => {
                            self.state = LoopState::Cancelled;
                        }
                    }
                }
                LoopState::Checking => {
                    self.state = if self.team.should_stop(history) {
                        LoopState::Terminated
                    } else {
                        LoopState::Selecting
                    };
                }
                LoopState::Terminated => return Ok(RunStatus::Terminated),
                LoopState::Cancelled => return Ok(RunStatus::Cancelled),
                // Failed returns at the transition site above
                LoopState::Failed => unreachable!("loop resumed after failure"),
            }
        }
    }
}
