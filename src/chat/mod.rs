//! Chat module - transcript, turn coordination, and the conversation loop
//!
//! Contains the append-only history, termination policies, turn selectors,
//! and the state machine driving one run.

pub mod history;
pub mod run_loop;
pub mod selector;
pub mod termination;

pub use history::{History, Message, USER_SPEAKER};
pub use run_loop::{CancelToken, ConversationLoop, LoopState, MessageObserver, RunStatus};
pub use selector::{ModelSelector, RoundRobinSelector, TurnSelector};
pub use termination::{
    EitherTermination, MaxMessageTermination, TerminationPolicy, TextMentionTermination,
};
