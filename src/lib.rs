//! Troika - a three-agent test-writing team runner
//!
//! Coordinates a test-writing assistant, a verification assistant, and a
//! summary participant in a round-robin or coordinator-driven turn order
//! until a termination phrase appears in the conversation.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Chat backend abstraction with an OpenAI-compatible client
//! - **Chat**: Transcript, termination policies, turn selectors, and the
//!   conversation loop state machine
//! - **Team**: Participant variants, system prompts, and team assembly
//! - **Tools**: Python code executor for tool-invoking participants
//! - **Runner**: Top-level run controller with run log and diff reporting
//!
//! # Usage
//!
//! ```rust,no_run
//! use troika::chat::CancelToken;
//! use troika::core::Config;
//! use troika::runner::RunController;
//!
//! #[tokio::main]
//! async fn main() {
//!     let controller = RunController::new(Config::load(), ".", None);
//!     let outcome = controller
//!         .run("Write tests for a fibonacci function", CancelToken::new())
//!         .await
//!         .unwrap();
//!     println!("finished after {} turns", outcome.turns);
//! }
//! ```

pub mod chat;
pub mod core;
pub mod llm;
pub mod runner;
pub mod team;
pub mod tools;

// Re-export commonly used items
pub use crate::chat::{CancelToken, ConversationLoop, History, Message, RunStatus};
pub use crate::core::{Config, Result, TroikaError};
pub use crate::runner::{RunController, RunOutcome};
pub use crate::team::Team;
