//! Termination policies
//!
//! Stateless predicates over the transcript deciding when a run is complete.

use crate::chat::history::History;

/// Predicate deciding when the conversation ends.
///
/// Policies are pure: repeated evaluation on the same history must return
/// the same result.
pub trait TerminationPolicy: Send + Sync {
    /// Return true if the run should stop
    fn should_stop(&self, history: &History) -> bool;
}

/// Stops when the last message contains a sentinel token.
///
/// The match is a case-sensitive substring check anywhere in the text.
/// An empty history never terminates.
pub struct TextMentionTermination {
    token: String,
}

impl TextMentionTermination {
    /// Create a policy watching for the given sentinel token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The sentinel token this policy watches for
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl TerminationPolicy for TextMentionTermination {
    fn should_stop(&self, history: &History) -> bool {
        history
            .last()
            .map(|m| m.content.contains(&self.token))
            .unwrap_or(false)
    }
}

/// Stops once the transcript holds at least `max` messages.
pub struct MaxMessageTermination {
    max: usize,
}

impl MaxMessageTermination {
    /// Create a policy capping the transcript at `max` messages
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl TerminationPolicy for MaxMessageTermination {
    fn should_stop(&self, history: &History) -> bool {
        history.len() >= self.max
    }
}

/// Stops when either of two policies stops.
pub struct EitherTermination {
    first: Box<dyn TerminationPolicy>,
    second: Box<dyn TerminationPolicy>,
}

impl EitherTermination {
    /// Combine two policies with OR semantics
    pub fn new(first: Box<dyn TerminationPolicy>, second: Box<dyn TerminationPolicy>) -> Self {
        Self { first, second }
    }
}

impl TerminationPolicy for EitherTermination {
    fn should_stop(&self, history: &History) -> bool {
        self.first.should_stop(history) || self.second.should_stop(history)
    }
}
