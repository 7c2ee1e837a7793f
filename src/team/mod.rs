//! Team module - participants and team assembly
//!
//! A team is the fixed set of participants plus the active turn selector and
//! termination policy for one run. The team owns no mutable conversation
//! state; everything mutable lives in the history.

pub mod participant;
pub mod prompts;

pub use participant::{
    AssistantParticipant, HumanParticipant, Participant, ParticipantDescriptor,
};

use std::path::Path;
use std::sync::Arc;

use crate::chat::history::History;
use crate::chat::selector::{ModelSelector, RoundRobinSelector, TurnSelector};
use crate::chat::termination::{
    EitherTermination, MaxMessageTermination, TerminationPolicy, TextMentionTermination,
};
use crate::core::{Config, Result, SelectorMode, TroikaError};
use crate::llm::ChatBackend;
use crate::tools::PythonExecutor;

/// A fixed set of participants with a selector and termination policy
pub struct Team {
    participants: Vec<Box<dyn Participant>>,
    roster: Vec<ParticipantDescriptor>,
    selector: Box<dyn TurnSelector>,
    termination: Box<dyn TerminationPolicy>,
}

impl Team {
    /// Assemble a team; fails on an empty roster or duplicate names
    pub fn new(
        participants: Vec<Box<dyn Participant>>,
        selector: Box<dyn TurnSelector>,
        termination: Box<dyn TerminationPolicy>,
    ) -> Result<Self> {
        if participants.is_empty() {
            return Err(TroikaError::config("A team needs at least one participant"));
        }

        let roster: Vec<ParticipantDescriptor> = participants
            .iter()
            .map(|p| p.descriptor().clone())
            .collect();

        for (i, descriptor) in roster.iter().enumerate() {
            if roster[..i].iter().any(|d| d.name == descriptor.name) {
                return Err(TroikaError::config(format!(
                    "Duplicate participant name '{}'",
                    descriptor.name
                )));
            }
        }

        Ok(Self {
            participants,
            roster,
            selector,
            termination,
        })
    }

    /// Descriptors of all members, in roster order
    pub fn roster(&self) -> &[ParticipantDescriptor] {
        &self.roster
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the team has no members (never true for an assembled team)
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Get a participant by roster index
    pub fn participant(&self, index: usize) -> &dyn Participant {
        self.participants[index].as_ref()
    }

    /// Ask the selector for the next speaker
    pub async fn select_next(&mut self, history: &History) -> Result<usize> {
        let index = self.selector.select(history, &self.roster).await?;
        if index >= self.participants.len() {
            return Err(TroikaError::selection(format!(
                "Selector returned out-of-roster index {}",
                index
            )));
        }
        Ok(index)
    }

    /// Evaluate the termination policy
    pub fn should_stop(&self, history: &History) -> bool {
        self.termination.should_stop(history)
    }
}

/// Build the default three-member test-writing team.
///
/// Writer and verifier are model-backed and may run Python in `code_dir`;
/// the summary agent is a human proxy. Selector and termination come from
/// the run configuration.
pub fn build_team(
    config: &Config,
    backend: Arc<dyn ChatBackend>,
    code_dir: &Path,
) -> Result<Team> {
    let executor = config.executor.enabled.then(|| {
        Arc::new(PythonExecutor::new(
            code_dir,
            std::time::Duration::from_secs(config.executor.timeout_secs),
        ))
    });

    let writer_descriptor = ParticipantDescriptor::new(
        prompts::TEST_WRITER_NAME,
        "writes tests in Python for the requested functionality",
    )
    .with_system_prompt(prompts::TEST_WRITER_SYSTEM_PROMPT);

    let mut writer = AssistantParticipant::new(writer_descriptor, Arc::clone(&backend))
        .max_tool_turns(config.executor.max_tool_turns)
        .debug(config.run.debug);
    if let Some(executor) = &executor {
        writer = writer.with_executor(Arc::clone(executor));
    }

    let verifier_descriptor = ParticipantDescriptor::new(
        prompts::VERIFIER_NAME,
        "evaluates the written tests, checking that they run and work correctly",
    )
    .with_system_prompt(prompts::VERIFIER_SYSTEM_PROMPT);

    let mut verifier = AssistantParticipant::new(verifier_descriptor, Arc::clone(&backend))
        .max_tool_turns(config.executor.max_tool_turns)
        .debug(config.run.debug);
    if let Some(executor) = &executor {
        verifier = verifier.with_executor(Arc::clone(executor));
    }

    let summary = HumanParticipant::new(ParticipantDescriptor::new(
        prompts::SUMMARY_AGENT_NAME,
        prompts::SUMMARY_AGENT_DESCRIPTION,
    ));

    let selector: Box<dyn TurnSelector> = match config.run.selector {
        SelectorMode::RoundRobin => Box::new(RoundRobinSelector::new(
            config.run.allow_repeated_speaker,
        )),
        SelectorMode::Model => Box::new(
            ModelSelector::new(Arc::clone(&backend), prompts::SELECTOR_PROMPT)
                .max_attempts(config.run.max_selector_attempts)
                .with_fallback(config.run.selector_fallback)
                .debug(config.run.debug),
        ),
    };

    let termination: Box<dyn TerminationPolicy> = Box::new(EitherTermination::new(
        Box::new(TextMentionTermination::new(
            config.run.termination_token.clone(),
        )),
        Box::new(MaxMessageTermination::new(config.run.max_messages)),
    ));

    let participants: Vec<Box<dyn Participant>> =
        vec![Box::new(writer), Box::new(verifier), Box::new(summary)];
    Team::new(participants, selector, termination)
}
