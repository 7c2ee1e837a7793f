//! Run controller
//!
//! Top-level entry that seeds the transcript, drives the conversation loop
//! to a terminal state, maintains the run log, and reports a diff of the
//! working directory afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

use crate::chat::{CancelToken, ConversationLoop, History, RunStatus};
use crate::core::{Config, Result, TroikaError};
use crate::llm::OpenAiClient;
use crate::team::build_team;

/// Result of one completed (non-failed) run
#[derive(Debug)]
pub struct RunOutcome {
    /// How the run reached its terminal state
    pub status: RunStatus,
    /// Full transcript, seed included
    pub history: History,
    /// Number of participant turns taken
    pub turns: usize,
}

/// Drives one run end to end
pub struct RunController {
    config: Config,
    code_dir: PathBuf,
    log_file: Option<PathBuf>,
}

impl RunController {
    /// Create a controller for the given working directory
    pub fn new(config: Config, code_dir: impl Into<PathBuf>, log_file: Option<PathBuf>) -> Self {
        Self {
            config,
            code_dir: code_dir.into(),
            log_file,
        }
    }

    /// Join prior history and the new task with a blank-line separator,
    /// task last. With no prior history the task stands alone.
    pub fn seed_text(prior: Option<&str>, task: &str) -> String {
        match prior {
            Some(prior) if !prior.is_empty() => format!("{}\n\n{}", prior, task),
            _ => task.to_string(),
        }
    }

    /// Run the team on `task` until the loop reaches a terminal state.
    ///
    /// On termination the task is appended to the run log so later runs are
    /// seeded with it, and a working-directory diff is printed. On failure
    /// the triggering error is surfaced unchanged.
    pub async fn run(&self, task: &str, cancel: CancelToken) -> Result<RunOutcome> {
        self.config.validate()?;

        if !self.code_dir.is_dir() {
            return Err(TroikaError::config(format!(
                "Working directory {} does not exist",
                self.code_dir.display()
            )));
        }

        let prior = self.read_run_log()?;
        let seed = Self::seed_text(prior.as_deref(), task);
        let mut history = History::seeded(seed);
        let seeded_len = history.len();

        let backend = Arc::new(OpenAiClient::from_config(&self.config));
        let team = build_team(&self.config, backend, &self.code_dir)?;

        let mut run_loop = ConversationLoop::new(team).with_observer(Box::new(|message| {
            println!("---------- {} ----------", message.speaker);
            println!("{}\n", message.content);
        }));

        let status = run_loop.run(&mut history, &cancel).await?;

        if status == RunStatus::Terminated {
            self.append_run_log(task)?;
        }

        self.report_diff().await;

        Ok(RunOutcome {
            status,
            turns: history.len() - seeded_len,
            history,
        })
    }

    /// Read the whole run log, if one is configured and present
    fn read_run_log(&self) -> Result<Option<String>> {
        let Some(path) = &self.log_file else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let trimmed = content.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    /// Append the completed task to the run log. Tasks are separated by a
    /// blank line so the read-back text matches the seeding contract.
    fn append_run_log(&self, task: &str) -> Result<()> {
        let Some(path) = &self.log_file else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut content = fs::read_to_string(path).unwrap_or_default();
        if !content.is_empty() {
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content.push('\n');
        }
        content.push_str(task);
        content.push('\n');
        fs::write(path, content)?;
        Ok(())
    }

    /// Print a `git diff` of the working directory. Best effort: a missing
    /// git binary or a non-repository directory is reported, never fatal.
    async fn report_diff(&self) {
        let diff = Command::new("git")
            .arg("-C")
            .arg(&self.code_dir)
            .args(["--no-pager", "diff"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match diff {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                if stdout.trim().is_empty() {
                    println!("\nNo code changes detected.\n");
                } else {
                    println!("\n--- Code diff ---\n");
                    println!("{}", stdout);
                }
            }
            Err(e) => {
                eprintln!("Could not display diff: {}", e);
            }
        }
    }
}

/// Read run-log seeding for display or inspection without running
pub fn seeded_task_from_log(log_file: &Path, task: &str) -> Result<String> {
    if !log_file.exists() {
        return Ok(task.to_string());
    }
    let content = fs::read_to_string(log_file)?;
    let trimmed = content.trim();
    Ok(RunController::seed_text(
        (!trimmed.is_empty()).then_some(trimmed),
        task,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_text_joins_with_blank_line() {
        assert_eq!(RunController::seed_text(Some("A"), "B"), "A\n\nB");
        assert_eq!(RunController::seed_text(None, "B"), "B");
        assert_eq!(RunController::seed_text(Some(""), "B"), "B");
    }

    #[test]
    fn test_run_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("conversation.log");
        let controller = RunController::new(
            Config::default(),
            dir.path().to_path_buf(),
            Some(log.clone()),
        );

        controller.append_run_log("A").unwrap();
        controller.append_run_log("B").unwrap();

        // Two completed runs then a third task yield "A\n\nB\n\nC"
        let seeded = seeded_task_from_log(&log, "C").unwrap();
        assert_eq!(seeded, "A\n\nB\n\nC");
    }

    #[test]
    fn test_append_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("nested").join("runs.log");
        let controller = RunController::new(
            Config::default(),
            dir.path().to_path_buf(),
            Some(log.clone()),
        );

        controller.append_run_log("task").unwrap();
        assert_eq!(fs::read_to_string(&log).unwrap(), "task\n");
    }

    #[test]
    fn test_read_run_log_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let controller = RunController::new(
            Config::default(),
            dir.path().to_path_buf(),
            Some(dir.path().join("missing.log")),
        );
        assert!(controller.read_run_log().unwrap().is_none());
    }
}
