//! Python code executor
//!
//! Runs model-supplied Python inside a bounded working directory with a
//! timeout. This is the only side channel through which tool-invoking
//! participants mutate external state.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::core::{Result, ToolDefinition, ToolResult, TroikaError};

/// Tool name offered to the backend
pub const RUN_PYTHON_TOOL: &str = "run_python";

/// Executes Python snippets in a fixed working directory
pub struct PythonExecutor {
    work_dir: PathBuf,
    timeout: Duration,
}

impl PythonExecutor {
    /// Create an executor bound to `work_dir`
    pub fn new(work_dir: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            timeout,
        }
    }

    /// The working directory all executions run in
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Check if a python3 interpreter is installed
    pub async fn is_available() -> bool {
        Command::new("python3")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run a Python snippet, capturing stdout and stderr.
    ///
    /// A non-zero exit becomes a failed `ToolResult`, not an error; the
    /// output is fed back to the model either way. Timeouts and spawn
    /// failures are errors.
    pub async fn run_code(&self, code: &str) -> Result<ToolResult> {
        let mut cmd = Command::new("python3");
        cmd.arg("-c")
            .arg(code)
            .current_dir(&self.work_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // On timeout the output future is dropped; the interpreter must
            // die with it or it keeps mutating the working directory.
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                TroikaError::tool(format!(
                    "Execution timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TroikaError::tool("python3 not found on PATH")
                } else {
                    TroikaError::tool(format!("Failed to run python3: {}", e))
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = if stderr.is_empty() {
            stdout.into_owned()
        } else if stdout.is_empty() {
            stderr.into_owned()
        } else {
            format!("{}\n{}", stdout, stderr)
        };

        if output.status.success() {
            Ok(ToolResult::success(RUN_PYTHON_TOOL, combined))
        } else {
            Ok(ToolResult::failure(
                RUN_PYTHON_TOOL,
                format!(
                    "Exit code {}:\n{}",
                    output.status.code().unwrap_or(-1),
                    combined
                ),
            ))
        }
    }

    /// Tool definition advertised to the backend
    pub fn definition() -> ToolDefinition {
        ToolDefinition::function(
            RUN_PYTHON_TOOL,
            "Execute a Python snippet in the project working directory and return its output. \
             Use this to run tests and check that code behaves as expected.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "The Python code to execute"
                    }
                },
                "required": ["code"]
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_code_captures_stdout() {
        if !PythonExecutor::is_available().await {
            eprintln!("python3 not installed, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let executor = PythonExecutor::new(dir.path(), Duration::from_secs(10));
        let result = executor.run_code("print('hello from tool')").await.unwrap();

        assert!(result.success);
        assert!(result.output.contains("hello from tool"));
    }

    #[tokio::test]
    async fn test_run_code_reports_failure_as_result() {
        if !PythonExecutor::is_available().await {
            eprintln!("python3 not installed, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let executor = PythonExecutor::new(dir.path(), Duration::from_secs(10));
        let result = executor
            .run_code("raise SystemExit('boom')")
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.output.contains("boom"));
    }

    #[tokio::test]
    async fn test_run_code_times_out() {
        if !PythonExecutor::is_available().await {
            eprintln!("python3 not installed, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let executor = PythonExecutor::new(dir.path(), Duration::from_millis(200));
        let result = executor
            .run_code("import time; time.sleep(1); open('late.txt', 'w').write('x')")
            .await;

        assert!(matches!(result, Err(TroikaError::ToolExecution(_))));

        // The interpreter is killed with the timed-out future; it must not
        // linger and write into the working directory afterwards.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!dir.path().join("late.txt").exists());
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        if !PythonExecutor::is_available().await {
            eprintln!("python3 not installed, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let executor = PythonExecutor::new(dir.path(), Duration::from_secs(10));
        executor
            .run_code("open('marker.txt', 'w').write('x')")
            .await
            .unwrap();

        assert!(dir.path().join("marker.txt").exists());
    }

    #[test]
    fn test_definition_schema() {
        let definition = PythonExecutor::definition();
        assert_eq!(definition.function.name, RUN_PYTHON_TOOL);
        assert!(definition.function.parameters["required"]
            .as_array()
            .unwrap()
            .iter()
            .any(|v| v == "code"));
    }
}
