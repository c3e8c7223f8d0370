use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use crate::tools::builtin::str_param;
use crate::tools::registry::Tool;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs model-generated text as a shell command with the process's full
/// privileges. This is a documented trust boundary of the system, not an
/// oversight; the only guard is the hard timeout.
pub struct SystemCommandTool;

#[async_trait]
impl Tool for SystemCommandTool {
    fn name(&self) -> &str {
        "system_command"
    }

    fn description(&self) -> &str {
        "Execute system commands. Usage: command='your_command'"
    }

    async fn execute(&self, params: &Map<String, Value>) -> String {
        let command = str_param(params, "command");

        let mut cmd = shell_command(&command);
        match tokio::time::timeout(COMMAND_TIMEOUT, cmd.output()).await {
            Err(_) => {
                warn!(command = %command, "command timed out");
                format!("Command '{command}' timed out after 30 seconds.")
            }
            Ok(Err(e)) => format!("Error executing '{command}': {e}"),
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let text = if stdout.is_empty() {
                    String::from_utf8_lossy(&output.stderr).into_owned()
                } else {
                    stdout.into_owned()
                };
                format!("Command: {command}\nOutput:\n{text}")
            }
        }
    }
}

#[cfg(windows)]
fn shell_command(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.args(["/C", command]).kill_on_drop(true);
    cmd
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.args(["-c", command]).kill_on_drop(true);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(command: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("command".to_string(), Value::String(command.to_string()));
        map
    }

    #[tokio::test]
    async fn captures_stdout() {
        let out = SystemCommandTool.execute(&params("echo hello")).await;
        assert_eq!(out, "Command: echo hello\nOutput:\nhello\n");
    }

    #[tokio::test]
    async fn falls_back_to_stderr_when_stdout_empty() {
        let out = SystemCommandTool.execute(&params("echo oops 1>&2")).await;
        assert!(out.starts_with("Command: echo oops 1>&2\nOutput:\n"), "{out}");
        assert!(out.contains("oops"), "{out}");
    }

    #[tokio::test]
    async fn failing_command_still_returns_text() {
        let out = SystemCommandTool.execute(&params("definitely-not-a-command-xyz")).await;
        // The shell reports the failure on stderr; the turn must get text back.
        assert!(out.starts_with("Command: definitely-not-a-command-xyz\nOutput:\n"), "{out}");
    }
}
