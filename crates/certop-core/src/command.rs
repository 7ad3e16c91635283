//! Bounded external command execution
//!
//! Every external process the control plane touches (the provisioning tool,
//! certificate inspection, system probes) runs through [`CommandRunner`].
//! Commands are built from explicit argument vectors - no shell
//! interpretation - and every invocation carries a hard timeout. Failures of
//! any kind are folded into [`CommandOutcome`]; this boundary never panics
//! and never propagates an error to its callers.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

/// Default hard bound for a single command invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Uniform result of one external command invocation.
///
/// Either a completed execution (exit code and captured streams) or a
/// timeout/spawn-failure variant - never partially filled.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
}

impl CommandOutcome {
    fn timed_out(timeout: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: format!("command execution timed out after {}s", timeout.as_secs()),
            exit_code: None,
            error: Some("timeout".to_string()),
        }
    }

    fn failed_to_launch(message: String) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: message.clone(),
            exit_code: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `program` with `args`, killing the child when `timeout` elapses.
    pub async fn run(
        &self,
        program: impl AsRef<Path>,
        args: &[&str],
        timeout: Duration,
    ) -> CommandOutcome {
        self.run_with_env(program, args, timeout, &HashMap::new())
            .await
    }

    /// Run a command with additional environment variables injected into the
    /// child process. The parent environment is inherited; `envs` entries are
    /// layered on top.
    pub async fn run_with_env(
        &self,
        program: impl AsRef<Path>,
        args: &[&str],
        timeout: Duration,
        envs: &HashMap<String, String>,
    ) -> CommandOutcome {
        let program = program.as_ref();
        debug!(
            program = %program.display(),
            ?args,
            timeout_secs = timeout.as_secs(),
            "executing command"
        );

        let mut cmd = Command::new(program);
        cmd.args(args).envs(envs).kill_on_drop(true);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(program = %program.display(), error = %e, "failed to launch command");
                return CommandOutcome::failed_to_launch(e.to_string());
            }
            Err(_) => {
                warn!(
                    program = %program.display(),
                    timeout_secs = timeout.as_secs(),
                    "command timed out"
                );
                return CommandOutcome::timed_out(timeout);
            }
        };

        CommandOutcome {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = CommandRunner::new();
        let outcome = runner
            .run("echo", &["hello"], DEFAULT_COMMAND_TIMEOUT)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.stdout.trim(), "hello");
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn reports_nonzero_exit_as_failure() {
        let runner = CommandRunner::new();
        let outcome = runner
            .run("sh", &["-c", "echo oops >&2; exit 3"], DEFAULT_COMMAND_TIMEOUT)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stderr.trim(), "oops");
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn enforces_timeout_instead_of_hanging() {
        let runner = CommandRunner::new();
        let outcome = runner
            .run("sleep", &["5"], Duration::from_millis(200))
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("timeout"));
        assert!(outcome.stdout.is_empty());
        assert!(outcome.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn captures_launch_failure() {
        let runner = CommandRunner::new();
        let outcome = runner
            .run("/nonexistent/certop-test-binary", &[], DEFAULT_COMMAND_TIMEOUT)
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(outcome.stderr, outcome.error.clone().unwrap());
    }

    #[tokio::test]
    async fn injects_environment_variables() {
        let runner = CommandRunner::new();
        let mut envs = HashMap::new();
        envs.insert("CERTOP_TEST_VAR".to_string(), "injected".to_string());

        let outcome = runner
            .run_with_env(
                "sh",
                &["-c", "printf '%s' \"$CERTOP_TEST_VAR\""],
                DEFAULT_COMMAND_TIMEOUT,
                &envs,
            )
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.stdout, "injected");
    }
}
