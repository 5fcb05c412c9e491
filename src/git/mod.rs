pub mod types;

pub use types::{CommandOutput, GitCommand};

use async_trait::async_trait;
use std::io::Read;
use std::process::Stdio;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::pr::Targets;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Could not run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to collect output of `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited non-zero. `output` holds its combined
    /// stdout and stderr, to be relayed to the user as-is.
    #[error("`{command}` failed")]
    Failed { command: String, output: Vec<u8> },
}

/// Runs external commands to completion and captures what they print.
///
/// The real implementation shells out; tests substitute a fake that records
/// the argument vectors it receives.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` once, wait for it to exit, and return its output.
    /// Only a failure to start the process is an `Err`; a non-zero exit is
    /// reported through `CommandOutput::success`.
    async fn execute(&self, command: &GitCommand) -> Result<CommandOutput, GitError>;
}

/// Executor backed by real processes found on `PATH`.
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, command: &GitCommand) -> Result<CommandOutput, GitError> {
        let spawn_error = |source| GitError::Spawn {
            command: command.to_string(),
            source,
        };
        let wait_error = |source| GitError::Wait {
            command: command.to_string(),
            source,
        };

        // stdout and stderr share one pipe so the output keeps the order it
        // was written in.
        let (mut reader, writer) = std::io::pipe().map_err(spawn_error)?;
        let writer_err = writer.try_clone().map_err(spawn_error)?;

        // The Command is dropped at the end of this statement, closing our
        // copies of the write end so the reader sees EOF when the child exits.
        let mut child = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(writer_err)
            .spawn()
            .map_err(spawn_error)?;

        let reading = tokio::task::spawn_blocking(move || {
            let mut output = Vec::new();
            reader.read_to_end(&mut output).map(|_| output)
        });

        let status = child.wait().await.map_err(wait_error)?;
        let output = reading
            .await
            .map_err(|e| wait_error(std::io::Error::other(e)))?
            .map_err(wait_error)?;
        debug!(%status, output_bytes = output.len(), "command exited");

        Ok(CommandOutput {
            success: status.success(),
            output,
        })
    }
}

/// `git fetch {remote_url} pull/{id}/head:{branch}`
pub fn fetch_command(program: &str, targets: &Targets) -> GitCommand {
    GitCommand::new(
        program,
        ["fetch".to_string(), targets.remote_url.clone(), targets.refspec()],
    )
}

/// `git checkout {branch}`
pub fn checkout_command(program: &str, targets: &Targets) -> GitCommand {
    GitCommand::new(program, ["checkout".to_string(), targets.branch_name.clone()])
}

/// Run a single command, turning a non-zero exit into `GitError::Failed`.
pub async fn run<E>(executor: &E, command: &GitCommand) -> Result<(), GitError>
where
    E: CommandExecutor + ?Sized,
{
    info!("Running: {}", command);
    let result = executor.execute(command).await?;

    if !result.success {
        return Err(GitError::Failed {
            command: command.to_string(),
            output: result.output,
        });
    }

    Ok(())
}

/// Fetch the pull request head into the target branch, then check it out.
///
/// The checkout only runs once the fetch has succeeded. If the checkout
/// fails the fetched branch stays behind in the repository.
#[instrument(level = "debug", skip_all, fields(remote = %targets.remote_url, branch = %targets.branch_name))]
pub async fn checkout_pull_request<E>(executor: &E, program: &str, targets: &Targets) -> Result<(), GitError>
where
    E: CommandExecutor + ?Sized,
{
    run(executor, &fetch_command(program, targets)).await?;
    run(executor, &checkout_command(program, targets)).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every command and replies from a script. Once the script runs
    /// out every command succeeds with no output.
    #[derive(Default)]
    pub(crate) struct FakeExecutor {
        calls: Mutex<Vec<Vec<String>>>,
        replies: Mutex<VecDeque<Result<CommandOutput, std::io::ErrorKind>>>,
    }

    impl FakeExecutor {
        pub(crate) fn reply(self, success: bool, output: &str) -> Self {
            self.replies.lock().unwrap().push_back(Ok(CommandOutput {
                success,
                output: output.as_bytes().to_vec(),
            }));
            self
        }

        pub(crate) fn fail_to_spawn(self, kind: std::io::ErrorKind) -> Self {
            self.replies.lock().unwrap().push_back(Err(kind));
            self
        }

        pub(crate) fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandExecutor for FakeExecutor {
        async fn execute(&self, command: &GitCommand) -> Result<CommandOutput, GitError> {
            let mut argv = vec![command.program.clone()];
            argv.extend(command.args.iter().cloned());
            self.calls.lock().unwrap().push(argv);

            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(output)) => Ok(output),
                Some(Err(kind)) => Err(GitError::Spawn {
                    command: command.to_string(),
                    source: std::io::Error::from(kind),
                }),
                None => Ok(CommandOutput {
                    success: true,
                    output: Vec::new(),
                }),
            }
        }
    }

    fn targets() -> Targets {
        Targets {
            remote_url: "https://github.com/acme/widget.git".to_string(),
            branch_name: "pull17".to_string(),
            pull_id: "17".to_string(),
        }
    }

    #[test]
    fn test_fetch_command_args() {
        let cmd = fetch_command("git", &targets());
        assert_eq!(cmd.program, "git");
        assert_eq!(cmd.args, vec!["fetch", "https://github.com/acme/widget.git", "pull/17/head:pull17"]);
    }

    #[test]
    fn test_checkout_command_args() {
        let cmd = checkout_command("/usr/local/bin/git", &targets());
        assert_eq!(cmd.program, "/usr/local/bin/git");
        assert_eq!(cmd.args, vec!["checkout", "pull17"]);
    }

    #[tokio::test]
    async fn test_checkout_runs_fetch_then_checkout() {
        let executor = FakeExecutor::default();
        checkout_pull_request(&executor, "git", &targets()).await.unwrap();
        assert_eq!(
            executor.calls(),
            vec![
                vec!["git", "fetch", "https://github.com/acme/widget.git", "pull/17/head:pull17"],
                vec!["git", "checkout", "pull17"],
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_skips_checkout() {
        let executor = FakeExecutor::default().reply(false, "fatal: couldn't find remote ref pull/17/head\n");
        let err = checkout_pull_request(&executor, "git", &targets()).await.unwrap_err();

        match err {
            GitError::Failed { command, output } => {
                assert_eq!(command, "git fetch https://github.com/acme/widget.git pull/17/head:pull17");
                assert_eq!(output, b"fatal: couldn't find remote ref pull/17/head\n");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_checkout_is_reported() {
        let executor = FakeExecutor::default()
            .reply(true, "")
            .reply(false, "error: pathspec 'pull17' did not match\n");
        let err = checkout_pull_request(&executor, "git", &targets()).await.unwrap_err();
        assert!(matches!(err, GitError::Failed { ref command, .. } if command == "git checkout pull17"));
        assert_eq!(executor.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_spawn_failure_stops_run() {
        let executor = FakeExecutor::default().fail_to_spawn(std::io::ErrorKind::NotFound);
        let err = checkout_pull_request(&executor, "git", &targets()).await.unwrap_err();
        assert!(matches!(err, GitError::Spawn { .. }));
        assert_eq!(executor.calls().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_executor_interleaves_stdout_and_stderr() {
        let script = "echo out-1; echo err-2 >&2; echo out-3; exit 1";
        let cmd = GitCommand::new("sh", ["-c".to_string(), script.to_string()]);
        let result = SystemExecutor.execute(&cmd).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.output, b"out-1\nerr-2\nout-3\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_executor_success() {
        let cmd = GitCommand::new("sh", ["-c".to_string(), "echo fetched".to_string()]);
        let result = SystemExecutor.execute(&cmd).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, b"fetched\n");
    }

    #[tokio::test]
    async fn test_system_executor_reports_missing_program() {
        let cmd = GitCommand::new("git-checkout-pr-no-such-program", ["--version".to_string()]);
        let err = SystemExecutor.execute(&cmd).await.unwrap_err();
        assert!(matches!(err, GitError::Spawn { .. }));
    }
}
