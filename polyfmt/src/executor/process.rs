//! Subprocess formatting.
//!
//! One run owns one child process and three tasks:
//!
//! 1. a writer that pushes the snippet into the child's stdin and then closes it,
//! 2. a drainer collecting stdout (the candidate output),
//! 3. a drainer collecting stderr (the diagnostic).
//!
//! The tasks run while the child's exit races a deadline (and an optional
//! cancellation token). Because reading never waits on writing, a tool that
//! starts printing before it has consumed all of its input cannot deadlock the
//! run.
//!
//! On unix the child leads its own process group. Whatever way the run ends,
//! the whole group is killed, so helpers the tool left running in the
//! background neither outlive the call nor hold its pipes open.

use super::StrategyExecutor;
use crate::language::FormatStrategy;
use crate::outcome::ExecutionOutcome;
use async_trait::async_trait;
use std::{
    io,
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, ChildStdin, Command},
};
use tokio_util::sync::CancellationToken;

/// Default wall-clock budget for one run.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for a killed child to be reaped, and for the pipes to close
/// once the child has exited.
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Detail reported when the caller cancels a run.
pub const CANCELLED_DETAIL: &str = "formatter cancelled";

/// Executor for [`FormatStrategy::ExternalProcess`].
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

enum Finish {
    Exited(io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pipes `code` through `command args...` and interprets its exit status.
    pub async fn run_command(&self, code: &str, command: &str, args: &[String]) -> ExecutionOutcome {
        self.run_with_cancel(code, command, args, &CancellationToken::new())
            .await
    }

    /// Same as [`run_command`](Self::run_command), but `cancel` terminates the
    /// child through the same path as a timeout.
    pub async fn run_with_cancel(
        &self,
        code: &str,
        command: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let start_time = Instant::now();

        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to spawn formatter '{}': {}", command, e);
                return ExecutionOutcome::tool_unavailable(e.to_string());
            }
        };
        // Captured now: `Child::id` is gone once the child has been reaped.
        let group = child.id();
        tracing::info!(
            "Spawned formatter '{}' {:?} (pid {:?}, {} bytes of input)",
            command,
            args,
            group,
            code.len()
        );

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            terminate(&mut child, group, command).await;
            return ExecutionOutcome::tool_unavailable("formatter stdio pipes were not captured");
        };

        let mut writer = tokio::spawn(write_input(stdin, code.as_bytes().to_vec()));
        let mut stdout_task = tokio::spawn(drain(stdout));
        let mut stderr_task = tokio::spawn(drain(stderr));

        // Only the child's own exit is raced against the deadline. `timeout`
        // saturates instead of overflowing for very long budgets.
        let finish = tokio::select! {
            biased;

            _ = cancel.cancelled() => Finish::Cancelled,
            result = tokio::time::timeout(self.timeout, child.wait()) => match result {
                Ok(status) => Finish::Exited(status),
                Err(_) => Finish::TimedOut,
            },
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        match finish {
            Finish::Exited(status) => {
                // Background helpers may still hold the pipes; they die with the tool.
                kill_process_group(group, command);
                let collected = tokio::time::timeout(REAP_TIMEOUT, async {
                    tokio::join!(&mut writer, &mut stdout_task, &mut stderr_task)
                })
                .await;
                let Ok((written, stdout, stderr)) = collected else {
                    tracing::warn!(
                        "Output pipes of '{}' stayed open {}ms after it exited",
                        command,
                        REAP_TIMEOUT.as_millis()
                    );
                    writer.abort();
                    stdout_task.abort();
                    stderr_task.abort();
                    return ExecutionOutcome::tool_failure(
                        -1,
                        "formatter output was not closed after the formatter exited",
                    );
                };
                if let Err(e) = flatten(written) {
                    tracing::debug!("Writing input to '{}' failed: {}", command, e);
                }
                interpret(command, status, flatten(stdout), flatten(stderr), duration_ms)
            }
            Finish::TimedOut => {
                tracing::warn!(
                    "Formatter '{}' timed out after {}ms (limit {}ms), killing it",
                    command,
                    duration_ms,
                    self.timeout.as_millis()
                );
                terminate(&mut child, group, command).await;
                writer.abort();
                stdout_task.abort();
                stderr_task.abort();
                ExecutionOutcome::Timeout
            }
            Finish::Cancelled => {
                tracing::info!("Formatter '{}' cancelled after {}ms", command, duration_ms);
                terminate(&mut child, group, command).await;
                writer.abort();
                stdout_task.abort();
                stderr_task.abort();
                ExecutionOutcome::ToolFailure {
                    exit_code: -1,
                    detail: CANCELLED_DETAIL.to_string(),
                }
            }
        }
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_TIMEOUT)
    }
}

#[async_trait]
impl StrategyExecutor for ProcessExecutor {
    async fn run(&self, code: &str, strategy: &FormatStrategy) -> ExecutionOutcome {
        match strategy {
            FormatStrategy::ExternalProcess { command, args } => {
                self.run_command(code, command, args).await
            }
            FormatStrategy::Library { profile } => ExecutionOutcome::tool_unavailable(format!(
                "process executor cannot run library profile '{profile}'"
            )),
        }
    }
}

async fn write_input(mut stdin: ChildStdin, input: Vec<u8>) -> io::Result<()> {
    let result = match stdin.write_all(&input).await {
        Ok(()) => stdin.flush().await,
        Err(e) => Err(e),
    };
    // Dropping the handle closes the pipe, which is the tool's end-of-input.
    drop(stdin);
    match result {
        // The tool exited without reading everything; its exit status decides.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).await?;
    Ok(buffer)
}

fn flatten<T>(joined: Result<io::Result<T>, tokio::task::JoinError>) -> io::Result<T> {
    joined.unwrap_or_else(|e| Err(io::Error::other(e)))
}

/// Sends SIGKILL to every process in the group led by the spawned child.
#[cfg(unix)]
fn kill_process_group(group: Option<u32>, command: &str) {
    let Some(pgid) = group.and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal. A group with no members left yields
    // ESRCH, which is the common case for well-behaved tools.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::debug!("Kill of process group of '{}' failed: {}", command, err);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_group: Option<u32>, _command: &str) {}

/// Kills the child with its process group and waits (bounded) for it to be
/// reaped.
async fn terminate(child: &mut Child, group: Option<u32>, command: &str) {
    kill_process_group(group, command);
    if let Err(e) = child.start_kill() {
        // Already exited and reaped; nothing left to kill.
        tracing::debug!("Kill of '{}' skipped: {}", command, e);
    }
    match tokio::time::timeout(REAP_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) => tracing::debug!("Formatter '{}' reaped: {}", command, status),
        Ok(Err(e)) => tracing::warn!("Failed to reap formatter '{}': {}", command, e),
        Err(_) => tracing::warn!(
            "Formatter '{}' did not exit within {}ms of being killed",
            command,
            REAP_TIMEOUT.as_millis()
        ),
    }
}

fn interpret(
    command: &str,
    status: io::Result<ExitStatus>,
    stdout: io::Result<Vec<u8>>,
    stderr: io::Result<Vec<u8>>,
    duration_ms: u64,
) -> ExecutionOutcome {
    let status = match status {
        Ok(status) => status,
        Err(e) => {
            tracing::warn!("Failed to wait for formatter '{}': {}", command, e);
            return ExecutionOutcome::tool_failure(-1, format!("failed to wait for formatter: {e}"));
        }
    };
    let stdout = match stdout {
        Ok(bytes) => bytes,
        Err(e) => {
            return ExecutionOutcome::tool_failure(-1, format!("failed to read formatter output: {e}"));
        }
    };
    let stderr = stderr
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
        .unwrap_or_else(|e| format!("failed to read formatter diagnostics: {e}"));

    let exit_code = status.code().unwrap_or(-1);
    tracing::info!(
        "Formatter '{}' exited with code {} after {}ms",
        command,
        exit_code,
        duration_ms
    );

    if status.success() {
        ExecutionOutcome::success(String::from_utf8_lossy(&stdout).to_string())
    } else {
        ExecutionOutcome::tool_failure(exit_code, stderr)
    }
}
