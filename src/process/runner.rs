use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use super::{CommandOutcome, Invocation, ProcessRunner};

/// How long to wait for pipe readers after a timed-out child has been killed.
/// Grandchildren can keep the pipes open; their output is abandoned.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

const READ_CHUNK: usize = 8 * 1024;

/// Runs commands as real OS processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: Invocation) -> CommandOutcome {
        let command_line = invocation.to_string();
        tracing::debug!(command = %command_line, cwd = ?invocation.cwd, "Running command");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandOutcome {
                    command: command_line,
                    spawn_error: Some(describe_spawn_error(&invocation.program, &e)),
                    ..Default::default()
                };
            }
        };

        let limit = invocation.max_output_bytes;
        let stdout_task = spawn_reader(child.stdout.take(), limit);
        let stderr_task = spawn_reader(child.stderr.take(), limit);

        let mut timed_out = false;
        let waited = match invocation.timeout {
            Some(deadline) => {
                let bounded = tokio::time::timeout(deadline, child.wait()).await;
                match bounded {
                    Ok(result) => Some(result),
                    Err(_) => {
                        timed_out = true;
                        tracing::warn!(
                            command = %command_line,
                            timeout_ms = deadline.as_millis() as u64,
                            "Command timed out, killing it"
                        );
                        if let Err(e) = child.kill().await {
                            tracing::warn!(
                                command = %command_line,
                                error = %e,
                                "Failed to kill child"
                            );
                        }
                        None
                    }
                }
            }
            None => Some(child.wait().await),
        };

        let grace = timed_out.then_some(DRAIN_GRACE);
        let (stdout, stdout_truncated) = collect(stdout_task, grace).await;
        let (stderr, stderr_truncated) = collect(stderr_task, grace).await;

        let mut outcome = CommandOutcome {
            command: command_line,
            stdout,
            stderr,
            timed_out,
            truncated: stdout_truncated || stderr_truncated,
            ..Default::default()
        };

        match waited {
            Some(Ok(status)) => outcome.exit_code = status.code(),
            Some(Err(e)) => outcome.spawn_error = Some(format!("Failed waiting for process: {e}")),
            None => {}
        }

        outcome
    }
}

fn describe_spawn_error(program: &str, error: &io::Error) -> String {
    match error.kind() {
        io::ErrorKind::NotFound => format!("spawn {program} ENOENT: command not found"),
        io::ErrorKind::PermissionDenied => format!("spawn {program} EACCES: {error}"),
        _ => format!("spawn {program} failed: {error}"),
    }
}

type ReadResult = io::Result<(Vec<u8>, bool)>;

fn spawn_reader<R>(reader: Option<R>, limit: usize) -> Option<JoinHandle<ReadResult>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    reader.map(|r| tokio::spawn(read_bounded(r, limit)))
}

/// Read a stream to EOF, keeping at most `limit` bytes.
///
/// The remainder is drained and discarded so the child never blocks on a
/// full pipe.
async fn read_bounded<R>(mut reader: R, limit: usize) -> ReadResult
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }

    Ok((kept, truncated))
}

async fn collect(task: Option<JoinHandle<ReadResult>>, grace: Option<Duration>) -> (String, bool) {
    let Some(task) = task else {
        return (String::new(), false);
    };

    let joined = match grace {
        Some(grace) => {
            let abort = task.abort_handle();
            match tokio::time::timeout(grace, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    abort.abort();
                    return (String::new(), false);
                }
            }
        }
        None => task.await,
    };

    match joined {
        Ok(Ok((bytes, truncated))) => (String::from_utf8_lossy(&bytes).into_owned(), truncated),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Failed reading process output");
            (String::new(), false)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Output reader task failed");
            (String::new(), false)
        }
    }
}
