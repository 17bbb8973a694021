#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Bounded execution of untrusted shell scripts.
//!
//! Every run gets a fresh child process in its own process group, a cleared
//! environment, and a scratch working directory that is removed afterwards.
//! The child's exit races a deadline; whichever finishes first decides the
//! result, and the whole group is killed before output is collected.

use std::{
    ffi::OsString,
    process::{ExitStatus, Stdio},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use nix::{
    sys::signal::{Signal, killpg},
    unistd::Pid,
};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::{Child, Command},
    task::JoinHandle,
    time::timeout,
};
use uuid::Uuid;

use crate::{
    config::Config,
    constants::{
        DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SANDBOX_PATH, DEFAULT_SHELL, DRAIN_GRACE_MS,
        KILLED_EXIT_CODE,
    },
};

/// Captured result of one sandboxed process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Contents written to stdout.
    pub stdout:    String,
    /// Contents written to stderr.
    pub stderr:    String,
    /// Exit code, or [`KILLED_EXIT_CODE`] when there is no real one.
    pub exit_code: i32,
    /// Whether the deadline fired before the process exited.
    pub timed_out: bool,
    /// Whether either stream exceeded the capture limit.
    #[serde(default)]
    pub truncated: bool,
}

impl RunResult {
    /// Builds the result reported when the process could not be started.
    pub fn launch_failure(err: &anyhow::Error) -> Self {
        Self {
            stdout:    String::new(),
            stderr:    format!("{err:#}"),
            exit_code: KILLED_EXIT_CODE,
            timed_out: false,
            truncated: false,
        }
    }

    /// True when the exit code is the sentinel rather than a real status.
    pub fn killed(&self) -> bool {
        self.exit_code == KILLED_EXIT_CODE
    }

    /// True when the process exited on its own with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Something that can run a shell script against stdin under a deadline.
///
/// Implementations never fail: launch errors and timeouts are reported
/// through [`RunResult`].
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Runs `script`, feeding it `stdin`, and waits at most `deadline`.
    async fn run(&self, script: &str, stdin: &str, deadline: Duration) -> RunResult;
}

/// Kills the child's whole process group when dropped, so nothing outlives a
/// run even if the caller stops polling mid-way.
struct GroupGuard(Option<Pid>);

impl GroupGuard {
    /// Tracks the process group led by `child`.
    fn new(child: &Child) -> Self {
        Self(
            child
                .id()
                .and_then(|id| i32::try_from(id).ok())
                .map(Pid::from_raw),
        )
    }

    /// Sends `SIGKILL` to every process left in the group.
    fn kill(&self) {
        if let Some(pgid) = self.0 {
            // ESRCH just means the group is already gone.
            let _ = killpg(pgid, Signal::SIGKILL);
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Incrementally drains one output pipe into a bounded buffer.
struct Capture {
    /// Bytes captured so far.
    buf:       Arc<Mutex<Vec<u8>>>,
    /// Set once bytes had to be discarded.
    truncated: Arc<AtomicBool>,
    /// Reader task.
    task:      JoinHandle<()>,
}

impl Capture {
    /// Starts draining `pipe`, keeping at most `limit` bytes.
    fn spawn<R>(pipe: R, limit: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let truncated = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn({
            let buf = Arc::clone(&buf);
            let truncated = Arc::clone(&truncated);
            async move {
                let mut pipe = pipe;
                let mut chunk = vec![0u8; 8 * 1024];
                loop {
                    let n = match pipe.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    // Keep reading past the limit so the writer never blocks on a
                    // full pipe.
                    let mut held = buf.lock().unwrap_or_else(PoisonError::into_inner);
                    let room = limit.saturating_sub(held.len());
                    if n > room {
                        truncated.store(true, Ordering::Relaxed);
                    }
                    held.extend_from_slice(&chunk[..n.min(room)]);
                }
            }
        });

        Self {
            buf,
            truncated,
            task,
        }
    }

    /// Waits up to `grace` for the reader to hit EOF, then returns whatever was
    /// captured.
    async fn finish(mut self, grace: Duration) -> (String, bool) {
        if timeout(grace, &mut self.task).await.is_err() {
            // Something outside the group still holds the pipe open.
            self.task.abort();
        }
        let bytes = std::mem::take(&mut *self.buf.lock().unwrap_or_else(PoisonError::into_inner));
        (
            String::from_utf8_lossy(&bytes).into_owned(),
            self.truncated.load(Ordering::Relaxed),
        )
    }
}

/// Runs scripts as local subprocesses with a restricted environment.
#[derive(Debug, Clone)]
pub struct SandboxRunner {
    /// Shell binary, resolved against `path_env` at launch.
    shell:            OsString,
    /// The only environment variable handed to scripts.
    path_env:         String,
    /// Per-stream capture limit.
    max_output_bytes: usize,
    /// How long readers may drain after the process is gone.
    drain_grace:      Duration,
}

impl Default for SandboxRunner {
    fn default() -> Self {
        Self {
            shell:            OsString::from(DEFAULT_SHELL),
            path_env:         DEFAULT_SANDBOX_PATH.to_string(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            drain_grace:      Duration::from_millis(DRAIN_GRACE_MS),
        }
    }
}

impl SandboxRunner {
    /// Creates a runner with the default shell, `PATH` and capture limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner from the shell, `PATH` and capture limit in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::default()
            .with_shell(config.shell())
            .with_path_env(config.sandbox_path())
            .with_max_output_bytes(config.max_output_bytes())
    }

    /// Sets the shell used to interpret scripts.
    pub fn with_shell(mut self, shell: impl Into<OsString>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Sets the `PATH` exposed to scripts. The shell is also looked up here.
    pub fn with_path_env(mut self, path_env: impl Into<String>) -> Self {
        self.path_env = path_env.into();
        self
    }

    /// Sets the per-stream capture limit in bytes.
    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// Launches the script and races it against `deadline`. Errors are
    /// launch failures only; everything after spawn is reported as data.
    async fn execute(&self, script: &str, stdin: &str, deadline: Duration) -> Result<RunResult> {
        let scratch = tempfile::Builder::new()
            .prefix("quizgrade-run-")
            .tempdir()
            .context("failed to create scratch directory")?;

        let shell = which::which_in(&self.shell, Some(&self.path_env), scratch.path())
            .with_context(|| {
                format!(
                    "cannot find shell `{}` on sandbox PATH `{}`",
                    self.shell.to_string_lossy(),
                    self.path_env
                )
            })?;

        let mut cmd = Command::new(&shell);
        cmd.arg("-c")
            .arg(script)
            .env_clear()
            .env("PATH", &self.path_env)
            .current_dir(scratch.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", shell.display()))?;
        let group = GroupGuard::new(&child);

        if let Some(mut handle) = child.stdin.take() {
            let bytes = stdin.as_bytes().to_vec();
            tokio::spawn(async move {
                if !bytes.is_empty() {
                    let _ = handle.write_all(&bytes).await;
                }
                let _ = handle.shutdown().await;
            });
        }

        let stdout = Capture::spawn(
            child.stdout.take().context("missing stdout pipe")?,
            self.max_output_bytes,
        );
        let stderr = Capture::spawn(
            child.stderr.take().context("missing stderr pipe")?,
            self.max_output_bytes,
        );

        let waited = match timeout(deadline, child.wait()).await {
            Ok(Ok(status)) => Waited::Exited(status),
            Ok(Err(err)) => Waited::Failed(err),
            Err(_) => Waited::TimedOut(deadline),
        };

        // Either way, nothing in the group may outlive the run.
        group.kill();
        if !matches!(waited, Waited::Exited(_)) {
            let _ = child.start_kill();
            let _ = timeout(self.drain_grace, child.wait()).await;
        }

        let (stdout, stderr) = tokio::join!(
            stdout.finish(self.drain_grace),
            stderr.finish(self.drain_grace)
        );

        Ok(waited.into_result(stdout, stderr))
    }
}

/// How waiting on a spawned child ended.
#[derive(Debug)]
enum Waited {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// Waiting failed after a successful spawn.
    Failed(std::io::Error),
    /// The deadline fired first.
    TimedOut(Duration),
}

impl Waited {
    /// Combines the wait outcome with the captured `(text, truncated)` streams.
    fn into_result(self, stdout: (String, bool), stderr: (String, bool)) -> RunResult {
        let (stdout, stdout_truncated) = stdout;
        let (mut stderr, stderr_truncated) = stderr;

        let note = match &self {
            Waited::Exited(_) => None,
            Waited::Failed(err) => Some(format!("[failed to wait on script process: {err}]")),
            Waited::TimedOut(deadline) => {
                Some(format!("[timed out after {} ms]", deadline.as_millis()))
            }
        };
        if let Some(note) = note {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&note);
        }

        let exit_code = match &self {
            Waited::Exited(status) => status.code().unwrap_or(KILLED_EXIT_CODE),
            Waited::Failed(_) | Waited::TimedOut(_) => KILLED_EXIT_CODE,
        };

        RunResult {
            stdout,
            stderr,
            exit_code,
            timed_out: matches!(self, Waited::TimedOut(_)),
            truncated: stdout_truncated || stderr_truncated,
        }
    }
}

#[async_trait]
impl ScriptRunner for SandboxRunner {
    async fn run(&self, script: &str, stdin: &str, deadline: Duration) -> RunResult {
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        let result = match self.execute(script, stdin, deadline).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(%run_id, "sandbox launch failed: {err:#}");
                RunResult::launch_failure(&err)
            }
        };

        tracing::debug!(
            %run_id,
            script_len = script.len(),
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            truncated = result.truncated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sandbox run finished"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;

    #[test]
    fn wait_failure_keeps_captured_output() {
        let err = std::io::Error::other("reaped elsewhere");
        let result = Waited::Failed(err).into_result(
            ("partial\n".to_string(), false),
            ("warning".to_string(), true),
        );

        assert_eq!(result.stdout, "partial\n");
        assert_eq!(
            result.stderr,
            "warning\n[failed to wait on script process: reaped elsewhere]"
        );
        assert_eq!(result.exit_code, KILLED_EXIT_CODE);
        assert!(!result.timed_out);
        assert!(result.truncated);
    }

    #[test]
    fn exit_status_and_timeout_are_reported() {
        let exited = Waited::Exited(ExitStatus::from_raw(3 << 8))
            .into_result(("out".to_string(), false), (String::new(), false));
        assert_eq!(exited.exit_code, 3);
        assert_eq!(exited.stderr, "");

        let killed = Waited::TimedOut(Duration::from_millis(50))
            .into_result((String::new(), false), ("err\n".to_string(), false));
        assert!(killed.timed_out);
        assert_eq!(killed.exit_code, KILLED_EXIT_CODE);
        assert_eq!(killed.stderr, "err\n[timed out after 50 ms]");
    }
}
