//! Shared subprocess management.
//!
//! Provides [`run_command`], the spawn + capture + deadline logic used for
//! every build and run stage. Toolchains build a [`tokio::process::Command`]
//! for their runtime and the pipeline delegates the actual process handling
//! here.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use super::executor::ExecutionError;

/// How long output readers may keep going once the process group is gone.
const OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// Read buffer size per stream.
const CHUNK_BYTES: usize = 64 * 1024;

/// Bounds applied to one child process.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    /// Wall-clock deadline measured from spawn.
    pub timeout: Duration,
    /// Bytes kept per stream. Output past this is drained and discarded.
    pub max_output_bytes: usize,
}

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Exited on its own. Signal deaths are reported as `128 + signal`.
    Exited(i32),
    /// Killed because the deadline fired first.
    TimedOut,
}

/// Captured result of one child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ProcessStatus,
    pub elapsed: Duration,
}

/// Spawn `cmd`, capture stdout/stderr concurrently, and enforce the deadline.
///
/// The child runs in its own process group, and the whole group receives
/// `SIGKILL` once the leader exits or the deadline fires. Background
/// processes started by the program cannot outlive it or keep the output
/// pipes open. Dropping the returned future mid-run kills the group too.
pub async fn run_command(
    cmd: &mut Command,
    limits: &RunLimits,
) -> Result<ProcessOutput, ExecutionError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .process_group(0);

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|source| ExecutionError::Spawn { program, source })?;
    // Declared after `child` so it drops first: the group is killed before
    // the leader can be reaped and its pid reused.
    let mut group = ProcessGroup::new(child.id());

    // Drain both pipes in their own tasks so a chatty child never blocks on a
    // full pipe while we wait for it.
    let mut stdout_task = tokio::spawn(read_stream(child.stdout.take(), limits.max_output_bytes));
    let mut stderr_task = tokio::spawn(read_stream(child.stderr.take(), limits.max_output_bytes));

    let exited = tokio::time::timeout(limits.timeout, group.leader_exit()).await;
    let elapsed = start.elapsed();

    // The leader is not reaped yet, so its pid still names this group.
    group.kill();

    let status = match exited {
        Ok(Ok(())) => match child.wait().await {
            Ok(status) => ProcessStatus::Exited(exit_code(status)),
            Err(e) => {
                stdout_task.abort();
                stderr_task.abort();
                return Err(ExecutionError::Wait(e));
            }
        },
        Ok(Err(e)) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(ExecutionError::Wait(e));
        }
        Err(_elapsed) => {
            // Reap the leader so it does not linger as a zombie.
            let _ = child.wait().await;
            ProcessStatus::TimedOut
        }
    };

    let (stdout, stdout_truncated) = collect(&mut stdout_task).await;
    let (stderr, stderr_truncated) = collect(&mut stderr_task).await;
    if stdout_truncated || stderr_truncated {
        tracing::warn!(
            limit = limits.max_output_bytes,
            stdout_truncated,
            stderr_truncated,
            "Process output exceeded capture limit and was truncated"
        );
    }

    Ok(ProcessOutput {
        stdout,
        stderr,
        status,
        elapsed,
    })
}

/// Process group led by a spawned child.
///
/// Sends `SIGKILL` to the group on drop unless [`ProcessGroup::kill`] already
/// did. Must be killed before the leader is reaped.
struct ProcessGroup {
    leader: Option<u32>,
    armed: bool,
}

impl ProcessGroup {
    fn new(leader: Option<u32>) -> Self {
        Self {
            leader,
            armed: true,
        }
    }

    /// Resolve once the leader has exited, leaving it unreaped.
    async fn leader_exit(&self) -> std::io::Result<()> {
        let Some(pid) = self.leader else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || wait_without_reaping(pid))
            .await
            .map_err(std::io::Error::other)?
    }

    fn kill(&mut self) {
        if std::mem::take(&mut self.armed) {
            kill_process_group(self.leader);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Block until `pid` exits. `WNOWAIT` leaves it as a zombie for tokio to reap.
fn wait_without_reaping(pid: u32) -> std::io::Result<()> {
    loop {
        // SAFETY: siginfo_t is plain old data, so all-zeroes is a valid value;
        // waitid only writes into the struct we own.
        let rc = unsafe {
            let mut info: libc::siginfo_t = std::mem::zeroed();
            libc::waitid(
                libc::P_PID,
                pid as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Read an entire stream, keeping at most `limit` bytes.
///
/// Keeps reading past the limit so the writer never stalls. Returns the kept
/// bytes and whether anything was dropped.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>, limit: usize) -> (Vec<u8>, bool) {
    let mut buf = Vec::new();
    let mut truncated = false;
    let Some(mut reader) = handle else {
        return (buf, truncated);
    };

    let mut chunk = vec![0u8; CHUNK_BYTES];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buf.len());
                if n > room {
                    truncated = true;
                }
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Output stream read failed");
                break;
            }
        }
    }
    (buf, truncated)
}

/// Wait a bounded time for a reader task and decode what it captured.
async fn collect(task: &mut JoinHandle<(Vec<u8>, bool)>) -> (String, bool) {
    match tokio::time::timeout(OUTPUT_GRACE, &mut *task).await {
        Ok(Ok((bytes, truncated))) => (String::from_utf8_lossy(&bytes).into_owned(), truncated),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Output reader task failed");
            (String::new(), false)
        }
        Err(_) => {
            // Something outside the process group still holds the pipe.
            task.abort();
            tracing::warn!("Output reader did not finish after process exit");
            (String::new(), true)
        }
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

/// Send `SIGKILL` to every process in the child's group.
fn kill_process_group(pgid: Option<u32>) {
    let Some(pgid) = pgid.and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return;
    };
    // SAFETY: killpg has no memory-safety preconditions; ESRCH (group already
    // gone) is expected and ignored.
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
}
