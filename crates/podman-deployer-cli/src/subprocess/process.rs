//! Process management for backend subprocesses

use crate::error::{BackendError, Result};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Captured result of a command that ran to completion
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (None if terminated by a signal)
    pub code: Option<i32>,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Check if the command exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Render a command line for logs and error messages
pub(crate) fn display_command(binary: &Path, args: &[String]) -> String {
    let mut line = binary.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

fn command(binary: &Path, args: &[String]) -> Command {
    let mut cmd = Command::new(binary);
    cmd.args(args);
    // Dropping the future (e.g. on cancellation) must take the child with it
    cmd.kill_on_drop(true);
    cmd
}

/// Run a command to completion, capturing stdout and stderr
pub async fn run_to_completion(binary: &Path, args: &[String]) -> Result<CommandOutput> {
    let line = display_command(binary, args);
    debug!(command = %line, "running backend command");

    let output = command(binary, args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| BackendError::from_spawn(binary, line.clone(), e))?;

    let output = CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };
    debug!(command = %line, code = ?output.code, "backend command finished");
    Ok(output)
}

/// Handle to a launched container process
///
/// The child stays owned here rather than in a detached task, so dropping
/// the last clone kills it (`kill_on_drop`) and [`terminate`] can reap it.
///
/// [`terminate`]: ContainerProcess::terminate
#[derive(Clone)]
pub struct ContainerProcess {
    pid: Option<u32>,
    child: Arc<Mutex<Child>>,
}

impl ContainerProcess {
    fn new(child: Child) -> Self {
        Self {
            pid: child.id(),
            child: Arc::new(Mutex::new(child)),
        }
    }

    /// Process id captured at spawn time
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Check if the process is still running
    pub async fn is_alive(&self) -> bool {
        let mut child = self.child.lock().await;
        child.try_wait().ok().flatten().is_none()
    }

    /// Kill the process immediately and reap it
    pub async fn kill(&self) -> Result<()> {
        let mut child = self.child.lock().await;
        child.kill().await?;
        Ok(())
    }

    /// Stop the process and reap it
    ///
    /// Expects the caller to have closed stdin already. Waits up to `grace`
    /// for the process to exit on its own, then sends `SIGTERM` (which
    /// `podman run` forwards to the container) and waits up to `grace`
    /// again, then kills it.
    pub async fn terminate(&self, grace: Duration) -> Result<ExitStatus> {
        let mut child = self.child.lock().await;

        if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
            return Ok(log_exit(self.pid, status?));
        }

        if let Some(pid) = child.id()
            && send_sigterm(pid)
            && let Ok(status) = tokio::time::timeout(grace, child.wait()).await
        {
            return Ok(log_exit(self.pid, status?));
        }

        warn!(pid = self.pid, "container did not stop in time, killing");
        child.kill().await?;
        let status = child.wait().await?;
        Ok(log_exit(self.pid, status))
    }
}

impl std::fmt::Debug for ContainerProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerProcess")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

fn log_exit(pid: Option<u32>, status: ExitStatus) -> ExitStatus {
    if status.success() {
        info!(pid, "container process exited");
    } else {
        warn!(pid, code = ?status.code(), "container process exited abnormally");
    }
    status
}

/// Ask the process to stop; returns whether the signal was delivered
#[cfg(unix)]
fn send_sigterm(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    debug!(pid, "container still running after stdin closed, sending SIGTERM");
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            debug!(pid, error = %e, "failed to signal container process");
            false
        }
    }
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) -> bool {
    false
}

/// A running process with its stdin and stdout handed to the caller
///
/// Stderr is forwarded to `tracing`; the process itself stays reachable
/// through [`ContainerProcess`].
pub struct AttachedProcess {
    /// Handle used to stop and reap the process
    pub process: ContainerProcess,

    /// Writer connected to the process's stdin
    pub stdin: ChildStdin,

    /// Reader connected to the process's stdout
    pub stdout: ChildStdout,
}

/// Spawn a command with piped stdio
pub fn spawn_attached(binary: &Path, args: &[String]) -> Result<AttachedProcess> {
    let line = display_command(binary, args);
    debug!(command = %line, "spawning attached backend process");

    let mut child = command(binary, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BackendError::from_spawn(binary, line.clone(), e))?;

    let pid = child.id();

    let stdin = child
        .stdin
        .take()
        .ok_or(BackendError::MissingPipe("stdin"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or(BackendError::MissingPipe("stdout"))?;

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "podman_deployer_cli::stderr", pid, "{}", line);
            }
        });
    }

    Ok(AttachedProcess {
        process: ContainerProcess::new(child),
        stdin,
        stdout,
    })
}
