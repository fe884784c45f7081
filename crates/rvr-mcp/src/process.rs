//! Lifecycle of the MCP server child process.

use crate::config::McpServerConfig;
use crate::error::McpError;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// How a stopped server went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Exited on its own within the grace period.
    Exited(ExitStatus),
    /// Ignored the termination request and was killed.
    Killed(ExitStatus),
    /// Could not be reaped; the OS reported an error.
    Unknown,
}

impl ShutdownOutcome {
    pub fn was_killed(&self) -> bool {
        matches!(self, ShutdownOutcome::Killed(_))
    }
}

/// Pipes to a freshly spawned server.
pub struct ProcessPipes {
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
}

/// A running server process.
///
/// Consumed by [`ProcessHandle::stop`]; a stopped handle cannot be reused.
pub struct ProcessHandle {
    name: String,
    child: Child,
}

impl ProcessHandle {
    /// Spawn the configured command with piped stdin/stdout.
    ///
    /// Stderr is discarded unless `capture_stderr` is set, in which case its
    /// lines are forwarded to debug logs by a background task.
    pub fn spawn(name: &str, config: &McpServerConfig) -> Result<(Self, ProcessPipes), McpError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if config.capture_stderr {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| McpError::SpawnFailed {
            name: config.command.clone(),
            source: e,
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(McpError::SpawnFailed {
                name: config.command.clone(),
                source: std::io::Error::other("child stdio was not piped"),
            });
        };

        if let Some(stderr) = child.stderr.take() {
            let server = name.to_string();
            tokio::spawn(async move {
                forward_stderr(BufReader::new(stderr), &server).await;
            });
        }

        tracing::info!(server = %name, pid = ?child.id(), "spawned MCP server");

        Ok((
            Self {
                name: name.to_string(),
                child,
            },
            ProcessPipes { stdin, stdout },
        ))
    }

    /// OS process id, while the process has not been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Ask the process to terminate, wait up to `grace`, then kill it.
    ///
    /// The process is reaped exactly once on every path.
    pub async fn stop(mut self, grace: Duration) -> ShutdownOutcome {
        self.request_termination();

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(server = %self.name, %status, "MCP server exited");
                return ShutdownOutcome::Exited(status);
            }
            Ok(Err(e)) => {
                tracing::warn!(server = %self.name, "wait failed: {e}");
            }
            Err(_) => {
                tracing::warn!(
                    server = %self.name,
                    "MCP server did not exit within {}ms, killing",
                    grace.as_millis()
                );
            }
        }

        if let Err(e) = self.child.start_kill() {
            tracing::warn!(server = %self.name, "kill failed: {e}");
        }
        match self.child.wait().await {
            Ok(status) => {
                tracing::info!(server = %self.name, %status, "MCP server killed");
                ShutdownOutcome::Killed(status)
            }
            Err(e) => {
                tracing::warn!(server = %self.name, "wait after kill failed: {e}");
                ShutdownOutcome::Unknown
            }
        }
    }

    #[cfg(unix)]
    fn request_termination(&mut self) {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        if let Some(pid) = self.child.id() {
            tracing::debug!(server = %self.name, pid, "sending SIGTERM");
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                tracing::warn!(server = %self.name, pid, "SIGTERM failed: {e}");
            }
        }
    }

    #[cfg(not(unix))]
    fn request_termination(&mut self) {
        // No polite signal here; closing stdin is the only request to exit.
    }
}

/// Drain the server's stderr into debug logs until end of stream.
///
/// Bytes are read raw and decoded lossily, so output that is not UTF-8 never
/// stops the drain; the pipe stays open and the server never blocks or gets
/// `EPIPE` on its stderr. Returns the number of lines forwarded.
async fn forward_stderr<R: AsyncBufRead + Unpin>(mut reader: R, server: &str) -> usize {
    let mut buf = Vec::new();
    let mut lines = 0;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                tracing::debug!(server, "stderr: {}", line.trim_end());
                lines += 1;
            }
            Err(e) => {
                tracing::debug!(server, "stderr read failed: {e}");
                break;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> McpServerConfig {
        McpServerConfig {
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            ..McpServerConfig::default()
        }
    }

    #[tokio::test]
    async fn spawn_nonexistent_command_fails() {
        let config = McpServerConfig {
            command: "this_command_does_not_exist_xyz123".into(),
            ..McpServerConfig::default()
        };
        match ProcessHandle::spawn("rvr", &config) {
            Err(McpError::SpawnFailed { name, .. }) => {
                assert_eq!(name, "this_command_does_not_exist_xyz123");
            }
            Err(other) => panic!("Expected SpawnFailed, got: {other:?}"),
            Ok(_) => panic!("Expected error, got Ok"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stop_cooperative_process_exits_in_grace_period() {
        let (handle, _pipes) = ProcessHandle::spawn("rvr", &sh("exec sleep 30")).unwrap();
        let outcome = handle.stop(Duration::from_secs(5)).await;
        assert!(matches!(outcome, ShutdownOutcome::Exited(_)), "{outcome:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stop_kills_process_that_ignores_sigterm() {
        let (handle, _pipes) =
            ProcessHandle::spawn("rvr", &sh("trap '' TERM; exec sleep 30")).unwrap();
        // Give the shell time to install the trap before signalling.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = std::time::Instant::now();
        let outcome = handle.stop(Duration::from_millis(300)).await;
        assert!(outcome.was_killed(), "{outcome:?}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn stop_already_exited_process() {
        let (handle, _pipes) = ProcessHandle::spawn("rvr", &sh("exit 3")).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        match handle.stop(Duration::from_secs(1)).await {
            ShutdownOutcome::Exited(status) => assert_eq!(status.code(), Some(3)),
            other => panic!("Expected Exited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stderr_drain_survives_invalid_utf8() {
        let bytes: &[u8] = b"\xff\xfe binary\nINFO ready\nno newline at end";
        assert_eq!(forward_stderr(bytes, "rvr").await, 3);
    }
}
