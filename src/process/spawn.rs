//! Process spawning and lifecycle management.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use super::io::{LineReader, LineWriter};
use crate::config::EngineConfig;
use crate::{Error, Result};

/// How long `close` waits for the engine to exit after the kill signal.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// A running engine process.
///
/// # Cancellation
///
/// Dropping an `EngineProcess` will kill the subprocess if it's still running.
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    streams: Option<(LineReader<ChildStdout>, LineWriter<ChildStdin>)>,
    engine: String,
}

impl EngineProcess {
    /// Spawn the configured engine with piped stdin/stdout.
    pub fn spawn(config: &EngineConfig) -> Result<Self> {
        let mut cmd = build_command(config);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::EngineNotFound {
                    path: config.engine_command(),
                }
            } else {
                Error::ProcessSpawn(e)
            }
        })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.start_kill();
                return Err(Error::ProcessSpawn(std::io::Error::other(
                    "engine stdio was not captured",
                )));
            }
        };

        tracing::debug!(engine = %config.engine_command(), pid = ?child.id(), "engine spawned");

        Ok(Self {
            child,
            streams: Some((LineReader::new(stdout), LineWriter::new(stdin))),
            engine: config.engine_command(),
        })
    }

    /// Take the line reader/writer pair from this process.
    ///
    /// The streams can only be taken once.
    pub fn take_streams(&mut self) -> Option<(LineReader<ChildStdout>, LineWriter<ChildStdin>)> {
        self.streams.take()
    }

    /// Get the process ID of the running engine.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Check if the process is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Terminate the engine and release any streams still held here.
    ///
    /// Teardown is best-effort: failures are logged, never returned.
    pub async fn close(&mut self) {
        if self.is_running() {
            if let Err(e) = self.child.start_kill() {
                tracing::warn!(engine = %self.engine, error = %e, "failed to kill engine");
            }
            match tokio::time::timeout(CLOSE_GRACE, self.child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::debug!(engine = %self.engine, %status, "engine exited");
                }
                Ok(Err(e)) => {
                    tracing::warn!(engine = %self.engine, error = %e, "failed to reap engine");
                }
                Err(_) => {
                    tracing::warn!(engine = %self.engine, "engine did not exit after kill");
                }
            }
        }
        self.streams = None;
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        // Try to kill the process if it's still running
        let _ = self.child.start_kill();
    }
}

/// Build a tokio Command from the config.
fn build_command(config: &EngineConfig) -> Command {
    let mut cmd = Command::new(&config.engine_path);
    cmd.args(&config.args);

    if let Some(ref dir) = config.working_directory {
        cmd.current_dir(dir);
    }

    if !config.inherit_env {
        cmd.env_clear();
    }
    for (key, value) in &config.env_vars {
        cmd.env(key, value);
    }

    cmd
}
