//! The command executor: one request/response exchange at a time.
//!
//! An exchange writes the command and a sync probe, then collects lines
//! until the command's terminator, an error marker, or end of stream. The
//! whole exchange runs under the command's timeout; at the deadline the
//! exchange future is dropped, which aborts the pending read.
//!
//! # Stale output
//!
//! The sync probe is often answered after the terminator (`uciok`, then
//! `readyok`), and a timed-out exchange leaves its reply in the pipe. Engines
//! also answer `isready` while a search is still running, so after a search
//! times out its `bestmove` is still to come even with no probe outstanding.
//!
//! The executor counts unanswered probes and remembers the terminator of a
//! timed-out exchange. Before writing the next command it drains up to both
//! (sending `stop` first if a search is still running), so every exchange
//! starts from a quiet stream.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout as tokio_timeout;

use crate::process::{LineReader, LineWriter};
use crate::protocol::{
    self, Command, ProtocolObserver, Timeouts, BESTMOVE_PREFIX, READY, STOP, SYNC_PROBE,
};
use crate::{Error, Result};

/// Run `future` for at most `duration`.
///
/// On expiry the future is dropped (cancelling whatever it was awaiting) and
/// [`Error::Timeout`] is returned.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio_timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(duration)),
    }
}

/// Drives command exchanges over one reader/writer pair.
///
/// Exchanges are strictly sequential; `&mut self` on every call enforces
/// one caller at a time.
pub struct CommandExecutor<R, W> {
    reader: LineReader<R>,
    writer: LineWriter<W>,
    timeouts: Timeouts,
    observer: Option<Arc<dyn ProtocolObserver>>,
    /// Sync probes written whose `readyok` has not been read yet.
    pending_probes: usize,
    /// Terminator of a timed-out exchange that has not been read yet.
    stale_terminator: Option<&'static str>,
    /// Set when the last exchange timed out or hit an I/O error.
    poisoned: bool,
}

impl<R, W> CommandExecutor<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: LineReader<R>, writer: LineWriter<W>, timeouts: Timeouts) -> Self {
        Self {
            reader,
            writer,
            timeouts,
            observer: None,
            pending_probes: 0,
            stale_terminator: None,
            poisoned: false,
        }
    }

    pub fn with_observer(mut self, observer: Option<Arc<dyn ProtocolObserver>>) -> Self {
        self.observer = observer;
        self
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Whether the last exchange timed out or failed on I/O.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of sync probes still waiting for their answer.
    pub fn pending_probes(&self) -> usize {
        self.pending_probes
    }

    /// Terminator still owed by a timed-out exchange.
    pub fn stale_terminator(&self) -> Option<&'static str> {
        self.stale_terminator
    }

    /// Run one exchange and transform its output.
    pub async fn execute<T>(&mut self, command: &Command<T>) -> Result<T> {
        if self.pending_probes > 0 || self.stale_terminator.is_some() {
            self.resync().await?;
        }

        let budget = command.timeout();
        tracing::debug!(command = %command.text(), timeout = ?budget, "sending command");

        let outcome = with_timeout(budget, self.exchange(command)).await;
        let lines = match outcome {
            Ok(lines) => {
                self.poisoned = false;
                lines
            }
            Err(e) => {
                if matches!(e, Error::Timeout(_)) {
                    self.stale_terminator = Some(command.terminator());
                }
                self.record_failure(command.text(), &e);
                return Err(e);
            }
        };

        tracing::debug!(command = %command.name(), lines = lines.len(), "command completed");
        command.apply(&lines)
    }

    /// Write a line without waiting for any reply (`setoption` and the like).
    pub async fn send_raw(&mut self, line: &str) -> Result<()> {
        let result = with_timeout(self.timeouts.init, async {
            self.send(line).await?;
            self.writer.flush().await
        })
        .await;
        if let Err(ref e) = result {
            self.record_failure(line, e);
        }
        result
    }

    /// Sync probe round trip.
    pub async fn ping(&mut self) -> Result<()> {
        let command = protocol::command::ping(&self.timeouts);
        self.execute(&command).await
    }

    /// Close the write half so the engine sees end of input.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await
    }

    async fn exchange<T>(&mut self, command: &Command<T>) -> Result<Vec<String>> {
        self.send(command.text()).await?;
        self.send(SYNC_PROBE).await?;
        self.writer.flush().await?;

        let mut lines = Vec::new();
        while let Some(line) = self.read_line().await? {
            if let Some(marker) = protocol::error_marker(&line) {
                tracing::warn!(command = %command.text(), %marker, %line, "engine rejected command");
                return Err(Error::Protocol { line });
            }
            let done = command.is_terminator(&line);
            lines.push(line);
            if done {
                return Ok(lines);
            }
        }

        tracing::debug!(
            command = %command.text(),
            lines = lines.len(),
            "engine output ended before terminator"
        );
        Ok(lines)
    }

    /// Discard output up to the answers of all outstanding probes and the
    /// terminator of a timed-out exchange.
    async fn resync(&mut self) -> Result<()> {
        tracing::debug!(
            pending = self.pending_probes,
            stale = ?self.stale_terminator,
            "draining stale engine output"
        );
        let budget = self.timeouts.init;
        let result = with_timeout(budget, async {
            if self.stale_terminator == Some(BESTMOVE_PREFIX) {
                self.send(STOP).await?;
                self.writer.flush().await?;
            }
            while self.pending_probes > 0 || self.stale_terminator.is_some() {
                match self.read_line().await? {
                    Some(line) => {
                        if self.stale_terminator.is_some_and(|t| line.starts_with(t)) {
                            self.stale_terminator = None;
                        }
                        tracing::trace!(%line, "discarded stale line");
                    }
                    None => {
                        self.pending_probes = 0;
                        self.stale_terminator = None;
                    }
                }
            }
            Ok(())
        })
        .await;

        if let Err(ref e) = result {
            self.record_failure(SYNC_PROBE, e);
        }
        result
    }

    async fn send(&mut self, line: &str) -> Result<()> {
        tracing::trace!(%line, "engine <");
        if let Some(ref observer) = self.observer {
            observer.on_send(line);
        }
        self.writer.write_line(line).await?;
        if line == SYNC_PROBE {
            self.pending_probes += 1;
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        let line = self.reader.read_line().await?;
        if let Some(ref line) = line {
            tracing::trace!(%line, "engine >");
            if let Some(ref observer) = self.observer {
                observer.on_line(line);
            }
            if line.starts_with(READY) {
                self.pending_probes = self.pending_probes.saturating_sub(1);
            }
        }
        Ok(line)
    }

    fn record_failure(&mut self, command: &str, error: &Error) {
        match error {
            Error::Timeout(after) => {
                tracing::warn!(%command, timeout = ?after, "engine did not answer in time");
                self.poisoned = true;
            }
            Error::Io(e) => {
                tracing::warn!(%command, error = %e, "engine stream failed");
                self.poisoned = true;
            }
            _ => {}
        }
    }
}
