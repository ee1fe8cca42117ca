//! The session gateway: typed chess operations over one engine.
//!
//! [`EngineSession`] owns one engine process and the executor driving its
//! streams. Each operation performs one logical round trip and comes in two
//! forms:
//!
//! - `op` returns `bool` / `Option`. Engine faults are logged and collapsed
//!   to `false` / `None`.
//! - `try_op` returns [`Result`] so callers can tell a rejection from a
//!   timeout from a dead process.
//!
//! # Example
//!
//! ```ignore
//! use libuci::{EngineConfig, EngineSession, StrengthLevel};
//!
//! let config = EngineConfig::builder()
//!     .engine_path("./stockfish/stockfish")
//!     .build()?;
//! let mut session = EngineSession::open(&config)?;
//!
//! session.initialize(Some(StrengthLevel::Level3)).await;
//! if session.apply_move("e2e4", "startpos").await {
//!     println!("{:?}", session.current_position().await);
//!     println!("{:?}", session.best_move(500).await);
//! }
//!
//! session.close().await;
//! ```

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{ChildStdin, ChildStdout};

use crate::config::{EngineConfig, StrengthLevel};
use crate::executor::{with_timeout, CommandExecutor};
use crate::position::{self, Position, Side};
use crate::process::{EngineProcess, LineReader, LineWriter};
use crate::protocol::{command, Timeouts};
use crate::{Error, Result};

/// One engine, one caller.
///
/// Operations take `&mut self`, so a session never has two exchanges in
/// flight. Call [`close`](Self::close) when done; dropping an open session
/// still kills the engine but skips the orderly shutdown.
pub struct EngineSession<R = ChildStdout, W = ChildStdin> {
    process: Option<EngineProcess>,
    executor: Option<CommandExecutor<R, W>>,
    timeouts: Timeouts,
    default_movetime: u64,
}

impl EngineSession {
    /// Spawn the configured engine and attach to its streams.
    ///
    /// The engine is not initialized yet; call
    /// [`initialize`](Self::initialize) before anything else.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let mut process = EngineProcess::spawn(config)?;
        let (reader, writer) = process.take_streams().ok_or(Error::SessionClosed)?;
        let mut session = Self::attach(reader, writer, config);
        session.process = Some(process);
        Ok(session)
    }

    /// Process ID of the engine, if it is still attached.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(EngineProcess::pid)
    }
}

impl<R, W> EngineSession<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Drive an engine over an existing reader/writer pair.
    ///
    /// Timeouts, default search time and observer come from `config`; its
    /// process options are ignored.
    pub fn from_streams(reader: R, writer: W, config: &EngineConfig) -> Self {
        Self::attach(LineReader::new(reader), LineWriter::new(writer), config)
    }

    fn attach(reader: LineReader<R>, writer: LineWriter<W>, config: &EngineConfig) -> Self {
        let timeouts = Timeouts::from(config);
        let executor =
            CommandExecutor::new(reader, writer, timeouts).with_observer(config.observer().cloned());
        Self {
            process: None,
            executor: Some(executor),
            timeouts,
            default_movetime: config.default_movetime(),
        }
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Run the `uci` handshake, optionally limiting playing strength.
    pub async fn initialize(&mut self, level: Option<StrengthLevel>) -> bool {
        let result = self.try_initialize(level).await;
        collapse("initialize", result).is_some()
    }

    pub async fn try_initialize(&mut self, level: Option<StrengthLevel>) -> Result<()> {
        let command = command::uci(&self.timeouts);
        let executor = self.executor()?;
        executor.execute(&command).await?;

        if let Some(level) = level {
            for line in level.option_lines() {
                executor.send_raw(&line).await?;
            }
            tracing::debug!(%level, "engine strength limited");
        }
        Ok(())
    }

    /// Make `position` the engine's active position.
    ///
    /// Returns `false` without contacting the engine if `position` is
    /// malformed.
    pub async fn set_position(&mut self, position: &str) -> bool {
        let result = self.try_set_position(position).await;
        collapse("set_position", result).is_some()
    }

    pub async fn try_set_position(&mut self, position: &str) -> Result<()> {
        let position = Position::parse(position)?;
        self.send_position(&position, &[]).await
    }

    /// Play `mv` from `from` if the engine accepts it as legal.
    ///
    /// On success the engine's active position is `from` followed by `mv`.
    pub async fn apply_move(&mut self, mv: &str, from: &str) -> bool {
        let result = self.try_apply_move(mv, from).await;
        collapse("apply_move", result).unwrap_or(false)
    }

    /// `Ok(false)` means the move is illegal; errors are engine faults or a
    /// malformed `from`.
    pub async fn try_apply_move(&mut self, mv: &str, from: &str) -> Result<bool> {
        let from = Position::parse(from)?;
        if !self.probe_move(mv, &from).await? {
            return Ok(false);
        }
        self.send_position(&from, &[mv]).await?;
        Ok(true)
    }

    /// Ask the engine whether `mv` is legal in `position`.
    ///
    /// This replaces the engine's active position with `position`.
    pub async fn is_valid_move(&mut self, mv: &str, position: &str) -> bool {
        let result = self.try_is_valid_move(mv, position).await;
        collapse("is_valid_move", result).unwrap_or(false)
    }

    pub async fn try_is_valid_move(&mut self, mv: &str, position: &str) -> Result<bool> {
        let position = Position::parse(position)?;
        self.probe_move(mv, &position).await
    }

    /// The engine's active position as reported by `d`.
    pub async fn current_position(&mut self) -> Option<String> {
        let result = self.try_current_position().await;
        collapse("current_position", result)
    }

    pub async fn try_current_position(&mut self) -> Result<String> {
        let command = command::display(&self.timeouts);
        self.executor()?.execute(&command).await
    }

    /// Search the active position for `movetime` milliseconds.
    pub async fn best_move(&mut self, movetime: u64) -> Option<String> {
        let result = self.try_best_move(movetime).await;
        collapse("best_move", result)
    }

    /// A search longer than the analysis budget gets the search time plus
    /// the init budget instead.
    pub async fn try_best_move(&mut self, movetime: u64) -> Result<String> {
        let mut command = command::go_movetime(movetime, &self.timeouts);
        let search = Duration::from_millis(movetime);
        if search >= command.timeout() {
            command = command.with_timeout(search + self.timeouts.init);
        }
        self.executor()?.execute(&command).await
    }

    /// [`best_move`](Self::best_move) with the configured default search time.
    pub async fn best_move_default(&mut self) -> Option<String> {
        self.best_move(self.default_movetime).await
    }

    pub async fn try_best_move_default(&mut self) -> Result<String> {
        self.try_best_move(self.default_movetime).await
    }

    /// Side to move in `position`. Never contacts the engine.
    pub fn side_to_move(&self, position: &str) -> Option<Side> {
        position::side_to_move(position)
    }

    /// Round-trip a sync probe.
    pub async fn is_healthy(&mut self) -> bool {
        self.try_ping().await.is_ok()
    }

    pub async fn try_ping(&mut self) -> Result<()> {
        self.executor()?.ping().await
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.executor.is_none()
    }

    /// Whether the last exchange timed out or broke the stream.
    ///
    /// A poisoned session may recover on the next call, but pools should
    /// discard it.
    pub fn is_poisoned(&self) -> bool {
        self.executor
            .as_ref()
            .map_or(true, CommandExecutor::is_poisoned)
    }

    /// Shut the engine down and release its streams.
    ///
    /// Idempotent. Failures are logged, never returned. Every later
    /// operation reports [`Error::SessionClosed`].
    pub async fn close(&mut self) {
        if let Some(mut executor) = self.executor.take() {
            match with_timeout(self.timeouts.init, executor.shutdown()).await {
                Ok(()) => {}
                Err(e) => tracing::warn!(error = %e, "failed to close engine input"),
            }
        }
        if let Some(mut process) = self.process.take() {
            process.close().await;
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Move the engine out, leaving `self` closed.
    pub(crate) fn take(&mut self) -> Self {
        Self {
            process: self.process.take(),
            executor: self.executor.take(),
            timeouts: self.timeouts,
            default_movetime: self.default_movetime,
        }
    }

    fn executor(&mut self) -> Result<&mut CommandExecutor<R, W>> {
        self.executor.as_mut().ok_or(Error::SessionClosed)
    }

    async fn send_position(&mut self, position: &Position, moves: &[&str]) -> Result<()> {
        let command = command::position(position, moves, &self.timeouts);
        self.executor()?.execute(&command).await
    }

    /// Restrict a depth-1 search to `mv`; the engine only plays it back if
    /// it is legal.
    async fn probe_move(&mut self, mv: &str, position: &Position) -> Result<bool> {
        if !is_move_token(mv) {
            tracing::debug!(%mv, "not a move token");
            return Ok(false);
        }
        self.send_position(position, &[]).await?;

        let command = command::go_searchmoves(mv, &self.timeouts);
        match self.executor()?.execute(&command).await {
            Ok(best) => Ok(best == mv),
            // No legal moves at all.
            Err(Error::NoMove { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<R, W> fmt::Debug for EngineSession<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSession")
            .field("process", &self.process)
            .field("closed", &self.executor.is_none())
            .field("timeouts", &self.timeouts)
            .field("default_movetime", &self.default_movetime)
            .finish()
    }
}

/// Moves travel as a single token on the `position` and `go` lines.
fn is_move_token(mv: &str) -> bool {
    !mv.is_empty() && mv.chars().all(|c| c.is_ascii_alphanumeric())
}

fn collapse<T>(operation: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e @ Error::MalformedPosition { .. }) => {
            tracing::debug!(operation, error = %e, "rejected before reaching engine");
            None
        }
        Err(e) => {
            tracing::warn!(operation, kind = e.kind(), error = %e, "engine operation failed");
            None
        }
    }
}
