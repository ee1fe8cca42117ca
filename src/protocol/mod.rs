//! UCI protocol vocabulary.
//!
//! This module defines what is written to the engine and how its replies
//! are read:
//!
//! - [`command`] - the command table ([`CommandSpec`]) and per-call [`Command`]s
//! - [`transform`] - functions turning collected lines into typed results
//! - [`ProtocolObserver`] - hooks that see the raw transcript
//!
//! # Exchange shape
//!
//! Every command is followed by a [`SYNC_PROBE`]. The engine answers the
//! probe with [`READY`] once it has processed everything before it, so a
//! reply always ends either at the command's own terminator or at the
//! probe's answer.
//!
//! ```text
//! > position startpos moves e2e4
//! > isready
//! < readyok
//! ```

pub mod command;
mod observer;
pub mod transform;

pub use command::{Budget, Command, CommandSpec, Timeouts};
pub use observer::{LogLevel, LoggingObserver, ProtocolObserver};

/// Synchronization probe written after every command.
pub const SYNC_PROBE: &str = "isready";
/// Answer to [`SYNC_PROBE`].
pub const READY: &str = "readyok";
/// Final line of the `uci` handshake.
pub const UCI_OK: &str = "uciok";
/// Label of the position line in `d` output.
pub const FEN_PREFIX: &str = "Fen:";
/// Last line of `d` output.
pub const CHECKERS_PREFIX: &str = "Checkers:";
/// Final line of a search.
pub const BESTMOVE_PREFIX: &str = "bestmove";
/// Ends a running search; the engine answers with its `bestmove`.
pub const STOP: &str = "stop";

/// Substrings that mark a line as an engine-side rejection. Case-sensitive.
pub const ERROR_MARKERS: [&str; 2] = ["Unknown command", "Unexpected token"];

/// The first of the [`ERROR_MARKERS`] contained in `line`, if any.
pub fn error_marker(line: &str) -> Option<&'static str> {
    ERROR_MARKERS
        .into_iter()
        .find(|marker| line.contains(marker))
}
