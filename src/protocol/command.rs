//! The command table.
//!
//! Each command kind is a [`CommandSpec`]: which response line ends it, how
//! the collected lines become a result, and which timeout budget applies.
//! Adding a command kind means adding a row here, not new control flow in
//! the executor.

use std::fmt;
use std::time::Duration;

use super::transform::{self, Transform};
use super::{BESTMOVE_PREFIX, CHECKERS_PREFIX, READY, SYNC_PROBE, UCI_OK};
use crate::config::EngineConfig;
use crate::position::Position;

/// Which configured timeout an exchange runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Handshake, position and sync commands.
    Init,
    /// Display and search commands.
    Analysis,
}

/// Concrete durations for each [`Budget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub init: Duration,
    pub analysis: Duration,
}

impl Timeouts {
    pub fn resolve(&self, budget: Budget) -> Duration {
        match budget {
            Budget::Init => self.init,
            Budget::Analysis => self.analysis,
        }
    }
}

impl From<&EngineConfig> for Timeouts {
    fn from(config: &EngineConfig) -> Self {
        Self {
            init: config.init_timeout(),
            analysis: config.analysis_timeout(),
        }
    }
}

/// One row of the command table.
pub struct CommandSpec<T> {
    /// Leading word(s) of the command, for logs.
    pub name: &'static str,
    /// A response line starting with this ends the exchange.
    pub terminator: &'static str,
    pub transform: Transform<T>,
    pub budget: Budget,
}

pub const UCI: CommandSpec<()> = CommandSpec {
    name: "uci",
    terminator: UCI_OK,
    transform: transform::ignore,
    budget: Budget::Init,
};

pub const POSITION: CommandSpec<()> = CommandSpec {
    name: "position",
    terminator: READY,
    transform: transform::ignore,
    budget: Budget::Init,
};

pub const DISPLAY: CommandSpec<String> = CommandSpec {
    name: "d",
    terminator: CHECKERS_PREFIX,
    transform: transform::fen_line,
    budget: Budget::Analysis,
};

pub const GO_MOVETIME: CommandSpec<String> = CommandSpec {
    name: "go movetime",
    terminator: BESTMOVE_PREFIX,
    transform: transform::best_move,
    budget: Budget::Analysis,
};

pub const GO_SEARCHMOVES: CommandSpec<String> = CommandSpec {
    name: "go depth 1 searchmoves",
    terminator: BESTMOVE_PREFIX,
    transform: transform::best_move,
    budget: Budget::Analysis,
};

pub const PING: CommandSpec<()> = CommandSpec {
    name: "isready",
    terminator: READY,
    transform: transform::ignore,
    budget: Budget::Init,
};

impl<T> CommandSpec<T> {
    /// Bind this row to concrete command text and a timeout.
    pub fn command(&self, text: impl Into<String>, timeouts: &Timeouts) -> Command<T> {
        Command {
            text: text.into(),
            name: self.name,
            terminator: self.terminator,
            transform: self.transform,
            timeout: timeouts.resolve(self.budget),
        }
    }
}

impl<T> fmt::Debug for CommandSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("terminator", &self.terminator)
            .field("budget", &self.budget)
            .finish()
    }
}

/// A command ready to execute. Built per call, never reused.
pub struct Command<T> {
    text: String,
    name: &'static str,
    terminator: &'static str,
    transform: Transform<T>,
    timeout: Duration,
}

impl<T> Command<T> {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Prefix of the response line that ends this exchange.
    pub fn terminator(&self) -> &'static str {
        self.terminator
    }

    /// Replace the table's budget for this one call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_terminator(&self, line: &str) -> bool {
        line.starts_with(self.terminator)
    }

    pub fn apply(&self, lines: &[String]) -> crate::Result<T> {
        (self.transform)(&self.text, lines)
    }
}

impl<T> fmt::Debug for Command<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("text", &self.text)
            .field("terminator", &self.terminator)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Command text builders
// -----------------------------------------------------------------------------

pub fn uci(timeouts: &Timeouts) -> Command<()> {
    UCI.command("uci", timeouts)
}

/// `position startpos|fen <FEN> [moves m1 m2 ...]`
pub fn position(position: &Position, moves: &[&str], timeouts: &Timeouts) -> Command<()> {
    let mut text = format!("position {}", position.uci_arg());
    if !moves.is_empty() {
        text.push_str(" moves ");
        text.push_str(&moves.join(" "));
    }
    POSITION.command(text, timeouts)
}

pub fn display(timeouts: &Timeouts) -> Command<String> {
    DISPLAY.command("d", timeouts)
}

pub fn go_movetime(millis: u64, timeouts: &Timeouts) -> Command<String> {
    GO_MOVETIME.command(format!("go movetime {millis}"), timeouts)
}

pub fn go_searchmoves(candidate: &str, timeouts: &Timeouts) -> Command<String> {
    GO_SEARCHMOVES.command(format!("go depth 1 searchmoves {candidate}"), timeouts)
}

pub fn ping(timeouts: &Timeouts) -> Command<()> {
    PING.command(SYNC_PROBE, timeouts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUTS: Timeouts = Timeouts {
        init: Duration::from_secs(2),
        analysis: Duration::from_secs(5),
    };

    #[test]
    fn table_terminators() {
        assert!(uci(&TIMEOUTS).is_terminator("uciok"));
        assert!(!uci(&TIMEOUTS).is_terminator("readyok"));
        assert!(display(&TIMEOUTS).is_terminator("Checkers: e1"));
        assert!(go_movetime(100, &TIMEOUTS).is_terminator("bestmove e2e4 ponder e7e5"));
        assert!(!go_movetime(100, &TIMEOUTS).is_terminator("info string bestmove soon"));
        assert!(ping(&TIMEOUTS).is_terminator("readyok"));
    }

    #[test]
    fn table_budgets() {
        assert_eq!(uci(&TIMEOUTS).timeout(), Duration::from_secs(2));
        assert_eq!(
            position(&Position::start(), &[], &TIMEOUTS).timeout(),
            Duration::from_secs(2)
        );
        assert_eq!(display(&TIMEOUTS).timeout(), Duration::from_secs(5));
        assert_eq!(go_searchmoves("e2e4", &TIMEOUTS).timeout(), Duration::from_secs(5));
        assert_eq!(
            go_movetime(10, &TIMEOUTS)
                .with_timeout(Duration::from_millis(50))
                .timeout(),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn position_text() {
        assert_eq!(
            position(&Position::start(), &[], &TIMEOUTS).text(),
            "position startpos"
        );
        assert_eq!(
            position(&Position::start(), &["e2e4", "e7e5"], &TIMEOUTS).text(),
            "position startpos moves e2e4 e7e5"
        );
        let fen: Position = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        assert_eq!(
            position(&fen, &["e1e2"], &TIMEOUTS).text(),
            "position fen 4k3/8/8/8/8/8/8/4K3 w - - 0 1 moves e1e2"
        );
    }

    #[test]
    fn go_text() {
        assert_eq!(go_movetime(3000, &TIMEOUTS).text(), "go movetime 3000");
        assert_eq!(
            go_searchmoves("g1f3", &TIMEOUTS).text(),
            "go depth 1 searchmoves g1f3"
        );
        assert_eq!(ping(&TIMEOUTS).text(), "isready");
    }

    #[test]
    fn apply_runs_transform_with_command_text() {
        let cmd = display(&TIMEOUTS);
        let err = cmd.apply(&[]).unwrap_err();
        assert!(matches!(err, crate::Error::IncompleteResponse { ref command, .. } if command == "d"));

        let fen = cmd
            .apply(&["Fen: 4k3/8/8/8/8/8/8/4K3 w - - 0 1".to_string()])
            .unwrap();
        assert_eq!(fen, "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }
}
