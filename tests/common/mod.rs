//! Test utilities for libuci integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use libuci::{EngineConfig, EngineSession};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A session wired to a [`FakeEngine`].
pub type FakeSession = EngineSession<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

/// Config with default budgets; the path is never spawned.
pub fn config() -> EngineConfig {
    EngineConfig::builder()
        .engine_path("fake-engine")
        .build()
        .unwrap()
}

/// An in-process UCI engine over a duplex pipe.
///
/// It tracks the position set by `position` commands and answers `d`,
/// `go` and `isready`. Searches finish at once unless queued with
/// [`slow_search`](Self::slow_search); a slow search keeps running while the
/// engine answers `isready` with `readyok`, as Stockfish does, and prints
/// its `bestmove` when its time is up or on `stop`.
///
/// The join handle yields every line the engine received once the session
/// side closes.
#[derive(Debug, Clone)]
pub struct FakeEngine {
    legal_moves: Vec<String>,
    best_move: Option<String>,
    stall_on: Option<String>,
    reject_on: Option<(String, String)>,
    slow_searches: VecDeque<(Duration, String)>,
    ignore_stop: bool,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            legal_moves: ["e2e4", "d2d4", "g1f3", "b1c3", "e7e5", "g8f6"]
                .into_iter()
                .map(String::from)
                .collect(),
            best_move: Some("e2e4".to_string()),
            stall_on: None,
            reject_on: None,
            slow_searches: VecDeque::new(),
            ignore_stop: false,
        }
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves accepted by `go depth 1 searchmoves`.
    pub fn legal_moves(mut self, moves: &[&str]) -> Self {
        self.legal_moves = moves.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Move answered to `go movetime`; `None` answers `bestmove (none)`.
    pub fn best_move(mut self, mv: Option<&str>) -> Self {
        self.best_move = mv.map(String::from);
        self
    }

    /// Go silent, forever, after receiving a line starting with `prefix`.
    pub fn stall_on(mut self, prefix: &str) -> Self {
        self.stall_on = Some(prefix.to_string());
        self
    }

    /// Answer lines starting with `prefix` with an error marker line.
    pub fn reject_on(mut self, prefix: &str, marker: &str) -> Self {
        self.reject_on = Some((prefix.to_string(), marker.to_string()));
        self
    }

    /// The next `go` runs for `duration`, then answers `bestmove <mv>`.
    /// Queued slow searches apply to consecutive `go` commands.
    pub fn slow_search(mut self, duration: Duration, mv: &str) -> Self {
        self.slow_searches.push_back((duration, mv.to_string()));
        self
    }

    /// Let slow searches run to the end even when told to `stop`.
    pub fn ignore_stop(mut self) -> Self {
        self.ignore_stop = true;
        self
    }

    pub fn start(self) -> (FakeSession, JoinHandle<Vec<String>>) {
        self.start_with(&config())
    }

    pub fn start_with(self, config: &EngineConfig) -> (FakeSession, JoinHandle<Vec<String>>) {
        let (client, engine) = tokio::io::duplex(8192);
        let handle = tokio::spawn(self.run(engine));
        let (rx, tx) = tokio::io::split(client);
        (EngineSession::from_streams(rx, tx, config), handle)
    }

    async fn run(mut self, stream: DuplexStream) -> Vec<String> {
        let (rx, mut tx) = tokio::io::split(stream);
        let mut lines = BufReader::new(rx).lines();
        let mut received = Vec::new();
        let mut fen = START_FEN.to_string();
        // Deadline and move of the search in progress.
        let mut search: Option<(Instant, String)> = None;

        loop {
            let deadline = search.as_ref().map_or_else(Instant::now, |(at, _)| *at);
            let line = tokio::select! {
                next = lines.next_line() => match next {
                    Ok(Some(line)) => line,
                    _ => break,
                },
                _ = tokio::time::sleep_until(deadline), if search.is_some() => {
                    let finished = search.take().map(|(_, mv)| format!("bestmove {mv}"));
                    if !write_lines(&mut tx, finished).await {
                        break;
                    }
                    continue;
                }
            };
            received.push(line.clone());

            if self.stall_on.as_deref().is_some_and(|p| line.starts_with(p)) {
                std::future::pending::<()>().await;
            }

            let replies = if line == "stop" {
                match search.take() {
                    Some((at, mv)) if self.ignore_stop => {
                        search = Some((at, mv));
                        Vec::new()
                    }
                    Some((_, mv)) => vec![format!("bestmove {mv}")],
                    None => Vec::new(),
                }
            } else if line.starts_with("go ") && !self.slow_searches.is_empty() {
                if let Some((duration, mv)) = self.slow_searches.pop_front() {
                    search = Some((Instant::now() + duration, mv));
                }
                Vec::new()
            } else {
                match self.reject_on {
                    Some((ref prefix, ref marker)) if line.starts_with(prefix.as_str()) => {
                        vec![format!("{marker}: '{line}'. Type help for more information.")]
                    }
                    _ => self.reply(&line, &mut fen),
                }
            };

            if !write_lines(&mut tx, replies).await {
                break;
            }
        }
        received
    }

    fn reply(&self, line: &str, fen: &mut String) -> Vec<String> {
        if line == "uci" {
            return vec![
                "id name FakeFish".into(),
                "id author libuci".into(),
                "option name UCI_Elo type spin default 1320 min 600 max 3190".into(),
                "uciok".into(),
            ];
        }
        if line == "isready" {
            return vec!["readyok".into()];
        }
        if line == "d" {
            return vec![
                " +---+---+---+---+---+---+---+---+".into(),
                format!("Fen: {fen}"),
                "Key: 8F8F01D4562F59FB".into(),
                "Checkers: ".into(),
            ];
        }
        if line.starts_with("setoption ") {
            return Vec::new();
        }
        if line.starts_with("position ") {
            if let Some(next) = position_after(line) {
                *fen = next;
            }
            return Vec::new();
        }
        if let Some(candidate) = line.strip_prefix("go depth 1 searchmoves ") {
            let best = if self.legal_moves.iter().any(|m| m == candidate) {
                candidate.to_string()
            } else {
                self.legal_moves
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "(none)".into())
            };
            return vec![
                format!("info depth 1 seldepth 1 score cp 10 pv {best}"),
                format!("bestmove {best}"),
            ];
        }
        if line.starts_with("go movetime ") {
            return match self.best_move {
                Some(ref best) => vec![
                    format!("info depth 8 seldepth 10 score cp 30 pv {best}"),
                    format!("bestmove {best} ponder e7e5"),
                ],
                None => vec!["info depth 0 score mate 0".into(), "bestmove (none)".into()],
            };
        }
        vec![format!(
            "Unknown command: '{line}'. Type help for more information."
        )]
    }
}

async fn write_lines<I>(tx: &mut WriteHalf<DuplexStream>, lines: I) -> bool
where
    I: IntoIterator<Item = String>,
{
    for line in lines {
        if tx.write_all(format!("{line}\n").as_bytes()).await.is_err() {
            return false;
        }
    }
    true
}

/// Position after a `position` command, flipping the side to move once per
/// odd number of moves.
fn position_after(line: &str) -> Option<String> {
    let rest = line.strip_prefix("position ")?;
    let (base, plies) = match rest.split_once(" moves ") {
        Some((base, moves)) => (base, moves.split_whitespace().count()),
        None => (rest, 0),
    };
    let fen = if base == "startpos" {
        START_FEN.to_string()
    } else {
        base.strip_prefix("fen ")?.to_string()
    };
    if plies % 2 == 0 {
        return Some(fen);
    }
    let mut fields: Vec<&str> = fen.split(' ').collect();
    if let Some(side) = fields.get_mut(1) {
        *side = if *side == "w" { "b" } else { "w" };
    }
    Some(fields.join(" "))
}

/// Path of the shell-script engine used by subprocess tests.
pub fn fixture_engine() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fake_engine.sh").to_string()
}

/// Placement and side-to-move fields of a FEN.
pub fn board_and_side(fen: &str) -> (String, String) {
    let mut fields = fen.split(' ');
    let board = fields.next().unwrap_or_default().to_string();
    let side = fields.next().unwrap_or_default().to_string();
    (board, side)
}
