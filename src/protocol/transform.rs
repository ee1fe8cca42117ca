//! Response transforms: accumulated lines to typed results.
//!
//! Every transform tolerates a short sequence. The stream may have ended
//! before the terminator fired, so a missing line is an
//! [`Error::IncompleteResponse`], never a panic.

use super::{BESTMOVE_PREFIX, FEN_PREFIX};
use crate::{Error, Result};

/// Signature shared by all transforms: command text, then collected lines.
pub type Transform<T> = fn(&str, &[String]) -> Result<T>;

/// Tokens engines print instead of a move when the side to move has none.
const NULL_MOVES: [&str; 2] = ["(none)", "0000"];

/// Discard the response.
pub fn ignore(_command: &str, _lines: &[String]) -> Result<()> {
    Ok(())
}

/// Position from the first `Fen:` line, with the label dropped.
pub fn fen_line(command: &str, lines: &[String]) -> Result<String> {
    let line = first_with_prefix(lines, FEN_PREFIX).ok_or_else(|| incomplete(command, FEN_PREFIX))?;
    let fen = line
        .split_whitespace()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    if fen.is_empty() {
        return Err(incomplete(command, FEN_PREFIX));
    }
    Ok(fen)
}

/// Move token from the first `bestmove` line.
pub fn best_move(command: &str, lines: &[String]) -> Result<String> {
    let line = first_with_prefix(lines, BESTMOVE_PREFIX)
        .ok_or_else(|| incomplete(command, BESTMOVE_PREFIX))?;
    match line.split_whitespace().nth(1) {
        Some(token) if NULL_MOVES.contains(&token) => Err(Error::NoMove {
            line: line.to_string(),
        }),
        Some(token) => Ok(token.to_string()),
        None => Err(Error::NoMove {
            line: line.to_string(),
        }),
    }
}

fn first_with_prefix<'a>(lines: &'a [String], prefix: &str) -> Option<&'a str> {
    lines
        .iter()
        .map(String::as_str)
        .find(|line| line.starts_with(prefix))
}

fn incomplete(command: &str, expected: &'static str) -> Error {
    Error::IncompleteResponse {
        command: command.to_string(),
        expected,
    }
}
