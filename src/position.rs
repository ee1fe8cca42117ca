//! Board-position validation.
//!
//! Positions are either the literal [`START_POS`] sentinel or a six-field
//! FEN string. Nothing here talks to the engine: a position that fails these
//! checks is rejected before any command is written.
//!
//! # Example
//!
//! ```
//! use libuci::position::{is_valid, side_to_move, Side};
//!
//! assert!(is_valid("startpos"));
//! assert!(!is_valid("8/8/8/8/8/8/8/8 w - - 0 1"));
//! assert_eq!(side_to_move("startpos"), Some(Side::White));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Sentinel for the standard initial position.
pub const START_POS: &str = "startpos";

const PIECES: &str = "rnbqkpRNBQKP";
const RANKS: usize = 8;
const FILES: u32 = 8;

/// Why a position string was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("expected 6 space-separated fields, found {found}")]
    FieldCount { found: usize },

    #[error("expected 8 ranks in piece placement, found {found}")]
    RankCount { found: usize },

    #[error("invalid character {char:?} in rank {rank}")]
    InvalidCharacter { rank: usize, char: char },

    #[error("consecutive digits in rank {rank}")]
    ConsecutiveDigits { rank: usize },

    #[error("rank {rank} covers {files} files, expected 8")]
    RankWidth { rank: usize, files: u32 },

    #[error("no {king:?} king on the board")]
    MissingKing { king: char },

    #[error("invalid side to move {found:?}")]
    InvalidSide { found: String },

    #[error("invalid castling rights {found:?}")]
    InvalidCastling { found: String },

    #[error("invalid en passant target {found:?}")]
    InvalidEnPassant { found: String },

    #[error("move counter {found:?} is not a non-negative integer")]
    InvalidCounter { found: String },

    #[error("halfmove clock {halfmove} must be below twice the fullmove number {fullmove}")]
    HalfmoveTooLarge { halfmove: u64, fullmove: u64 },
}

/// The two sides in a chess game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Resolve a side from FEN notation by matching the first letter of its
    /// name, ignoring case (`"w"`/`"W"` is white, `"b"`/`"B"` is black).
    pub fn from_notation(input: &str) -> Option<Self> {
        let mut chars = input.chars();
        let first = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        [Side::White, Side::Black]
            .into_iter()
            .find(|side| side.name().starts_with(first.to_ascii_uppercase()))
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Side::White => "WHITE",
            Side::Black => "BLACK",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check a position string, reporting the first failed check.
pub fn validate(position: &str) -> std::result::Result<(), PositionError> {
    if position == START_POS {
        return Ok(());
    }

    let fields: Vec<&str> = position.split(' ').collect();
    if fields.len() != 6 {
        return Err(PositionError::FieldCount {
            found: fields.len(),
        });
    }

    validate_placement(fields[0])?;

    if !matches!(fields[1], "w" | "b") {
        return Err(PositionError::InvalidSide {
            found: fields[1].to_string(),
        });
    }
    validate_castling(fields[2])?;
    validate_en_passant(fields[3])?;

    let halfmove = parse_counter(fields[4])?;
    let fullmove = parse_counter(fields[5])?;
    // A fullmove number large enough to overflow imposes no bound.
    if fullmove.checked_mul(2).is_some_and(|limit| halfmove >= limit) {
        return Err(PositionError::HalfmoveTooLarge { halfmove, fullmove });
    }

    Ok(())
}

/// Returns true if the position is the start sentinel or a well-formed FEN.
pub fn is_valid(position: &str) -> bool {
    validate(position).is_ok()
}

/// The side to move in `position`.
///
/// The start sentinel is white by definition. Invalid positions yield `None`.
pub fn side_to_move(position: &str) -> Option<Side> {
    if position == START_POS {
        return Some(Side::White);
    }
    validate(position).ok()?;
    position.split(' ').nth(1).and_then(Side::from_notation)
}

fn validate_placement(placement: &str) -> std::result::Result<(), PositionError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != RANKS {
        return Err(PositionError::RankCount { found: ranks.len() });
    }

    for (rank, row) in ranks.iter().enumerate() {
        let mut files = 0u32;
        let mut previous_was_digit = false;
        for c in row.chars() {
            match c {
                '1'..='8' => {
                    if previous_was_digit {
                        return Err(PositionError::ConsecutiveDigits { rank });
                    }
                    files += c.to_digit(10).unwrap_or_default();
                    previous_was_digit = true;
                }
                c if PIECES.contains(c) => {
                    files += 1;
                    previous_was_digit = false;
                }
                _ => return Err(PositionError::InvalidCharacter { rank, char: c }),
            }
        }
        if files != FILES {
            return Err(PositionError::RankWidth { rank, files });
        }
    }

    for king in ['K', 'k'] {
        if !placement.contains(king) {
            return Err(PositionError::MissingKing { king });
        }
    }
    Ok(())
}

fn validate_castling(field: &str) -> std::result::Result<(), PositionError> {
    let ok = field == "-"
        || ((1..=4).contains(&field.len()) && field.chars().all(|c| "KQkq".contains(c)));
    if ok {
        Ok(())
    } else {
        Err(PositionError::InvalidCastling {
            found: field.to_string(),
        })
    }
}

fn validate_en_passant(field: &str) -> std::result::Result<(), PositionError> {
    let bytes = field.as_bytes();
    let ok = field == "-"
        || (bytes.len() == 2
            && (b'a'..=b'h').contains(&bytes[0])
            && (b'1'..=b'8').contains(&bytes[1]));
    if ok {
        Ok(())
    } else {
        Err(PositionError::InvalidEnPassant {
            found: field.to_string(),
        })
    }
}

fn parse_counter(field: &str) -> std::result::Result<u64, PositionError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PositionError::InvalidCounter {
            found: field.to_string(),
        });
    }
    field.parse().map_err(|_| PositionError::InvalidCounter {
        found: field.to_string(),
    })
}

/// A position that has passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position(String);

impl Position {
    /// The standard initial position.
    pub fn start() -> Self {
        Position(START_POS.to_string())
    }

    /// Validate and wrap a position string.
    pub fn parse(position: &str) -> Result<Self> {
        validate(position).map_err(|reason| Error::malformed(position, reason))?;
        Ok(Position(position.to_string()))
    }

    pub fn is_start(&self) -> bool {
        self.0 == START_POS
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn side_to_move(&self) -> Side {
        side_to_move(&self.0).unwrap_or(Side::White)
    }

    /// Piece placement field; `None` for the start sentinel.
    pub fn placement(&self) -> Option<&str> {
        if self.is_start() {
            None
        } else {
            self.0.split(' ').next()
        }
    }

    /// Argument for the `position` command: `startpos` or `fen <FEN>`.
    pub fn uci_arg(&self) -> String {
        if self.is_start() {
            START_POS.to_string()
        } else {
            format!("fen {}", self.0)
        }
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Position::parse(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Position {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INITIAL: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn start_sentinel_is_valid() {
        assert!(is_valid("startpos"));
        assert_eq!(side_to_move("startpos"), Some(Side::White));
    }

    #[test]
    fn initial_fen_is_valid() {
        assert!(is_valid(INITIAL));
        assert_eq!(side_to_move(INITIAL), Some(Side::White));
    }

    #[test]
    fn sparse_midgame_is_valid() {
        assert!(is_valid(
            "8/3P3k/n2K3p/2p3n1/1b4N1/2p1p1P1/8/3B4 w - - 0 1"
        ));
    }

    #[test]
    fn black_to_move() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        assert!(is_valid(fen));
        assert_eq!(side_to_move(fen), Some(Side::Black));
    }

    #[test]
    fn empty_board_has_no_kings() {
        assert_eq!(
            validate("8/8/8/8/8/8/8/8 w - - 0 1"),
            Err(PositionError::MissingKing { king: 'K' })
        );
        assert_eq!(side_to_move("8/8/8/8/8/8/8/8 w - - 0 1"), None);
    }

    #[test]
    fn missing_black_king() {
        assert_eq!(
            validate("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(PositionError::MissingKing { king: 'k' })
        );
    }

    #[test]
    fn rank_too_wide_or_narrow() {
        assert_eq!(
            validate("rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(PositionError::RankWidth { rank: 1, files: 9 })
        );
        assert_eq!(
            validate("rnbqkbnr/pppppppp/7/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(PositionError::RankWidth { rank: 2, files: 7 })
        );
    }

    #[test]
    fn consecutive_digits_rejected() {
        assert_eq!(
            validate("rnbqkbnr/pppppppp/44/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(PositionError::ConsecutiveDigits { rank: 2 })
        );
    }

    #[test]
    fn unknown_piece_letter_rejected() {
        assert_eq!(
            validate("rnbqkbnr/pppppppp/8/8/3X4/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(PositionError::InvalidCharacter { rank: 4, char: 'X' })
        );
        // Zero is not a run length.
        assert!(!is_valid(
            "rnbqkbnr/pppppppp/08/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        ));
    }

    #[test]
    fn wrong_rank_count() {
        assert_eq!(
            validate("rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(PositionError::RankCount { found: 7 })
        );
    }

    #[test]
    fn field_structure_checks() {
        assert_eq!(
            validate("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"),
            Err(PositionError::FieldCount { found: 4 })
        );
        assert!(matches!(
            validate("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(PositionError::InvalidSide { .. })
        ));
        assert!(matches!(
            validate("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkqK - 0 1"),
            Err(PositionError::InvalidCastling { .. })
        ));
        assert!(matches!(
            validate("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1"),
            Err(PositionError::InvalidEnPassant { .. })
        ));
        assert!(matches!(
            validate("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - -1 1"),
            Err(PositionError::InvalidCounter { .. })
        ));
        // Double spaces produce an empty field.
        assert!(!is_valid(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR  w KQkq - 0 1"
        ));
    }

    #[test]
    fn halfmove_bound() {
        assert!(is_valid("4k3/8/8/8/8/8/8/4K3 w - - 9 5"));
        assert_eq!(
            validate("4k3/8/8/8/8/8/8/4K3 w - - 10 5"),
            Err(PositionError::HalfmoveTooLarge {
                halfmove: 10,
                fullmove: 5
            })
        );
        assert!(!is_valid("4k3/8/8/8/8/8/8/4K3 w - - 0 0"));
    }

    #[test]
    fn side_from_notation_ignores_case() {
        assert_eq!(Side::from_notation("w"), Some(Side::White));
        assert_eq!(Side::from_notation("W"), Some(Side::White));
        assert_eq!(Side::from_notation("b"), Some(Side::Black));
        assert_eq!(Side::from_notation("x"), None);
        assert_eq!(Side::from_notation(""), None);
        assert_eq!(Side::from_notation("wb"), None);
        assert_eq!(Side::White.opposite(), Side::Black);
    }

    #[test]
    fn side_serde_uses_names() {
        assert_eq!(serde_json::to_string(&Side::Black).unwrap(), "\"BLACK\"");
        let side: Side = serde_json::from_str("\"WHITE\"").unwrap();
        assert_eq!(side, Side::White);
    }

    #[test]
    fn position_uci_arg() {
        assert_eq!(Position::start().uci_arg(), "startpos");
        let pos: Position = INITIAL.parse().unwrap();
        assert_eq!(pos.uci_arg(), format!("fen {INITIAL}"));
        assert_eq!(pos.placement(), Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"));
        assert_eq!(Position::start().placement(), None);
        assert_eq!(pos.side_to_move(), Side::White);
    }

    #[test]
    fn position_parse_rejects_malformed() {
        let err = Position::parse("8/8/8/8/8/8/8/8 w - - 0 1").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedPosition {
                reason: PositionError::MissingKing { .. },
                ..
            }
        ));
    }
}
