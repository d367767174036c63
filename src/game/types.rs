//! Type definitions for chess coordinates, pieces and moves
//!
//! These are the controller's own vocabulary. The legality oracle converts
//! between them and whatever representation its rules engine uses, so nothing
//! above the oracle depends on a particular chess library.

use super::error::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceColor {
    #[default]
    White,
    Black,
}

impl PieceColor {
    /// The other side
    pub fn opposite(self) -> Self {
        match self {
            PieceColor::White => PieceColor::Black,
            PieceColor::Black => PieceColor::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceColor::White => "white",
            PieceColor::Black => "black",
        }
    }
}

impl fmt::Display for PieceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    King,
    Queen,
    Bishop,
    Knight,
    Rook,
    Pawn,
}

impl PieceType {
    pub fn name(self) -> &'static str {
        match self {
            PieceType::King => "king",
            PieceType::Queen => "queen",
            PieceType::Bishop => "bishop",
            PieceType::Knight => "knight",
            PieceType::Rook => "rook",
            PieceType::Pawn => "pawn",
        }
    }

    /// Lowercase letter used in UCI promotion suffixes and FEN
    pub fn to_char(self) -> char {
        match self {
            PieceType::King => 'k',
            PieceType::Queen => 'q',
            PieceType::Bishop => 'b',
            PieceType::Knight => 'n',
            PieceType::Rook => 'r',
            PieceType::Pawn => 'p',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceType::King),
            'q' => Some(PieceType::Queen),
            'b' => Some(PieceType::Bishop),
            'n' => Some(PieceType::Knight),
            'r' => Some(PieceType::Rook),
            'p' => Some(PieceType::Pawn),
            _ => None,
        }
    }

    /// Pieces a pawn may be promoted to
    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceType::Queen | PieceType::Rook | PieceType::Bishop | PieceType::Knight
        )
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: PieceColor,
    pub piece_type: PieceType,
}

impl Piece {
    pub fn new(color: PieceColor, piece_type: PieceType) -> Self {
        Self { color, piece_type }
    }

    /// FEN letter: uppercase for white, lowercase for black
    pub fn to_fen_char(self) -> char {
        let c = self.piece_type.to_char();
        match self.color {
            PieceColor::White => c.to_ascii_uppercase(),
            PieceColor::Black => c,
        }
    }
}

/// Board coordinate representing a file (column) on the chessboard
///
/// Values range from 0 (file 'a') to 7 (file 'h').
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct File(u8);

impl File {
    pub fn new(index: u8) -> Option<Self> {
        (index < 8).then_some(File(index))
    }

    /// Create a file from a character ('a'..='h')
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a'..='h' => Some(File(c as u8 - b'a')),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        (b'a' + self.0) as char
    }

    /// Get the file index (0-7)
    pub fn index(self) -> u8 {
        self.0
    }
}

/// Board coordinate representing a rank (row) on the chessboard
///
/// Values range from 0 (rank 1) to 7 (rank 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(u8);

impl Rank {
    pub fn new(index: u8) -> Option<Self> {
        (index < 8).then_some(Rank(index))
    }

    /// Create a rank from a number (1-8)
    pub fn from_number(n: u8) -> Option<Self> {
        if (1..=8).contains(&n) {
            Some(Rank(n - 1))
        } else {
            None
        }
    }

    /// Convert rank to number (1-8)
    pub fn to_number(self) -> u8 {
        self.0 + 1
    }

    /// Get the rank index (0-7)
    pub fn index(self) -> u8 {
        self.0
    }
}

/// One of the 64 board squares, written algebraically ("e4")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub file: File,
    pub rank: Rank,
}

impl Square {
    pub fn new(file: File, rank: Rank) -> Self {
        Square { file, rank }
    }

    /// Create a square from file and rank indices, `None` if either is off the board
    pub fn from_indices(file: u8, rank: u8) -> Option<Self> {
        Some(Square {
            file: File::new(file)?,
            rank: Rank::new(rank)?,
        })
    }

    /// Inverse of [`Square::index`]
    pub fn from_index(index: u8) -> Option<Self> {
        Square::from_indices(index % 8, index / 8).filter(|_| index < 64)
    }

    /// Create a square from algebraic notation (e.g., "e4")
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let file_char = chars.next()?;
        let rank_char = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let rank_num = rank_char.to_digit(10)? as u8;

        Some(Square {
            file: File::from_char(file_char)?,
            rank: Rank::from_number(rank_num)?,
        })
    }

    pub fn to_algebraic(self) -> String {
        self.to_string()
    }

    /// Index 0 (a1) through 63 (h8)
    pub fn index(self) -> usize {
        self.rank.index() as usize * 8 + self.file.index() as usize
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file.to_char(), self.rank.to_number())
    }
}

impl FromStr for Square {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Square::from_algebraic(s).ok_or_else(|| GameError::ParseSquare {
            input: s.to_string(),
        })
    }
}

/// A move request: origin, destination and an optional promotion piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Square, to: Square, promotion: PieceType) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parse long algebraic / UCI notation ("e2e4", "e7e8q")
    pub fn from_uci(s: &str) -> Option<Self> {
        let s = s.trim();
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = match s[4..].chars().next() {
            Some(c) => Some(PieceType::from_char(c).filter(|p| p.is_promotion_target())?),
            None => None,
        };
        Some(Move {
            from,
            to,
            promotion,
        })
    }

    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::from_uci(s).ok_or_else(|| GameError::ParseMove {
            input: s.to_string(),
        })
    }
}

/// A move the oracle knows to be legal, with the metadata the controller
/// needs for highlighting, logging and the promotion dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMove {
    pub mv: Move,
    /// Piece that moves
    pub piece: Piece,
    /// Standard algebraic description, e.g. "Nxe5+"
    pub san: String,
    pub captured: Option<PieceType>,
    /// Set when this move is only legal with a promotion piece chosen
    pub promotion_eligible: bool,
}
