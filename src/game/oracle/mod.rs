//! Move legality oracle
//!
//! The controller never evaluates chess rules itself. Everything it needs to
//! know about a position (legal moves from a square, the result of playing a
//! move, whose turn it is, whether the game is over) comes through [`Oracle`].
//! The position type is opaque to the controller: it is stored, forwarded to
//! the oracle and serialized for the board view and search service, nothing
//! more.

mod standard;

pub use standard::{StandardOracle, StandardPosition};

use super::error::GameResult;
use super::types::{CandidateMove, Move, Piece, PieceColor, Square};
use std::fmt;

/// Derived game status, computed on demand from a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: PieceColor },
    Stalemate,
    Draw,
}

impl GameStatus {
    pub fn is_ongoing(self) -> bool {
        matches!(self, GameStatus::Ongoing)
    }

    pub fn winner(self) -> Option<PieceColor> {
        match self {
            GameStatus::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }

    /// Short reason shown in the message log ("Game over: checkmate")
    pub fn message(self) -> &'static str {
        match self {
            GameStatus::Ongoing => "in progress",
            GameStatus::Checkmate { .. } => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Draw => "draw",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of an accepted move: the new position and a description of what was played
#[derive(Debug, Clone)]
pub struct MoveOutcome<P> {
    pub position: P,
    pub record: CandidateMove,
}

/// Chess rules as seen by the controller
pub trait Oracle {
    type Position: Clone + Send + 'static;

    fn initial_position(&self) -> Self::Position;

    /// Legal moves for the side to move, optionally restricted to one origin square.
    /// Promotions appear once per promotion piece.
    fn legal_moves(&self, position: &Self::Position, from: Option<Square>) -> Vec<CandidateMove>;

    /// Play `mv`, returning [`GameError::Legality`](super::error::GameError::Legality)
    /// if it is not legal as given (including a missing promotion piece)
    fn apply_move(&self, position: &Self::Position, mv: Move)
        -> GameResult<MoveOutcome<Self::Position>>;

    fn status(&self, position: &Self::Position) -> GameStatus;

    fn side_to_move(&self, position: &Self::Position) -> PieceColor;

    fn piece_at(&self, position: &Self::Position, square: Square) -> Option<Piece>;

    /// Whether the side to move is in check
    fn is_check(&self, position: &Self::Position) -> bool;

    /// FEN text used by the board view and the search service
    fn serialize(&self, position: &Self::Position) -> String;
}
