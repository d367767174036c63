//! Standard chess rules backed by `shakmaty`

use super::{GameStatus, MoveOutcome, Oracle};
use crate::game::error::{GameError, GameResult};
use crate::game::types::{CandidateMove, Move, Piece, PieceColor, PieceType, Square};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::Zobrist64;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position, Role};

/// Fifty full moves without a capture or pawn move
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of one position that make a draw
const REPETITION_LIMIT: usize = 3;

/// A `shakmaty` position plus the hashes of every position reached so far,
/// needed for threefold repetition
#[derive(Debug, Clone)]
pub struct StandardPosition {
    chess: Chess,
    seen: Vec<Zobrist64>,
}

impl StandardPosition {
    pub fn new(chess: Chess) -> Self {
        let seen = vec![hash(&chess)];
        Self { chess, seen }
    }

    pub fn chess(&self) -> &Chess {
        &self.chess
    }

    /// How often the current position has occurred, itself included
    pub fn repetitions(&self) -> usize {
        let current = hash(&self.chess);
        self.seen.iter().filter(|&&h| h == current).count()
    }

    fn play(&self, chess: Chess) -> Self {
        let mut seen = self.seen.clone();
        seen.push(hash(&chess));
        Self { chess, seen }
    }
}

fn hash(chess: &Chess) -> Zobrist64 {
    chess.zobrist_hash(EnPassantMode::Legal)
}

/// Oracle for standard chess starting from the usual initial position
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardOracle;

impl StandardOracle {
    /// Parse a FEN into a position this oracle can work with
    pub fn position_from_fen(&self, fen: &str) -> GameResult<StandardPosition> {
        let fen: Fen = fen
            .parse()
            .map_err(|e| GameError::invalid_argument(format!("invalid FEN {fen:?}: {e}")))?;
        let chess: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| GameError::invalid_argument(format!("illegal position: {e}")))?;
        Ok(StandardPosition::new(chess))
    }

    fn candidate(&self, position: &Chess, m: &shakmaty::Move) -> Option<CandidateMove> {
        // Castling is reported king-from/king-to, the way a user drags it.
        let UciMove::Normal {
            from,
            to,
            promotion,
        } = m.clone().to_uci(CastlingMode::Standard)
        else {
            return None;
        };
        let mv = Move {
            from: from_shakmaty_square(from)?,
            to: from_shakmaty_square(to)?,
            promotion: promotion.map(from_role),
        };
        Some(CandidateMove {
            mv,
            piece: Piece::new(from_color(position.turn()), from_role(m.role())),
            san: San::from_move(position, m.clone()).to_string(),
            captured: m.capture().map(from_role),
            promotion_eligible: m.promotion().is_some(),
        })
    }
}

impl Oracle for StandardOracle {
    type Position = StandardPosition;

    fn initial_position(&self) -> StandardPosition {
        StandardPosition::new(Chess::default())
    }

    fn legal_moves(
        &self,
        position: &StandardPosition,
        from: Option<Square>,
    ) -> Vec<CandidateMove> {
        let chess = position.chess();
        let origin = from.map(to_shakmaty_square);
        chess
            .legal_moves()
            .iter()
            .filter(|m| origin.is_none() || m.from() == origin)
            .filter_map(|m| self.candidate(chess, m))
            .collect()
    }

    fn apply_move(
        &self,
        position: &StandardPosition,
        mv: Move,
    ) -> GameResult<MoveOutcome<StandardPosition>> {
        let illegal = |message: String| GameError::Legality {
            mv: mv.to_string(),
            message,
        };
        let chess = position.chess();
        let uci = UciMove::Normal {
            from: to_shakmaty_square(mv.from),
            to: to_shakmaty_square(mv.to),
            promotion: mv.promotion.map(to_role),
        };
        let m = uci.to_move(chess).map_err(|e| illegal(e.to_string()))?;
        let mut record = self
            .candidate(chess, &m)
            .ok_or_else(|| illegal("move cannot be expressed as from/to squares".to_string()))?;
        let next = chess.clone().play(m).map_err(|e| illegal(e.to_string()))?;
        if next.is_checkmate() {
            record.san.push('#');
        } else if next.is_check() {
            record.san.push('+');
        }
        Ok(MoveOutcome {
            position: position.play(next),
            record,
        })
    }

    fn status(&self, position: &StandardPosition) -> GameStatus {
        let chess = position.chess();
        if chess.is_checkmate() {
            GameStatus::Checkmate {
                winner: from_color(chess.turn()).opposite(),
            }
        } else if chess.is_stalemate() {
            GameStatus::Stalemate
        } else if chess.is_insufficient_material()
            || chess.halfmoves() >= FIFTY_MOVE_HALFMOVES
            || position.repetitions() >= REPETITION_LIMIT
        {
            GameStatus::Draw
        } else {
            GameStatus::Ongoing
        }
    }

    fn side_to_move(&self, position: &StandardPosition) -> PieceColor {
        from_color(position.chess().turn())
    }

    fn piece_at(&self, position: &StandardPosition, square: Square) -> Option<Piece> {
        position
            .chess()
            .board()
            .piece_at(to_shakmaty_square(square))
            .map(|p| Piece::new(from_color(p.color), from_role(p.role)))
    }

    fn is_check(&self, position: &StandardPosition) -> bool {
        position.chess().is_check()
    }

    fn serialize(&self, position: &StandardPosition) -> String {
        Fen::from_position(position.chess(), EnPassantMode::Legal).to_string()
    }
}

fn to_shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::new(square.index() as u32)
}

fn from_shakmaty_square(square: shakmaty::Square) -> Option<Square> {
    Square::from_index(square as u8)
}

fn from_color(color: Color) -> PieceColor {
    match color {
        Color::White => PieceColor::White,
        Color::Black => PieceColor::Black,
    }
}

fn from_role(role: Role) -> PieceType {
    match role {
        Role::Pawn => PieceType::Pawn,
        Role::Knight => PieceType::Knight,
        Role::Bishop => PieceType::Bishop,
        Role::Rook => PieceType::Rook,
        Role::Queen => PieceType::Queen,
        Role::King => PieceType::King,
    }
}

fn to_role(piece_type: PieceType) -> Role {
    match piece_type {
        PieceType::Pawn => Role::Pawn,
        PieceType::Knight => Role::Knight,
        PieceType::Bishop => Role::Bishop,
        PieceType::Rook => Role::Rook,
        PieceType::Queen => Role::Queen,
        PieceType::King => Role::King,
    }
}
