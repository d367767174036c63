use crate::game::types::{CandidateMove, Move, Square};
use std::collections::{BTreeSet, HashMap};

/// Legal moves of the lifted piece, keyed by the full move
///
/// Rebuilt on every lift and cleared when the drag ends. Promotions appear
/// once per promotion piece, so the bare `from`/`to` key of a promoting pawn
/// is never present.
#[derive(Debug, Clone, Default)]
pub struct LegalMoveSet {
    origin: Option<Square>,
    moves: HashMap<Move, CandidateMove>,
}

impl LegalMoveSet {
    pub fn new(origin: Square, candidates: impl IntoIterator<Item = CandidateMove>) -> Self {
        Self {
            origin: Some(origin),
            moves: candidates.into_iter().map(|c| (c.mv, c)).collect(),
        }
    }

    pub fn clear(&mut self) {
        self.origin = None;
        self.moves.clear();
    }

    pub fn origin(&self) -> Option<Square> {
        self.origin
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn contains(&self, mv: &Move) -> bool {
        self.moves.contains_key(mv)
    }

    pub fn get(&self, mv: &Move) -> Option<&CandidateMove> {
        self.moves.get(mv)
    }

    /// Distinct destination squares
    pub fn destinations(&self) -> BTreeSet<Square> {
        self.moves.keys().map(|mv| mv.to).collect()
    }

    /// Any promotion move from `from` to `to`, if the drop would promote
    pub fn promotion_candidate(&self, from: Square, to: Square) -> Option<&CandidateMove> {
        self.moves
            .values()
            .find(|c| c.promotion_eligible && c.mv.from == from && c.mv.to == to)
    }
}
