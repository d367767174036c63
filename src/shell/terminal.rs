//! Text board for the terminal shell

use crate::game::board_view::{BoardModel, BoardView, MarkerKind, SharedBoard};
use crate::game::types::{PieceColor, Square};
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Board view that draws itself as an 8x8 text diagram
///
/// Drawing is deferred: commands only mark the board dirty, and the shell
/// prints one frame per update with [`TerminalBoard::take_frame`]. That way an
/// engine move shows its last-move markers together with the new position.
#[derive(Debug, Clone, Default)]
pub struct TerminalBoard {
    board: SharedBoard,
    dirty: Arc<AtomicBool>,
}

impl TerminalBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BoardModel {
        self.board.snapshot()
    }

    /// The diagram, if anything visible changed since the last call
    pub fn take_frame(&self) -> Option<String> {
        self.dirty
            .swap(false, Ordering::AcqRel)
            .then(|| draw_board(&self.board.snapshot()))
    }

    fn touch(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

impl BoardView for TerminalBoard {
    fn render(&mut self, fen: &str) {
        self.board.render(fen);
        self.touch();
    }

    fn enable_input(&mut self, color: PieceColor) {
        self.board.enable_input(color);
    }

    fn disable_input(&mut self) {
        self.board.disable_input();
    }

    fn add_marker(&mut self, kind: MarkerKind, square: Square) {
        self.board.add_marker(kind, square);
        if kind == MarkerKind::LastMove {
            self.touch();
        }
    }

    fn remove_markers(&mut self, kind: MarkerKind) {
        self.board.remove_markers(kind);
    }

    fn show_promotion_chooser(&mut self, square: Square, color: PieceColor) {
        self.board.show_promotion_chooser(square, color);
    }

    fn set_orientation(&mut self, color: PieceColor) {
        self.board.set_orientation(color);
        self.touch();
    }
}

/// Draw `board` with its orientation side at the bottom
///
/// Empty squares are `.`, squares of the last engine move are bracketed.
pub fn draw_board(board: &BoardModel) -> String {
    let grid = board.grid();
    let (ranks, files): (Vec<u8>, Vec<u8>) = match board.orientation() {
        PieceColor::White => ((0..8).rev().collect(), (0..8).collect()),
        PieceColor::Black => ((0..8).collect(), (0..8).rev().collect()),
    };

    let mut out = String::new();
    for &rank in &ranks {
        let _ = write!(out, "{} |", rank + 1);
        for &file in &files {
            let symbol = grid[rank as usize][file as usize].map_or('.', |p| p.to_fen_char());
            let last_move = Square::from_indices(file, rank)
                .is_some_and(|sq| board.has_marker(MarkerKind::LastMove, sq));
            if last_move {
                let _ = write!(out, "[{symbol}]");
            } else {
                let _ = write!(out, " {symbol} ");
            }
        }
        out.push('\n');
    }
    out.push_str("  +------------------------\n   ");
    for &file in &files {
        let _ = write!(out, " {} ", (b'a' + file) as char);
    }
    out.push('\n');
    out
}
