//! Board view surface
//!
//! The board view draws positions, shows markers and the promotion chooser,
//! and turns user drags into [`BoardInputEvent`]s. It holds no game logic:
//! the controller tells it which color may be dragged and what to draw, and
//! the surrounding shell feeds its events back into
//! [`GameController::on_board_input`](super::controller::GameController::on_board_input).

use super::types::{Piece, PieceColor, PieceType, Square};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Marker layers the controller draws on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    /// Lifted piece and hovered destination
    Selection,
    /// Destinations of the lifted piece
    LegalMove,
    /// Origin and destination of the last engine move
    LastMove,
}

/// Input lifecycle events emitted by the board view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardInputEvent {
    /// The user picked up the piece on `square`
    PieceLifted {
        square: Square,
        piece: Option<Piece>,
    },
    /// The lifted piece is being dragged over `to` (`None` when off the board)
    HoverSquare { from: Square, to: Option<Square> },
    /// The user released the piece on `to`; the return value decides whether it stays
    DropValidate { from: Square, to: Square },
    /// The drag ended; `accepted` is what the drop validation returned
    InputFinished {
        from: Square,
        to: Option<Square>,
        accepted: bool,
    },
}

/// Result of the promotion chooser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionChoice {
    Selected(PieceType),
    Canceled,
}

/// Commands the controller issues to a board surface
pub trait BoardView: Send {
    /// Draw the position given as FEN
    fn render(&mut self, fen: &str);

    /// Allow dragging pieces of `color`; any other color stays locked
    fn enable_input(&mut self, color: PieceColor);

    fn disable_input(&mut self);

    fn add_marker(&mut self, kind: MarkerKind, square: Square);

    fn remove_markers(&mut self, kind: MarkerKind);

    /// Open the promotion piece chooser over `square`
    fn show_promotion_chooser(&mut self, square: Square, color: PieceColor);

    /// Which side is drawn at the bottom
    fn set_orientation(&mut self, color: PieceColor);
}

/// Everything a [`BoardModel`] was told, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Render(String),
    EnableInput(PieceColor),
    DisableInput,
    AddMarker(MarkerKind, Square),
    RemoveMarkers(MarkerKind),
    ShowPromotionChooser(Square, PieceColor),
    SetOrientation(PieceColor),
}

/// Headless board surface: keeps the current drawing state in memory
///
/// Used directly by the terminal shell and as the observable board in tests.
#[derive(Debug, Clone, Default)]
pub struct BoardModel {
    fen: String,
    input_color: Option<PieceColor>,
    markers: BTreeMap<MarkerKind, BTreeSet<Square>>,
    promotion_prompt: Option<(Square, PieceColor)>,
    orientation: PieceColor,
    commands: Vec<ViewCommand>,
}

impl BoardModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// FEN of the last rendered position (empty before the first render)
    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// Color currently allowed to drag, if any
    pub fn input_color(&self) -> Option<PieceColor> {
        self.input_color
    }

    pub fn markers(&self, kind: MarkerKind) -> BTreeSet<Square> {
        self.markers.get(&kind).cloned().unwrap_or_default()
    }

    pub fn has_marker(&self, kind: MarkerKind, square: Square) -> bool {
        self.markers
            .get(&kind)
            .is_some_and(|squares| squares.contains(&square))
    }

    pub fn promotion_prompt(&self) -> Option<(Square, PieceColor)> {
        self.promotion_prompt
    }

    /// Close the promotion chooser, returning where it was open
    pub fn take_promotion_prompt(&mut self) -> Option<(Square, PieceColor)> {
        self.promotion_prompt.take()
    }

    pub fn orientation(&self) -> PieceColor {
        self.orientation
    }

    pub fn commands(&self) -> &[ViewCommand] {
        &self.commands
    }

    pub fn render_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, ViewCommand::Render(_)))
            .count()
    }

    /// Piece placement of the rendered position, indexed `[rank][file]` from a1
    pub fn grid(&self) -> [[Option<Piece>; 8]; 8] {
        let mut grid = [[None; 8]; 8];
        let placement = self.fen.split_whitespace().next().unwrap_or_default();
        for (row, rank_text) in placement.split('/').take(8).enumerate() {
            let rank = 7 - row;
            let mut file = 0usize;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                    continue;
                }
                let Some(piece_type) = PieceType::from_char(c) else {
                    continue;
                };
                let color = if c.is_ascii_uppercase() {
                    PieceColor::White
                } else {
                    PieceColor::Black
                };
                if file < 8 {
                    grid[rank][file] = Some(Piece::new(color, piece_type));
                }
                file += 1;
            }
        }
        grid
    }
}

impl BoardView for BoardModel {
    fn render(&mut self, fen: &str) {
        self.fen = fen.to_string();
        self.commands.push(ViewCommand::Render(fen.to_string()));
    }

    fn enable_input(&mut self, color: PieceColor) {
        self.input_color = Some(color);
        self.commands.push(ViewCommand::EnableInput(color));
    }

    fn disable_input(&mut self) {
        self.input_color = None;
        self.commands.push(ViewCommand::DisableInput);
    }

    fn add_marker(&mut self, kind: MarkerKind, square: Square) {
        self.markers.entry(kind).or_default().insert(square);
        self.commands.push(ViewCommand::AddMarker(kind, square));
    }

    fn remove_markers(&mut self, kind: MarkerKind) {
        self.markers.remove(&kind);
        self.commands.push(ViewCommand::RemoveMarkers(kind));
    }

    fn show_promotion_chooser(&mut self, square: Square, color: PieceColor) {
        self.promotion_prompt = Some((square, color));
        self.commands.push(ViewCommand::ShowPromotionChooser(square, color));
    }

    fn set_orientation(&mut self, color: PieceColor) {
        self.orientation = color;
        self.commands.push(ViewCommand::SetOrientation(color));
    }
}

/// A [`BoardModel`] that stays readable after being handed to a controller
#[derive(Debug, Clone, Default)]
pub struct SharedBoard(Arc<Mutex<BoardModel>>);

impl SharedBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current board state
    pub fn snapshot(&self) -> BoardModel {
        self.0.lock().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut BoardModel) -> R) -> R {
        f(&mut self.0.lock())
    }
}

impl BoardView for SharedBoard {
    fn render(&mut self, fen: &str) {
        self.0.lock().render(fen);
    }

    fn enable_input(&mut self, color: PieceColor) {
        self.0.lock().enable_input(color);
    }

    fn disable_input(&mut self) {
        self.0.lock().disable_input();
    }

    fn add_marker(&mut self, kind: MarkerKind, square: Square) {
        self.0.lock().add_marker(kind, square);
    }

    fn remove_markers(&mut self, kind: MarkerKind) {
        self.0.lock().remove_markers(kind);
    }

    fn show_promotion_chooser(&mut self, square: Square, color: PieceColor) {
        self.0.lock().show_promotion_chooser(square, color);
    }

    fn set_orientation(&mut self, color: PieceColor) {
        self.0.lock().set_orientation(color);
    }
}
