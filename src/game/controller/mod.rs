//! Game controller: turn and mode state machine
//!
//! Mediates between the board view, the legality oracle and the remote search
//! service. The controller is single-threaded and cooperative: board events
//! are handled synchronously, and the only suspension point is the best-move
//! request, which is driven by [`GameController::poll_request`] (or awaited
//! with [`GameController::finish_request`]) and settled inside that call.
//!
//! # Flow
//!
//! 1. Lift: the legal moves of the lifted piece are highlighted
//! 2. Drop: the move is checked against the lifted piece's legal moves and
//!    the oracle; a pawn reaching the last rank opens the promotion chooser
//! 3. Accept: position replaced, board re-rendered, observers notified
//! 4. Next turn: local input for the new side, an engine request, or game over

mod legal_moves;
mod state;


pub use legal_moves::LegalMoveSet;
pub use state::{ControllerState, PendingPromotion};

use crate::game::board_view::{BoardInputEvent, BoardView, MarkerKind, PromotionChoice};
use crate::game::error::{GameError, GameResult};
use crate::game::events::{Notification, NotificationKind, Notifier, SubscriptionId};
use crate::game::mode::{GameMode, SearchDepth};
use crate::game::oracle::{GameStatus, MoveOutcome, Oracle};
use crate::game::search::{BestMove, SearchClient};
use crate::game::types::{Move, PieceColor, Square};
use futures::future::BoxFuture;
use futures_lite::future;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Span};
use uuid::Uuid;

type PendingRequest = BoxFuture<'static, GameResult<BestMove>>;

/// One game, from start to game over. There is no in-place reset: start a new
/// game by building a new controller.
pub struct GameController<O: Oracle> {
    game_id: Uuid,
    oracle: O,
    position: O::Position,
    mode: GameMode,
    search_depth: SearchDepth,
    state: ControllerState,
    orientation: PieceColor,
    legal_moves: LegalMoveSet,
    history: Vec<String>,
    view: Box<dyn BoardView>,
    search: Arc<dyn SearchClient>,
    pending_request: Option<PendingRequest>,
    notifier: Notifier,
    started: bool,
}

impl<O: Oracle> GameController<O> {
    /// Controller for a game from the oracle's initial position
    pub fn new(
        oracle: O,
        view: Box<dyn BoardView>,
        search: Arc<dyn SearchClient>,
        mode: GameMode,
    ) -> Self {
        let position = oracle.initial_position();
        let orientation = if mode == GameMode::BlackUserVsEngine {
            PieceColor::Black
        } else {
            PieceColor::White
        };
        Self {
            game_id: Uuid::new_v4(),
            oracle,
            position,
            mode,
            search_depth: SearchDepth::DEFAULT,
            state: ControllerState::Idle,
            orientation,
            legal_moves: LegalMoveSet::default(),
            history: Vec::new(),
            view,
            search,
            pending_request: None,
            notifier: Notifier::new(),
            started: false,
        }
    }

    /// Start from `position` instead of the initial position
    pub fn with_position(mut self, position: O::Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_search_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = depth;
        self
    }

    /// Draw the board and enter the first state for the mode
    ///
    /// `BlackUserVsEngine` issues the engine's opening request here.
    pub fn start(&mut self) -> GameResult<()> {
        if self.started {
            return Err(GameError::InvalidStateTransition {
                message: "game already started".to_string(),
            });
        }
        self.started = true;
        let _span = self.span().entered();
        info!(
            "[CONTROLLER] Starting {} game, depth {}",
            self.mode, self.search_depth
        );

        self.view.set_orientation(self.orientation);
        self.render();
        let status = self.status();
        self.advance_turn(status);
        Ok(())
    }

    pub fn subscribe(
        &mut self,
        kind: NotificationKind,
        listener: impl FnMut(&Notification) + Send + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe(kind, listener)
    }

    pub fn subscribe_all(
        &mut self,
        listener: impl FnMut(&Notification) + Send + 'static,
    ) -> SubscriptionId {
        self.notifier.subscribe_all(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Change the depth sent with the next best-move request
    ///
    /// An outstanding request keeps the depth it was issued with.
    pub fn set_search_depth<D>(&mut self, depth: D) -> GameResult<()>
    where
        D: TryInto<SearchDepth>,
        GameError: From<D::Error>,
    {
        let depth = depth.try_into()?;
        info!("[CONTROLLER] Search depth set to {}", depth);
        self.search_depth = depth;
        Ok(())
    }

    /// Flip which side is drawn at the bottom; no effect on the game
    pub fn switch_orientation(&mut self) {
        self.orientation = self.orientation.opposite();
        self.view.set_orientation(self.orientation);
    }

    /// Handle one input lifecycle event from the board view
    ///
    /// For `PieceLifted` the result says whether the piece may be dragged,
    /// for `DropValidate` whether the drop is accepted. Other events always
    /// return `true`.
    pub fn on_board_input(&mut self, event: BoardInputEvent) -> bool {
        let _span = self.span().entered();
        match event {
            BoardInputEvent::PieceLifted { square, .. } => self.on_piece_lifted(square),
            BoardInputEvent::HoverSquare { from, to } => {
                self.on_hover(from, to);
                true
            }
            BoardInputEvent::DropValidate { from, to } => self.on_drop(from, to),
            BoardInputEvent::InputFinished { accepted, .. } => {
                self.on_input_finished(accepted);
                true
            }
        }
    }

    /// Result of the promotion chooser opened by an earlier drop
    ///
    /// A piece that is not a legal promotion cancels the promotion and is
    /// reported as an error.
    pub fn on_promotion_result(&mut self, choice: PromotionChoice) -> GameResult<()> {
        let _span = self.span().entered();
        let Some(pending) = self.state.pending_promotion() else {
            return Err(GameError::InvalidStateTransition {
                message: "no promotion is pending".to_string(),
            });
        };

        let piece_type = match choice {
            PromotionChoice::Canceled => {
                info!("[CONTROLLER] Promotion on {} canceled", pending.to);
                self.cancel_promotion(pending);
                return Ok(());
            }
            PromotionChoice::Selected(piece_type) => piece_type,
        };

        let mv = Move::with_promotion(pending.from, pending.to, piece_type);
        if !self.legal_moves.contains(&mv) {
            self.cancel_promotion(pending);
            return Err(GameError::invalid_argument(format!(
                "cannot promote to {piece_type}"
            )));
        }

        match self.oracle.apply_move(&self.position, mv) {
            Ok(outcome) => {
                self.legal_moves.clear();
                let status = self.commit(outcome);
                self.advance_turn(status);
                Ok(())
            }
            Err(err) => {
                self.cancel_promotion(pending);
                Err(err)
            }
        }
    }

    /// Ask the search service for a move for the side to move
    pub fn request_engine_move(&mut self) -> GameResult<()> {
        let _span = self.span().entered();
        match self.state {
            ControllerState::RequestInFlight => return Err(GameError::RequestInFlight),
            ControllerState::GameOver(status) => {
                return Err(GameError::InvalidStateTransition {
                    message: format!("game is over ({status})"),
                });
            }
            ControllerState::PromotionPending(_) => {
                return Err(GameError::InvalidStateTransition {
                    message: "a promotion choice is pending".to_string(),
                });
            }
            ControllerState::WaitingForLocalInput(_) | ControllerState::Idle => {}
        }
        self.issue_request();
        Ok(())
    }

    /// Poll the outstanding request once; settles it if the reply is ready
    ///
    /// Returns `true` when a request was settled by this call.
    pub fn poll_request(&mut self) -> bool {
        let Some(request) = self.pending_request.as_mut() else {
            return false;
        };
        let Some(result) = future::block_on(future::poll_once(request)) else {
            return false;
        };
        self.pending_request = None;
        let _span = self.span().entered();
        self.settle(result);
        true
    }

    /// Wait for the outstanding request and settle it
    ///
    /// Returns `false` if no request was outstanding.
    pub async fn finish_request(&mut self) -> bool {
        let Some(request) = self.pending_request.take() else {
            return false;
        };
        let result = request.await;
        let _span = self.span().entered();
        self.settle(result);
        true
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn search_depth(&self) -> SearchDepth {
        self.search_depth
    }

    pub fn orientation(&self) -> PieceColor {
        self.orientation
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.oracle.side_to_move(&self.position)
    }

    pub fn status(&self) -> GameStatus {
        self.oracle.status(&self.position)
    }

    /// Current position as FEN
    pub fn fen(&self) -> String {
        self.oracle.serialize(&self.position)
    }

    /// SAN of every move played so far
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn legal_moves(&self) -> &LegalMoveSet {
        &self.legal_moves
    }

    pub fn is_request_in_flight(&self) -> bool {
        self.state.is_request_in_flight()
    }

    pub fn position(&self) -> &O::Position {
        &self.position
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    fn span(&self) -> Span {
        info_span!("game", id = %self.game_id)
    }

    fn render(&mut self) {
        let fen = self.oracle.serialize(&self.position);
        self.view.render(&fen);
    }

    fn clear_transient_markers(&mut self) {
        self.view.remove_markers(MarkerKind::Selection);
        self.view.remove_markers(MarkerKind::LegalMove);
    }

    fn on_piece_lifted(&mut self, square: Square) -> bool {
        let Some(color) = self.state.input_color() else {
            return false;
        };
        self.legal_moves.clear();
        let owned = self
            .oracle
            .piece_at(&self.position, square)
            .is_some_and(|piece| piece.color == color);
        if !owned {
            return false;
        }

        let candidates = self.oracle.legal_moves(&self.position, Some(square));
        if candidates.is_empty() {
            return false;
        }
        self.legal_moves = LegalMoveSet::new(square, candidates);

        self.clear_transient_markers();
        self.view.add_marker(MarkerKind::Selection, square);
        for destination in self.legal_moves.destinations() {
            self.view.add_marker(MarkerKind::LegalMove, destination);
        }
        true
    }

    fn on_hover(&mut self, from: Square, to: Option<Square>) {
        if self.legal_moves.origin() != Some(from) {
            return;
        }
        self.view.remove_markers(MarkerKind::Selection);
        self.view.add_marker(MarkerKind::Selection, from);
        if let Some(to) = to.filter(|to| self.legal_moves.contains(&Move::new(from, *to))) {
            self.view.add_marker(MarkerKind::Selection, to);
        }
    }

    fn on_drop(&mut self, from: Square, to: Square) -> bool {
        if !self.state.accepts_input() || self.legal_moves.origin() != Some(from) {
            return false;
        }

        // Promotions wait for the chooser; the oracle only ever sees full moves.
        if let Some(candidate) = self.legal_moves.promotion_candidate(from, to) {
            let pending = PendingPromotion {
                from,
                to,
                color: candidate.piece.color,
            };
            info!("[CONTROLLER] Promotion pending on {}", to);
            self.state = ControllerState::PromotionPending(pending);
            self.view.show_promotion_chooser(to, pending.color);
            return true;
        }

        match self.oracle.apply_move(&self.position, Move::new(from, to)) {
            Ok(outcome) => {
                self.legal_moves.clear();
                let status = self.commit(outcome);
                self.advance_turn(status);
                true
            }
            Err(err) => {
                debug!("[CONTROLLER] Drop rejected: {}", err);
                false
            }
        }
    }

    fn on_input_finished(&mut self, accepted: bool) {
        self.clear_transient_markers();
        if self.state.pending_promotion().is_none() {
            self.legal_moves.clear();
        }
        if accepted && !self.state.accepts_input() {
            self.view.disable_input();
        }
    }

    fn cancel_promotion(&mut self, pending: PendingPromotion) {
        self.legal_moves.clear();
        self.state = ControllerState::WaitingForLocalInput(pending.color);
        self.view.enable_input(pending.color);
        self.render();
    }

    /// Install an accepted move and tell observers about it
    fn commit(&mut self, outcome: MoveOutcome<O::Position>) -> GameStatus {
        let MoveOutcome { position, record } = outcome;
        self.position = position;
        self.history.push(record.san.clone());
        self.view.remove_markers(MarkerKind::LastMove);
        self.render();

        let side = self.side_to_move();
        info!(
            "[CONTROLLER] {} played {} ({})",
            record.piece.color, record.san, record.mv
        );
        self.notifier.emit(Notification::TurnChanged(side));
        self.notifier.emit(Notification::LogMessage(record.san));
        if let Some(captured) = record.captured {
            self.notifier
                .emit(Notification::LogMessage(format!("captured {captured}")));
        }

        let status = self.status();
        if status.is_ongoing() && self.oracle.is_check(&self.position) {
            self.notifier.emit(Notification::Check(side));
        }
        status
    }

    /// Enter the state for whoever moves next
    fn advance_turn(&mut self, status: GameStatus) {
        if !status.is_ongoing() {
            self.finish_game(status);
            return;
        }

        let side = self.side_to_move();
        if self.mode.is_human(side) {
            self.state = ControllerState::WaitingForLocalInput(side);
            self.view.enable_input(side);
        } else if self.mode.engine_replies_for(side) {
            self.state = ControllerState::Idle;
            self.issue_request();
        } else {
            self.state = ControllerState::Idle;
            self.view.disable_input();
        }
    }

    fn finish_game(&mut self, status: GameStatus) {
        info!("[CONTROLLER] Game over: {}", status);
        self.state = ControllerState::GameOver(status);
        self.legal_moves.clear();
        self.view.disable_input();
        self.notifier.emit(Notification::GameOver(status));
    }

    fn issue_request(&mut self) {
        self.view.disable_input();
        self.legal_moves.clear();
        self.clear_transient_markers();
        self.state = ControllerState::RequestInFlight;

        let fen = self.fen();
        let depth = self.search_depth;
        info!(
            "[CONTROLLER] Requesting move for {} at depth {}",
            self.side_to_move(),
            depth
        );
        let client = Arc::clone(&self.search);
        self.pending_request = Some(Box::pin(async move {
            client.request_best_move(&fen, depth).await
        }));
        self.notifier.emit(Notification::RequestStarted);
    }

    fn settle(&mut self, result: GameResult<BestMove>) {
        match result.and_then(|best| self.apply_engine_move(best)) {
            Ok(status) if !status.is_ongoing() => {
                self.finish_game(status);
                self.notifier.emit(Notification::RequestDone);
            }
            Ok(status) => {
                self.state = ControllerState::Idle;
                self.notifier.emit(Notification::RequestDone);
                self.advance_turn(status);
            }
            Err(err) => {
                warn!("[CONTROLLER] Best-move request failed: {}", err);
                self.notifier
                    .emit(Notification::LogMessage(format!("request failed: {err}")));
                self.resume_after_failure();
                self.notifier.emit(Notification::RequestDone);
            }
        }
    }

    /// Position unchanged: hand input back if the side to move is human
    fn resume_after_failure(&mut self) {
        let side = self.side_to_move();
        if self.mode.is_human(side) {
            self.state = ControllerState::WaitingForLocalInput(side);
            self.view.enable_input(side);
        } else {
            self.state = ControllerState::Idle;
        }
    }

    fn apply_engine_move(&mut self, best: BestMove) -> GameResult<GameStatus> {
        let outcome = self
            .oracle
            .apply_move(&self.position, best.mv)
            .map_err(|err| GameError::remote(format!("server returned illegal move: {err}")))?;
        debug!(
            "[CONTROLLER] Engine move {} (evaluation {})",
            best.mv, best.evaluation
        );
        let status = self.commit(outcome);
        self.view.add_marker(MarkerKind::LastMove, best.mv.from);
        self.view.add_marker(MarkerKind::LastMove, best.mv.to);
        Ok(status)
    }
}

impl<O: Oracle> std::fmt::Debug for GameController<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameController")
            .field("game_id", &self.game_id)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("search_depth", &self.search_depth)
            .field("fen", &self.fen())
            .finish()
    }
}
