//! Shared helpers for the integration tests
//!
//! [`ScriptedSearch`] answers best-move requests through oneshot channels,
//! so a test decides exactly when (and with what) each request settles.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::oneshot;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use xfchess_front::game::controller::GameController;
use xfchess_front::game::oracle::{GameStatus, MoveOutcome, Oracle, StandardOracle};
use xfchess_front::game::plugin::perform_drag;
use xfchess_front::game::search::{BestMove, BestMoveRequest, SearchClient};
use xfchess_front::game::types::{CandidateMove, Move, Piece, PieceColor, Square};
use xfchess_front::game::{
    GameError, GameMode, GameResult, Notification, NotificationKind, SearchDepth, SharedBoard,
};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub type Reply = oneshot::Sender<GameResult<BestMove>>;

#[derive(Default)]
pub struct ScriptedSearch {
    replies: Mutex<VecDeque<oneshot::Receiver<GameResult<BestMove>>>>,
    requests: Mutex<Vec<BestMoveRequest>>,
}

impl ScriptedSearch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reserve the reply for the next request; it stays pending until sent
    pub fn expect_request(&self) -> Reply {
        let (sender, receiver) = oneshot::channel();
        self.replies.lock().push_back(receiver);
        sender
    }

    /// Requests the controller has actually started (polled at least once)
    pub fn requests(&self) -> Vec<BestMoveRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SearchClient for ScriptedSearch {
    async fn request_best_move(&self, fen: &str, depth: SearchDepth) -> GameResult<BestMove> {
        self.requests.lock().push(BestMoveRequest::new(fen, depth));
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(GameError::remote("reply dropped"))),
            None => Err(GameError::remote("unexpected request")),
        }
    }
}

pub fn best(uci: &str) -> GameResult<BestMove> {
    Ok(BestMove {
        mv: uci.parse().unwrap(),
        evaluation: 0.0,
    })
}

pub fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

/// Standard rules, counting every `apply_move` call
#[derive(Debug, Clone, Default)]
pub struct CountingOracle {
    inner: StandardOracle,
    applied: Arc<AtomicUsize>,
}

impl CountingOracle {
    pub fn apply_count(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }
}

impl Oracle for CountingOracle {
    type Position = <StandardOracle as Oracle>::Position;

    fn initial_position(&self) -> Self::Position {
        self.inner.initial_position()
    }

    fn legal_moves(&self, position: &Self::Position, from: Option<Square>) -> Vec<CandidateMove> {
        self.inner.legal_moves(position, from)
    }

    fn apply_move(
        &self,
        position: &Self::Position,
        mv: Move,
    ) -> GameResult<MoveOutcome<Self::Position>> {
        self.applied.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_move(position, mv)
    }

    fn status(&self, position: &Self::Position) -> GameStatus {
        self.inner.status(position)
    }

    fn side_to_move(&self, position: &Self::Position) -> PieceColor {
        self.inner.side_to_move(position)
    }

    fn piece_at(&self, position: &Self::Position, square: Square) -> Option<Piece> {
        self.inner.piece_at(position, square)
    }

    fn is_check(&self, position: &Self::Position) -> bool {
        self.inner.is_check(position)
    }

    fn serialize(&self, position: &Self::Position) -> String {
        self.inner.serialize(position)
    }
}

/// A controller wired to an observable board, a scripted search client and
/// a notification recorder
pub struct Harness {
    pub controller: GameController<CountingOracle>,
    pub oracle: CountingOracle,
    pub board: SharedBoard,
    pub search: Arc<ScriptedSearch>,
    pub events: Arc<Mutex<Vec<Notification>>>,
}

impl Harness {
    pub fn new(mode: GameMode) -> Self {
        let oracle = CountingOracle::default();
        let board = SharedBoard::new();
        let search = ScriptedSearch::new();
        let mut controller = GameController::new(
            oracle.clone(),
            Box::new(board.clone()),
            search.clone(),
            mode,
        );
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        controller.subscribe_all(move |n| sink.lock().push(n.clone()));
        Self {
            controller,
            oracle,
            board,
            search,
            events,
        }
    }

    pub fn from_fen(mode: GameMode, fen: &str) -> Self {
        let mut harness = Self::new(mode);
        let position = StandardOracle.position_from_fen(fen).unwrap();
        harness.controller = harness.controller.with_position(position);
        harness
    }

    pub fn drag(&mut self, from: &str, to: &str) -> bool {
        perform_drag(&mut self.controller, sq(from), sq(to))
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().clone()
    }

    pub fn take_events(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.events.lock().iter().filter(|n| n.kind() == kind).count()
    }
}
