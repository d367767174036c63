//! Game Flow Integration Tests
//!
//! Full turns through the public controller API:
//! - Human move, engine reply and last-move highlighting
//! - Rejected drops and promotion choices
//! - Search depth changes around an outstanding request
//! - Request failures and retries
//! - Game over reached by an engine move

mod common;

use common::{best, sq, Harness, START_FEN};
use std::collections::BTreeSet;
use xfchess_front::game::types::{PieceColor, PieceType, Square};
use xfchess_front::game::{
    BoardInputEvent, ControllerState, GameError, GameMode, GameStatus, MarkerKind, Notification,
    NotificationKind, PromotionChoice,
};

const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
const PROMOTION_FEN: &str = "8/1P6/8/8/8/8/6k1/K7 w - - 0 1";
const BEFORE_QH4_MATE: &str = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";

fn squares(names: &[&str]) -> BTreeSet<Square> {
    names.iter().map(|name| sq(name)).collect()
}

fn log_lines(events: &[Notification]) -> Vec<String> {
    events
        .iter()
        .filter_map(|n| match n {
            Notification::LogMessage(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Human Move And Engine Reply
// ============================================================================

#[test]
fn test_human_move_then_engine_reply() {
    //! e2-e4 against the engine: input is locked while the request runs and
    //! the reply is played, rendered and marked as the last move.
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();
    assert_eq!(
        h.controller.state(),
        ControllerState::WaitingForLocalInput(PieceColor::White)
    );
    assert_eq!(h.board.snapshot().input_color(), Some(PieceColor::White));
    h.take_events();

    let reply = h.search.expect_request();
    assert!(h.drag("e2", "e4"));

    assert!(h.controller.is_request_in_flight());
    assert_eq!(h.board.snapshot().input_color(), None);
    assert_eq!(h.board.snapshot().fen(), AFTER_E4);
    assert_eq!(
        h.take_events(),
        vec![
            Notification::TurnChanged(PieceColor::Black),
            Notification::LogMessage("e4".to_string()),
            Notification::RequestStarted,
        ]
    );

    // Reply not sent yet
    assert!(!h.controller.poll_request());
    let requests = h.search.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].fen, AFTER_E4);
    assert_eq!(requests[0].search_depth, 5);

    // No drags while the request runs
    assert!(!h.drag("d2", "d4"));

    reply.send(best("e7e5")).unwrap();
    assert!(h.controller.poll_request());

    assert_eq!(
        h.controller.state(),
        ControllerState::WaitingForLocalInput(PieceColor::White)
    );
    let board = h.board.snapshot();
    assert_eq!(board.fen(), AFTER_E4_E5);
    assert_eq!(board.input_color(), Some(PieceColor::White));
    assert_eq!(board.markers(MarkerKind::LastMove), squares(&["e7", "e5"]));
    assert_eq!(
        h.take_events(),
        vec![
            Notification::TurnChanged(PieceColor::White),
            Notification::LogMessage("e5".to_string()),
            Notification::RequestDone,
        ]
    );
    assert_eq!(h.controller.history(), ["e4", "e5"]);
}

#[test]
fn test_last_move_markers_cleared_by_next_move() {
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();

    let reply = h.search.expect_request();
    h.drag("e2", "e4");
    reply.send(best("e7e5")).unwrap();
    assert!(h.controller.poll_request());

    let _next = h.search.expect_request();
    assert!(h.drag("g1", "f3"));
    assert!(h.board.snapshot().markers(MarkerKind::LastMove).is_empty());
}

#[test]
fn test_illegal_drop_is_silent() {
    //! e2-e5 is refused without a render, notification or request.
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();
    h.take_events();
    let renders = h.board.snapshot().render_count();

    assert!(!h.drag("e2", "e5"));

    assert_eq!(h.controller.fen(), START_FEN);
    assert_eq!(
        h.controller.state(),
        ControllerState::WaitingForLocalInput(PieceColor::White)
    );
    assert!(h.take_events().is_empty());
    assert!(h.search.requests().is_empty());
    let board = h.board.snapshot();
    assert_eq!(board.render_count(), renders);
    assert!(board.markers(MarkerKind::LegalMove).is_empty());
    assert!(board.markers(MarkerKind::Selection).is_empty());
    assert!(h.controller.legal_moves().is_empty());
}

#[test]
fn test_refused_lift_forgets_previous_piece() {
    //! A drop is only valid for the piece lifted last
    let mut h = Harness::new(GameMode::HumanVsHuman);
    h.controller.start().unwrap();

    assert!(h.controller.on_board_input(BoardInputEvent::PieceLifted {
        square: sq("g1"),
        piece: None,
    }));
    assert!(!h.controller.on_board_input(BoardInputEvent::PieceLifted {
        square: sq("e7"),
        piece: None,
    }));
    assert!(h.controller.legal_moves().is_empty());

    assert!(!h.controller.on_board_input(BoardInputEvent::DropValidate {
        from: sq("g1"),
        to: sq("f3"),
    }));
    assert_eq!(h.controller.fen(), START_FEN);
    assert_eq!(h.oracle.apply_count(), 0);
}

#[test]
fn test_threefold_repetition_ends_game() {
    let mut h = Harness::new(GameMode::HumanVsHuman);
    h.controller.start().unwrap();

    for _ in 0..2 {
        assert!(h.drag("g1", "f3"));
        assert!(h.drag("g8", "f6"));
        assert!(h.drag("f3", "g1"));
        assert!(h.drag("f6", "g8"));
    }

    assert_eq!(h.controller.status(), GameStatus::Draw);
    assert_eq!(h.controller.state(), ControllerState::GameOver(GameStatus::Draw));
    assert!(h.events().contains(&Notification::GameOver(GameStatus::Draw)));
    assert!(!h.drag("g1", "f3"));
}

#[test]
fn test_capture_is_logged() {
    let mut h = Harness::new(GameMode::HumanVsHuman);
    h.controller.start().unwrap();

    assert!(h.drag("e2", "e4"));
    assert!(h.drag("d7", "d5"));
    h.take_events();
    assert!(h.drag("e4", "d5"));

    assert_eq!(log_lines(&h.events()), ["exd5", "captured pawn"]);
}

// ============================================================================
// Promotion Tests
// ============================================================================

#[test]
fn test_promotion_waits_for_choice() {
    //! The oracle is asked exactly once, with the fully specified move.
    let mut h = Harness::from_fen(GameMode::WhiteUserVsEngine, PROMOTION_FEN);
    h.controller.start().unwrap();
    let _reply = h.search.expect_request();

    assert!(h.drag("b7", "b8"));
    assert_eq!(h.oracle.apply_count(), 0);
    assert!(matches!(
        h.controller.state(),
        ControllerState::PromotionPending(_)
    ));
    assert_eq!(
        h.board.snapshot().promotion_prompt(),
        Some((sq("b8"), PieceColor::White))
    );
    assert_eq!(h.controller.fen(), PROMOTION_FEN);

    h.controller
        .on_promotion_result(PromotionChoice::Selected(PieceType::Queen))
        .unwrap();

    assert_eq!(h.oracle.apply_count(), 1);
    assert_eq!(h.controller.fen(), "1Q6/8/8/8/8/8/6k1/K7 b - - 0 1");
    assert_eq!(h.controller.history(), ["b8=Q"]);
    assert!(h.controller.is_request_in_flight());
}

#[test]
fn test_underpromotion() {
    let mut h = Harness::from_fen(GameMode::HumanVsHuman, "8/1P5p/8/8/8/8/6k1/K7 w - - 0 1");
    h.controller.start().unwrap();

    assert!(h.drag("b7", "b8"));
    h.controller
        .on_promotion_result(PromotionChoice::Selected(PieceType::Knight))
        .unwrap();

    assert_eq!(h.controller.fen(), "1N6/7p/8/8/8/8/6k1/K7 b - - 0 1");
    assert_eq!(h.controller.history(), ["b8=N"]);
    assert_eq!(
        h.controller.state(),
        ControllerState::WaitingForLocalInput(PieceColor::Black)
    );
}

#[test]
fn test_knight_promotion_against_bare_king_is_draw() {
    //! King and knight against king cannot mate
    let mut h = Harness::from_fen(GameMode::HumanVsHuman, PROMOTION_FEN);
    h.controller.start().unwrap();

    assert!(h.drag("b7", "b8"));
    h.controller
        .on_promotion_result(PromotionChoice::Selected(PieceType::Knight))
        .unwrap();

    assert_eq!(h.controller.state(), ControllerState::GameOver(GameStatus::Draw));
    assert_eq!(h.board.snapshot().input_color(), None);
    assert_eq!(h.events().last(), Some(&Notification::GameOver(GameStatus::Draw)));
}

#[test]
fn test_promotion_cancel_restores_position() {
    let mut h = Harness::from_fen(GameMode::WhiteUserVsEngine, PROMOTION_FEN);
    h.controller.start().unwrap();
    h.take_events();

    assert!(h.drag("b7", "b8"));
    h.controller
        .on_promotion_result(PromotionChoice::Canceled)
        .unwrap();

    assert_eq!(h.oracle.apply_count(), 0);
    assert_eq!(h.controller.fen(), PROMOTION_FEN);
    assert_eq!(h.board.snapshot().fen(), PROMOTION_FEN);
    assert_eq!(h.board.snapshot().input_color(), Some(PieceColor::White));
    assert_eq!(
        h.controller.state(),
        ControllerState::WaitingForLocalInput(PieceColor::White)
    );
    assert!(h.take_events().is_empty());
    assert!(h.search.requests().is_empty());

    // The pawn can be moved again
    assert!(h.drag("b7", "b8"));
}

#[test]
fn test_promotion_result_without_pending_promotion() {
    let mut h = Harness::new(GameMode::HumanVsHuman);
    h.controller.start().unwrap();

    let result = h
        .controller
        .on_promotion_result(PromotionChoice::Selected(PieceType::Queen));
    assert!(matches!(
        result,
        Err(GameError::InvalidStateTransition { .. })
    ));
}

// ============================================================================
// Search Depth Tests
// ============================================================================

#[test]
fn test_invalid_depths_rejected() {
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();

    assert!(matches!(
        h.controller.set_search_depth(0_i64),
        Err(GameError::InvalidArgument { .. })
    ));
    assert!(h.controller.set_search_depth(-3_i64).is_err());
    assert!(h.controller.set_search_depth(2.5_f64).is_err());
    assert!(h.controller.set_search_depth(f64::NAN).is_err());
    assert_eq!(h.controller.search_depth().get(), 5);

    h.controller.set_search_depth(8_i64).unwrap();
    assert_eq!(h.controller.search_depth().get(), 8);
}

#[test]
fn test_depth_change_applies_to_next_request() {
    //! A request keeps the depth it was issued with.
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();

    let reply = h.search.expect_request();
    h.drag("e2", "e4");
    h.controller.set_search_depth(4_i64).unwrap();
    reply.send(best("e7e5")).unwrap();
    assert!(h.controller.poll_request());

    let _second = h.search.expect_request();
    assert!(h.drag("g1", "f3"));
    assert!(!h.controller.poll_request());

    let depths: Vec<u32> = h.search.requests().iter().map(|r| r.search_depth).collect();
    assert_eq!(depths, [5, 4]);
}

// ============================================================================
// Request Failure Tests
// ============================================================================

#[test]
fn test_failed_request_then_retry() {
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();

    let reply = h.search.expect_request();
    h.drag("e2", "e4");
    h.take_events();
    reply
        .send(Err(GameError::remote("server returned bad status 500")))
        .unwrap();
    assert!(h.controller.poll_request());

    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert_eq!(h.controller.fen(), AFTER_E4);
    assert_eq!(h.board.snapshot().input_color(), None);
    assert_eq!(
        h.take_events(),
        vec![
            Notification::LogMessage("request failed: server returned bad status 500".to_string()),
            Notification::RequestDone,
        ]
    );

    let retry = h.search.expect_request();
    h.controller.request_engine_move().unwrap();
    retry.send(best("e7e5")).unwrap();
    assert!(h.controller.poll_request());
    assert_eq!(h.controller.fen(), AFTER_E4_E5);
    assert_eq!(
        h.controller.state(),
        ControllerState::WaitingForLocalInput(PieceColor::White)
    );
}

#[test]
fn test_failed_request_on_human_turn_returns_input() {
    //! "next" on the human's own turn; the failure hands the board back
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();

    let reply = h.search.expect_request();
    h.controller.request_engine_move().unwrap();
    assert_eq!(h.board.snapshot().input_color(), None);
    h.take_events();
    reply.send(Err(GameError::remote("boom"))).unwrap();
    assert!(h.controller.poll_request());

    assert_eq!(h.controller.side_to_move(), PieceColor::White);
    assert_eq!(
        h.controller.state(),
        ControllerState::WaitingForLocalInput(PieceColor::White)
    );
    assert_eq!(h.board.snapshot().input_color(), Some(PieceColor::White));
    assert_eq!(
        h.take_events(),
        vec![
            Notification::LogMessage("request failed: boom".to_string()),
            Notification::RequestDone,
        ]
    );

    let _reply = h.search.expect_request();
    assert!(h.drag("e2", "e4"));
}

#[test]
fn test_illegal_engine_move_is_a_failure() {
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();

    let reply = h.search.expect_request();
    h.drag("e2", "e4");
    reply.send(best("e2e4")).unwrap();
    assert!(h.controller.poll_request());

    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert_eq!(h.controller.fen(), AFTER_E4);
    let failure = log_lines(&h.events())
        .into_iter()
        .find(|line| line.starts_with("request failed: server returned illegal move"));
    assert!(failure.is_some());
}

#[test]
fn test_dropped_reply_is_a_failure() {
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();

    let reply = h.search.expect_request();
    h.drag("e2", "e4");
    drop(reply);
    assert!(h.controller.poll_request());

    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert!(log_lines(&h.events()).contains(&"request failed: reply dropped".to_string()));
}

#[test]
fn test_second_request_refused_while_in_flight() {
    let mut h = Harness::new(GameMode::ComputerVsComputer);
    h.controller.start().unwrap();

    let _reply = h.search.expect_request();
    h.controller.request_engine_move().unwrap();
    assert_eq!(
        h.controller.request_engine_move(),
        Err(GameError::RequestInFlight)
    );
    assert_eq!(h.count(NotificationKind::RequestStarted), 1);
}

// ============================================================================
// Mode Tests
// ============================================================================

#[test]
fn test_engine_opens_for_black_user() {
    let mut h = Harness::new(GameMode::BlackUserVsEngine);
    let reply = h.search.expect_request();
    h.controller.start().unwrap();

    assert!(h.controller.is_request_in_flight());
    assert_eq!(h.board.snapshot().orientation(), PieceColor::Black);
    assert_eq!(h.board.snapshot().input_color(), None);

    assert!(!h.controller.poll_request());
    assert_eq!(h.search.requests()[0].fen, START_FEN);

    reply.send(best("e2e4")).unwrap();
    assert!(h.controller.poll_request());
    assert_eq!(
        h.controller.state(),
        ControllerState::WaitingForLocalInput(PieceColor::Black)
    );
    assert_eq!(h.board.snapshot().input_color(), Some(PieceColor::Black));
}

#[test]
fn test_computer_vs_computer_one_move_per_request() {
    let mut h = Harness::new(GameMode::ComputerVsComputer);
    h.controller.start().unwrap();
    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert!(!h.drag("e2", "e4"));

    let first = h.search.expect_request();
    h.controller.request_engine_move().unwrap();
    first.send(best("e2e4")).unwrap();
    assert!(h.controller.poll_request());
    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert_eq!(h.controller.history(), ["e4"]);
    assert!(!h.controller.poll_request());

    let second = h.search.expect_request();
    h.controller.request_engine_move().unwrap();
    second.send(best("e7e5")).unwrap();
    assert!(h.controller.poll_request());
    assert_eq!(h.controller.history(), ["e4", "e5"]);
    assert_eq!(h.search.requests().len(), 2);
}

#[test]
fn test_finish_request_awaits_reply() {
    let mut h = Harness::new(GameMode::WhiteUserVsEngine);
    h.controller.start().unwrap();
    assert!(!futures::executor::block_on(h.controller.finish_request()));

    let reply = h.search.expect_request();
    h.drag("e2", "e4");
    reply.send(best("c7c5")).unwrap();

    assert!(futures::executor::block_on(h.controller.finish_request()));
    assert_eq!(h.controller.history(), ["e4", "c5"]);
    assert!(!h.controller.is_request_in_flight());
}

// ============================================================================
// Game Over Tests
// ============================================================================

#[test]
fn test_engine_delivers_mate() {
    let mut h = Harness::from_fen(GameMode::WhiteUserVsEngine, BEFORE_QH4_MATE);
    let reply = h.search.expect_request();
    h.controller.start().unwrap();
    assert!(h.controller.is_request_in_flight());

    reply.send(best("d8h4")).unwrap();
    assert!(h.controller.poll_request());

    let mate = GameStatus::Checkmate {
        winner: PieceColor::Black,
    };
    assert_eq!(h.controller.state(), ControllerState::GameOver(mate));
    assert_eq!(h.controller.status(), mate);
    assert_eq!(h.controller.history(), ["Qh4#"]);
    assert_eq!(h.board.snapshot().input_color(), None);
    let events = h.events();
    assert_eq!(
        events[events.len() - 2..],
        [Notification::GameOver(mate), Notification::RequestDone]
    );
    assert_eq!(h.count(NotificationKind::Check), 0);

    assert!(matches!(
        h.controller.request_engine_move(),
        Err(GameError::InvalidStateTransition { .. })
    ));
    assert!(!h.drag("e2", "e4"));
}
