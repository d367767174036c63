//! Controller turn state
//!
//! Tracks whose input the board accepts and whether the controller is waiting
//! on the search service or on the promotion chooser. Exactly one state is
//! active; every transition happens inside a controller call.

use crate::game::oracle::GameStatus;
use crate::game::types::{PieceColor, Square};
use std::fmt;

/// A pawn drop waiting for the user to pick a promotion piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub from: Square,
    pub to: Square,
    /// Color of the promoting pawn
    pub color: PieceColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Local board input is enabled for this color only
    ///
    /// Valid transitions: → PromotionPending, → RequestInFlight,
    /// → WaitingForLocalInput (other color), → GameOver, → Idle
    WaitingForLocalInput(PieceColor),

    /// A best-move request is outstanding; local input is disabled
    ///
    /// Valid transitions: → Idle (on settlement, then turn-appropriate state)
    RequestInFlight,

    /// A pawn was dropped on the last rank and the chooser is open
    ///
    /// Valid transitions: → WaitingForLocalInput (cancel), → any post-move state
    PromotionPending(PendingPromotion),

    /// Nobody may move locally and no request is outstanding
    ///
    /// Computer vs computer between "next move" triggers, before `start`, or
    /// after a failed request.
    #[default]
    Idle,

    /// Terminal
    GameOver(GameStatus),
}

impl ControllerState {
    /// Board drags are processed in this state
    pub fn accepts_input(&self) -> bool {
        matches!(self, ControllerState::WaitingForLocalInput(_))
    }

    /// Color whose pieces may be lifted, if any
    pub fn input_color(&self) -> Option<PieceColor> {
        match self {
            ControllerState::WaitingForLocalInput(color) => Some(*color),
            _ => None,
        }
    }

    pub fn is_request_in_flight(&self) -> bool {
        matches!(self, ControllerState::RequestInFlight)
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, ControllerState::GameOver(_))
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        match self {
            ControllerState::PromotionPending(pending) => Some(*pending),
            _ => None,
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::WaitingForLocalInput(color) => write!(f, "waiting for {color}"),
            ControllerState::RequestInFlight => f.write_str("request in flight"),
            ControllerState::PromotionPending(p) => {
                write!(f, "promotion pending {}{}", p.from, p.to)
            }
            ControllerState::Idle => f.write_str("idle"),
            ControllerState::GameOver(status) => write!(f, "game over ({status})"),
        }
    }
}
