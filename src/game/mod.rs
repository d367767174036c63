//! Chess game controller
//!
//! Coordinates a board view, a legality oracle and a remote best-move search
//! service for one game in one of four modes.
//!
//! # Module Organization
//!
//! - `types` - squares, pieces, moves and candidate moves
//! - `oracle` - chess rules behind the [`Oracle`] trait ([`StandardOracle`] uses `shakmaty`)
//! - `board_view` - the [`BoardView`] surface and its input events
//! - `search` - the [`SearchClient`] trait and its HTTP transport
//! - `controller` - the [`GameController`] state machine
//! - `events` - notifications for the presentation shell
//! - `plugin` - [`ControllerPlugin`], which runs the controller inside a Bevy app
//!
//! # Turn Flow
//!
//! 1. The board view reports a lift; the controller highlights legal destinations
//! 2. A drop is validated through the oracle (promotions wait for a piece choice)
//! 3. The accepted position is rendered and observers are notified
//! 4. Depending on the mode, the next side gets local input or the engine is asked

pub mod board_view;
pub mod controller;
pub mod error;
pub mod events;
pub mod mode;
pub mod oracle;
pub mod plugin;
pub mod search;
pub mod types;

pub use board_view::{
    BoardInputEvent, BoardModel, BoardView, MarkerKind, PromotionChoice, SharedBoard,
};
pub use controller::{ControllerState, GameController};
pub use error::{GameError, GameResult};
pub use events::{Notification, NotificationKind};
pub use mode::{GameMode, SearchDepth};
pub use oracle::{GameStatus, Oracle, StandardOracle, StandardPosition};
pub use plugin::{ActiveGame, ControllerPlugin};
pub use search::{HttpSearchClient, SearchClient};
