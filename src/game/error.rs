//! Error types for game module
//!
//! Covers the three recoverable failure families of the controller (bad
//! arguments from the shell, oracle rejections, remote search failures) plus
//! parse and state-transition errors.

/// Errors that can occur in game logic
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Bad input from the shell, e.g. a non-positive search depth
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The legality oracle rejected a move
    #[error("Illegal move {mv}: {message}")]
    Legality { mv: String, message: String },

    /// Transport failure, non-success status or unusable reply from the search service
    #[error("{message}")]
    RemoteRequest { message: String },

    /// A best-move request is already outstanding
    #[error("A best-move request is already in flight")]
    RequestInFlight,

    /// Operation not allowed in the controller's current state
    #[error("Invalid game state transition: {message}")]
    InvalidStateTransition { message: String },

    #[error("Invalid square: {input:?}")]
    ParseSquare { input: String },

    #[error("Invalid move notation: {input:?}")]
    ParseMove { input: String },
}

impl GameError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        GameError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        GameError::RemoteRequest {
            message: message.into(),
        }
    }
}

impl From<std::convert::Infallible> for GameError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
