//! Remote best-move search
//!
//! The engine runs behind an HTTP service. The controller only knows the
//! [`SearchClient`] trait; [`HttpSearchClient`] is the production transport.
//!
//! Wire format (`POST {api_prefix}/api/get_best_move`):
//!
//! ```json
//! request:  { "search_depth": 5, "fen": "rnbqkbnr/... w KQkq - 0 1" }
//! response: { "m": "e7e5", "value": -0.25 }
//! ```

mod http;

pub use http::HttpSearchClient;

use super::error::{GameError, GameResult};
use super::mode::SearchDepth;
use super::types::Move;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Path appended to the configured API prefix
pub const BEST_MOVE_PATH: &str = "/api/get_best_move";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestMoveRequest {
    pub search_depth: u32,
    pub fen: String,
}

impl BestMoveRequest {
    pub fn new(fen: impl Into<String>, depth: SearchDepth) -> Self {
        Self {
            search_depth: depth.get(),
            fen: fen.into(),
        }
    }
}

/// Raw reply body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestMoveResponse {
    /// Move in UCI notation
    pub m: String,
    /// Engine evaluation; the controller does not interpret it
    #[serde(default)]
    pub value: f64,
}

/// A decoded engine reply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMove {
    pub mv: Move,
    pub evaluation: f64,
}

impl TryFrom<BestMoveResponse> for BestMove {
    type Error = GameError;

    fn try_from(response: BestMoveResponse) -> Result<Self, Self::Error> {
        let mv = Move::from_uci(&response.m).ok_or_else(|| {
            GameError::remote(format!("server returned malformed move {:?}", response.m))
        })?;
        Ok(BestMove {
            mv,
            evaluation: response.value,
        })
    }
}

/// Asynchronous source of engine moves
///
/// Implementations must resolve every call exactly once, with either a move
/// or a [`GameError::RemoteRequest`].
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn request_best_move(&self, fen: &str, depth: SearchDepth) -> GameResult<BestMove>;
}
