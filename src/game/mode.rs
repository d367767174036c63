//! Game mode and search depth settings
//!
//! The mode is fixed when a game starts and decides which colors take local
//! board input and when the controller asks the search service for a move on
//! its own. The search depth is the only engine parameter the front end sends.
//!
//! | Mode                 | Local input     | Automatic engine reply |
//! |----------------------|-----------------|------------------------|
//! | `HumanVsHuman`       | both colors     | never                  |
//! | `ComputerVsComputer` | none            | never (shell triggers) |
//! | `WhiteUserVsEngine`  | white           | black                  |
//! | `BlackUserVsEngine`  | black           | white                  |

use super::error::{GameError, GameResult};
use super::types::PieceColor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// Two humans sharing one board
    #[value(alias = "hh")]
    HumanVsHuman,
    /// The engine plays both sides, one move per shell request
    #[value(alias = "cc")]
    ComputerVsComputer,
    /// Human plays White, engine replies as Black
    #[default]
    #[value(alias = "wubc")]
    WhiteUserVsEngine,
    /// Engine opens as White, human plays Black
    #[value(alias = "buwc")]
    BlackUserVsEngine,
}

impl GameMode {
    /// Whether `color` is moved through local board input
    pub fn is_human(self, color: PieceColor) -> bool {
        match self {
            GameMode::HumanVsHuman => true,
            GameMode::ComputerVsComputer => false,
            GameMode::WhiteUserVsEngine => color == PieceColor::White,
            GameMode::BlackUserVsEngine => color == PieceColor::Black,
        }
    }

    /// Whether the controller requests a move for `color` without being asked
    pub fn engine_replies_for(self, color: PieceColor) -> bool {
        match self {
            GameMode::HumanVsHuman | GameMode::ComputerVsComputer => false,
            GameMode::WhiteUserVsEngine => color == PieceColor::Black,
            GameMode::BlackUserVsEngine => color == PieceColor::White,
        }
    }

    /// The mode has the engine make the first move as soon as the game starts
    pub fn engine_moves_first(self) -> bool {
        self.engine_replies_for(PieceColor::White)
    }

    pub fn description(self) -> &'static str {
        match self {
            GameMode::HumanVsHuman => "Human vs Human",
            GameMode::ComputerVsComputer => "Computer vs Computer",
            GameMode::WhiteUserVsEngine => "White user vs engine",
            GameMode::BlackUserVsEngine => "Engine vs black user",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Search depth sent with every best-move request. Always a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct SearchDepth(u32);

impl SearchDepth {
    pub const DEFAULT: SearchDepth = SearchDepth(5);

    pub fn new(depth: i64) -> GameResult<Self> {
        if depth <= 0 {
            return Err(GameError::invalid_argument(format!(
                "search_depth must be positive integer ({depth})"
            )));
        }
        u32::try_from(depth).map(SearchDepth).map_err(|_| {
            GameError::invalid_argument(format!("search_depth is too large ({depth})"))
        })
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for SearchDepth {
    fn default() -> Self {
        SearchDepth::DEFAULT
    }
}

impl fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SearchDepth> for u32 {
    fn from(depth: SearchDepth) -> Self {
        depth.0
    }
}

impl TryFrom<i64> for SearchDepth {
    type Error = GameError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        SearchDepth::new(value)
    }
}

impl TryFrom<i32> for SearchDepth {
    type Error = GameError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        SearchDepth::new(i64::from(value))
    }
}

impl TryFrom<u32> for SearchDepth {
    type Error = GameError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        SearchDepth::new(i64::from(value))
    }
}

impl TryFrom<f64> for SearchDepth {
    type Error = GameError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 || value > i64::MAX as f64 {
            return Err(GameError::invalid_argument(format!(
                "search_depth must be positive integer ({value})"
            )));
        }
        SearchDepth::new(value as i64)
    }
}

impl FromStr for SearchDepth {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s.trim().parse().map_err(|_| {
            GameError::invalid_argument(format!("search_depth is not a number ({s:?})"))
        })?;
        SearchDepth::new(value)
    }
}
