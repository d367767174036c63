//! Shell command line parsing

use crate::game::board_view::PromotionChoice;
use crate::game::error::{GameError, GameResult};
use crate::game::types::{Move, PieceType, Square};

pub const HELP: &str = "\
Commands:
  e2e4        move a piece (e7e8q promotes directly)
  q r b n     choose the promotion piece when asked, x cancels
  next        let the engine move (computer vs computer)
  depth [n]   set the search depth; empty selects the default
  flip        switch board orientation
  moves       show the move list
  help        show this text
  quit        leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    },
    Promote(PromotionChoice),
    /// Raw depth text, validated against the settings range by the shell
    Depth(String),
    Next,
    Flip,
    History,
    Help,
    Quit,
}

/// Parse one line typed in the shell
///
/// While the promotion chooser is open, the single letters `q r b n x` are
/// promotion answers.
pub fn parse_line(line: &str, promotion_pending: bool) -> GameResult<ShellInput> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));
    let word = word.to_ascii_lowercase();

    if promotion_pending {
        match word.as_str() {
            "x" | "cancel" => return Ok(ShellInput::Promote(PromotionChoice::Canceled)),
            w if w.len() == 1 => {
                if let Some(piece) = w
                    .chars()
                    .next()
                    .and_then(PieceType::from_char)
                    .filter(|p| p.is_promotion_target())
                {
                    return Ok(ShellInput::Promote(PromotionChoice::Selected(piece)));
                }
            }
            _ => {}
        }
    }

    match word.as_str() {
        "next" | "n" => Ok(ShellInput::Next),
        "depth" | "d" => Ok(ShellInput::Depth(rest.to_string())),
        "flip" | "f" => Ok(ShellInput::Flip),
        "moves" | "history" => Ok(ShellInput::History),
        "help" | "h" | "?" => Ok(ShellInput::Help),
        "quit" | "exit" => Ok(ShellInput::Quit),
        _ => {
            let mv: Move = word.parse().map_err(|_| GameError::ParseMove {
                input: line.to_string(),
            })?;
            Ok(ShellInput::Move {
                from: mv.from,
                to: mv.to,
                promotion: mv.promotion,
            })
        }
    }
}
