//! Bevy integration for the game controller
//!
//! The controller lives in the [`ActiveGame`] resource. Input arrives as
//! messages, the outstanding best-move request is polled once per frame, and
//! controller notifications are re-published as [`GameNotification`]
//! messages for presentation systems.
//!
//! # System Ordering
//!
//! 1. `dispatch_board_input` - raw board view events
//! 2. `dispatch_shell_commands` - typed moves, promotion choices, settings
//! 3. `poll_search_request` - settles the request when the reply is ready
//! 4. `relay_notifications` - drains the controller's notification outbox

use super::board_view::{BoardInputEvent, PromotionChoice};
use super::controller::GameController;
use super::error::GameError;
use super::events::Notification;
use super::mode::SearchDepth;
use super::oracle::{Oracle, StandardOracle};
use super::types::Square;
use bevy::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The running game
///
/// The controller is not `Sync` (its board view and request future are only
/// `Send`), so it sits behind a mutex; systems with `ResMut` reach it without
/// locking.
#[derive(Resource)]
pub struct ActiveGame {
    controller: Mutex<GameController<StandardOracle>>,
    outbox: Arc<Mutex<Vec<Notification>>>,
}

impl ActiveGame {
    pub fn new(mut controller: GameController<StandardOracle>) -> Self {
        let outbox = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&outbox);
        controller.subscribe_all(move |notification| sink.lock().push(notification.clone()));
        Self {
            controller: Mutex::new(controller),
            outbox,
        }
    }

    pub fn controller_mut(&mut self) -> &mut GameController<StandardOracle> {
        self.controller.get_mut()
    }

    /// Read the controller from a system holding only `Res<ActiveGame>`
    pub fn with<R>(&self, f: impl FnOnce(&GameController<StandardOracle>) -> R) -> R {
        f(&self.controller.lock())
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        self.controller_mut().start()
    }

    fn drain_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.outbox.lock())
    }
}

/// One input lifecycle event from a board surface
#[derive(Message, Debug, Clone, Copy)]
pub struct BoardInput(pub BoardInputEvent);

/// The controller's answer to a [`BoardInput`]
#[derive(Message, Debug, Clone, Copy)]
pub struct BoardInputHandled {
    pub event: BoardInputEvent,
    pub accepted: bool,
}

/// Commands from the presentation shell
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    /// Move a piece as one whole drag (lift, hover, drop, release)
    Drag { from: Square, to: Square },
    Promote(PromotionChoice),
    SetSearchDepth(SearchDepth),
    SwitchOrientation,
    /// "Next move": let the engine move for the side to move
    RequestEngineMove,
}

/// A notification from the controller
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct GameNotification(pub Notification);

/// A [`ShellCommand::Drag`] the controller refused
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRejected {
    pub from: Square,
    pub to: Square,
}

/// A shell command that failed with an error
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct CommandFailed {
    pub command: ShellCommand,
    pub error: GameError,
}

/// The controller's per-frame systems, for ordering shell systems around them
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControllerSystems;

pub struct ControllerPlugin;

impl Plugin for ControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<BoardInput>()
            .add_message::<BoardInputHandled>()
            .add_message::<ShellCommand>()
            .add_message::<GameNotification>()
            .add_message::<MoveRejected>()
            .add_message::<CommandFailed>()
            .add_systems(
                Update,
                (
                    dispatch_board_input,
                    dispatch_shell_commands,
                    poll_search_request,
                    relay_notifications,
                )
                    .chain()
                    .in_set(ControllerSystems)
                    .run_if(resource_exists::<ActiveGame>),
            );

        info!("[CONTROLLER] ControllerPlugin loaded");
    }
}

/// Lift, hover, drop and release, the sequence a board view emits for one drag
pub fn perform_drag<O: Oracle>(
    controller: &mut GameController<O>,
    from: Square,
    to: Square,
) -> bool {
    let lifted = controller.on_board_input(BoardInputEvent::PieceLifted {
        square: from,
        piece: None,
    });
    if !lifted {
        return false;
    }
    controller.on_board_input(BoardInputEvent::HoverSquare { from, to: Some(to) });
    let accepted = controller.on_board_input(BoardInputEvent::DropValidate { from, to });
    controller.on_board_input(BoardInputEvent::InputFinished {
        from,
        to: Some(to),
        accepted,
    });
    accepted
}

fn dispatch_board_input(
    mut game: ResMut<ActiveGame>,
    mut inputs: MessageReader<BoardInput>,
    mut handled: MessageWriter<BoardInputHandled>,
) {
    for BoardInput(event) in inputs.read() {
        let accepted = game.controller_mut().on_board_input(*event);
        handled.write(BoardInputHandled {
            event: *event,
            accepted,
        });
    }
}

fn dispatch_shell_commands(
    mut game: ResMut<ActiveGame>,
    mut commands: MessageReader<ShellCommand>,
    mut rejected: MessageWriter<MoveRejected>,
    mut failed: MessageWriter<CommandFailed>,
) {
    for command in commands.read() {
        let controller = game.controller_mut();
        let result = match *command {
            ShellCommand::Drag { from, to } => {
                if !perform_drag(controller, from, to) {
                    debug!("[CONTROLLER] Move {}{} rejected", from, to);
                    rejected.write(MoveRejected { from, to });
                }
                Ok(())
            }
            ShellCommand::Promote(choice) => controller.on_promotion_result(choice),
            ShellCommand::SetSearchDepth(depth) => controller.set_search_depth(depth),
            ShellCommand::SwitchOrientation => {
                controller.switch_orientation();
                Ok(())
            }
            ShellCommand::RequestEngineMove => controller.request_engine_move(),
        };

        if let Err(error) = result {
            warn!("[CONTROLLER] {:?} failed: {}", command, error);
            failed.write(CommandFailed {
                command: *command,
                error,
            });
        }
    }
}

/// One non-blocking poll per frame
fn poll_search_request(mut game: ResMut<ActiveGame>) {
    if game.controller_mut().poll_request() {
        debug!("[CONTROLLER] Search request settled");
    }
}

fn relay_notifications(game: Res<ActiveGame>, mut notifications: MessageWriter<GameNotification>) {
    for notification in game.drain_notifications() {
        notifications.write(GameNotification(notification));
    }
}
