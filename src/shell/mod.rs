//! Terminal presentation shell
//!
//! A thin layer over the controller: it turns typed lines into
//! [`ShellCommand`]s, keeps the turn label and a bounded message log from
//! [`GameNotification`]s, and prints the [`TerminalBoard`] when it changes.
//!
//! # Systems
//!
//! - `read_shell_input` runs before [`ControllerSystems`] so a typed move is
//!   handled in the same frame
//! - `draw_terminal` and `present_notifications` run after it

pub mod commands;
pub mod terminal;

pub use commands::{parse_line, ShellInput, HELP};
pub use terminal::{draw_board, TerminalBoard};

use crate::core::settings::{save_settings, FrontSettings};
use crate::game::board_view::PromotionChoice;
use crate::game::events::Notification;
use crate::game::mode::GameMode;
use crate::game::plugin::{
    ActiveGame, CommandFailed, ControllerSystems, GameNotification, MoveRejected, ShellCommand,
};
use crate::game::types::PieceColor;
use bevy::prelude::*;
use crossbeam_channel::Receiver;
use std::collections::VecDeque;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{info, warn};

/// Lines kept in the message log
pub const MESSAGE_LOG_CAPACITY: usize = 20;

/// Lines typed by the user, fed by a reader thread
#[derive(Resource)]
pub struct ShellInbox(pub Receiver<String>);

/// Read stdin on a background thread so the schedule never blocks on input
pub fn spawn_stdin_reader() -> std::io::Result<ShellInbox> {
    let (sender, receiver) = crossbeam_channel::unbounded();
    std::thread::Builder::new()
        .name("xfchess-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if sender.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(ShellInbox(receiver))
}

/// Board printed by the shell
#[derive(Resource)]
pub struct TerminalScreen(pub TerminalBoard);

/// The most recent messages, oldest first
#[derive(Resource, Debug, Default)]
pub struct MessageLog {
    lines: VecDeque<String>,
}

impl MessageLog {
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        println!("{line}");
        self.lines.push_back(line);
        while self.lines.len() > MESSAGE_LOG_CAPACITY {
            self.lines.pop_front();
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l == line)
    }
}

/// What the shell shows besides the board and the log
#[derive(Resource, Debug, Default)]
pub struct ShellStatus {
    pub turn: PieceColor,
    pub game_over: bool,
    pub request_in_flight: bool,
    promotion_prompted: bool,
}

impl ShellStatus {
    pub fn turn_label(&self) -> &'static str {
        match self.turn {
            PieceColor::White => "White turn",
            PieceColor::Black => "Black turn",
        }
    }

    /// "next" is refused while a request runs and once the game is over
    pub fn next_move_available(&self) -> bool {
        !self.game_over && !self.request_in_flight
    }
}

/// Settings as edited from the shell
#[derive(Resource, Debug)]
pub struct ShellSettings {
    pub settings: FrontSettings,
    pub path: Option<PathBuf>,
    pub persist: bool,
}

pub struct ShellPlugin {
    settings: FrontSettings,
    settings_path: Option<PathBuf>,
    persist_settings: bool,
}

impl ShellPlugin {
    pub fn new(settings: FrontSettings, settings_path: Option<PathBuf>) -> Self {
        Self {
            settings,
            settings_path,
            persist_settings: true,
        }
    }

    /// Keep depth changes in memory only
    pub fn without_persistence(mut self) -> Self {
        self.persist_settings = false;
        self
    }
}

impl Plugin for ShellPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ShellSettings {
            settings: self.settings.clone(),
            path: self.settings_path.clone(),
            persist: self.persist_settings,
        })
        .init_resource::<MessageLog>()
        .init_resource::<ShellStatus>()
        .add_systems(Startup, print_welcome.run_if(resource_exists::<ActiveGame>))
        .add_systems(
            Update,
            (
                read_shell_input.before(ControllerSystems),
                (draw_terminal, present_notifications)
                    .chain()
                    .after(ControllerSystems),
            )
                .run_if(resource_exists::<ActiveGame>),
        );

        info!("[SHELL] ShellPlugin loaded");
    }
}

fn print_welcome(game: Res<ActiveGame>, mut status: ResMut<ShellStatus>) {
    let (mode, depth, side) = game.with(|c| (c.mode(), c.search_depth(), c.side_to_move()));
    status.turn = side;
    println!("{mode} (search depth {depth}). Type \"help\" for commands.");
    if mode == GameMode::ComputerVsComputer {
        println!("Type \"next\" to let the engine move.");
    }
    println!("{}", status.turn_label());
}

fn format_move_list(history: &[String]) -> String {
    history
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn read_shell_input(
    inbox: Option<Res<ShellInbox>>,
    game: Res<ActiveGame>,
    status: Res<ShellStatus>,
    mut shell: ResMut<ShellSettings>,
    mut log: ResMut<MessageLog>,
    mut commands: MessageWriter<ShellCommand>,
    mut exit: MessageWriter<AppExit>,
) {
    let Some(inbox) = inbox else {
        return;
    };

    for line in inbox.0.try_iter() {
        if line.trim().is_empty() {
            continue;
        }
        let promotion_pending = game.with(|c| c.state().pending_promotion().is_some());
        let input = match parse_line(&line, promotion_pending) {
            Ok(input) => input,
            Err(e) => {
                log.push(e.to_string());
                continue;
            }
        };

        match input {
            ShellInput::Move {
                from,
                to,
                promotion,
            } => {
                commands.write(ShellCommand::Drag { from, to });
                if let Some(piece) = promotion {
                    commands.write(ShellCommand::Promote(PromotionChoice::Selected(piece)));
                }
            }
            ShellInput::Promote(choice) => {
                commands.write(ShellCommand::Promote(choice));
            }
            ShellInput::Depth(text) => {
                let depth = shell.settings.validate_search_depth(&text);
                commands.write(ShellCommand::SetSearchDepth(depth));
                log.push(format!("search depth {depth}"));

                shell.settings.default_search_depth = depth.get();
                if shell.persist {
                    if let Err(e) = save_settings(&shell.settings, shell.path.as_deref()) {
                        warn!("[SHELL] Failed to save settings: {}", e);
                    }
                }
            }
            ShellInput::Next => {
                if status.next_move_available() {
                    commands.write(ShellCommand::RequestEngineMove);
                } else {
                    log.push("next move is not available");
                }
            }
            ShellInput::Flip => {
                commands.write(ShellCommand::SwitchOrientation);
            }
            ShellInput::History => {
                let moves = game.with(|c| format_move_list(c.history()));
                println!("{moves}");
            }
            ShellInput::Help => println!("{HELP}"),
            ShellInput::Quit => {
                info!("[SHELL] Quit requested");
                exit.write(AppExit::Success);
            }
        }
    }
}

fn draw_terminal(screen: Option<Res<TerminalScreen>>) {
    if let Some(frame) = screen.and_then(|screen| screen.0.take_frame()) {
        println!("{frame}");
    }
}

fn present_notifications(
    game: Res<ActiveGame>,
    mut notifications: MessageReader<GameNotification>,
    mut rejected: MessageReader<MoveRejected>,
    mut failed: MessageReader<CommandFailed>,
    mut status: ResMut<ShellStatus>,
    mut log: ResMut<MessageLog>,
) {
    for GameNotification(notification) in notifications.read() {
        match notification {
            Notification::TurnChanged(color) => {
                status.turn = *color;
                println!("{}", status.turn_label());
            }
            Notification::Check(color) => log.push(format!("{color} is in check")),
            Notification::GameOver(game_status) => {
                status.game_over = true;
                log.push(format!("Game over: {}", game_status.message()));
            }
            Notification::LogMessage(text) => log.push(text.clone()),
            Notification::RequestStarted => status.request_in_flight = true,
            Notification::RequestDone => status.request_in_flight = false,
        }
    }

    for MoveRejected { from, to } in rejected.read() {
        log.push(format!("illegal move {from}{to}"));
    }
    for CommandFailed { error, .. } in failed.read() {
        log.push(error.to_string());
    }

    let pending = game.with(|c| c.state().pending_promotion());
    match pending {
        Some(promotion) if !status.promotion_prompted => {
            status.promotion_prompted = true;
            println!("Promote on {}: q, r, b or n (x cancels)", promotion.to);
        }
        None => status.promotion_prompted = false,
        Some(_) => {}
    }
}
