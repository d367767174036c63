use anyhow::Context;
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xfchess_front::core::load_settings;
use xfchess_front::game::{
    ActiveGame, ControllerPlugin, GameController, GameMode, HttpSearchClient, StandardOracle,
};
use xfchess_front::shell::{spawn_stdin_reader, ShellPlugin, TerminalBoard, TerminalScreen};

/// Frame interval of the shell's schedule loop
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Play chess in the terminal against a remote best-move service
#[derive(Debug, Parser)]
#[command(name = "xfchess-front", version, about, long_about = None)]
struct Cli {
    /// Game mode
    #[arg(short, long, value_enum)]
    mode: Option<GameMode>,

    /// Search depth; empty or out-of-range values fall back to the default
    #[arg(short, long)]
    depth: Option<String>,

    /// Scheme and host of the search service, e.g. http://localhost:8081
    #[arg(long)]
    api_prefix: Option<String>,

    /// Settings file (defaults to settings.json in the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log filter, overrides RUST_LOG (e.g. "debug" or "xfchess_front=trace")
    #[arg(long)]
    log: Option<String>,
}

fn init_logging(directive: Option<&str>) -> anyhow::Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter {directive:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;

    let mut settings = load_settings(cli.settings.as_deref());
    if let Some(mode) = cli.mode {
        settings.game_mode = mode;
    }
    if let Some(api_prefix) = cli.api_prefix {
        settings.api_prefix = api_prefix;
    }
    settings.validate().context("invalid settings")?;
    let depth = match cli.depth.as_deref() {
        Some(text) => settings.validate_search_depth(text),
        None => settings.default_depth(),
    };

    // Requests run here; the Bevy schedule only polls them.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("xfchess-search")
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let search = HttpSearchClient::new(
        &settings.api_prefix,
        settings.request_timeout(),
        runtime.handle().clone(),
    )?;
    info!("[SHELL] Search service at {}", search.endpoint());

    let terminal = TerminalBoard::new();
    let controller = GameController::new(
        StandardOracle,
        Box::new(terminal.clone()),
        Arc::new(search),
        settings.game_mode,
    )
    .with_search_depth(depth);
    let mut game = ActiveGame::new(controller);
    game.start()?;

    let inbox = spawn_stdin_reader().context("failed to read from stdin")?;

    let exit = App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(FRAME_INTERVAL)))
        .add_plugins(ControllerPlugin)
        .add_plugins(ShellPlugin::new(settings, cli.settings))
        .insert_resource(game)
        .insert_resource(TerminalScreen(terminal))
        .insert_resource(inbox)
        .run();

    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("exited with code {code}"),
    }
}
