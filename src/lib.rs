pub mod core;
pub mod game;
pub mod shell;
