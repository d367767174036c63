//! Core module - settings and configuration shared by the front end
//!
//! # Architecture
//!
//! - **`settings`**: [`FrontSettings`] with JSON persistence under the
//!   platform config directory, and shell-side search depth validation
//! - **`error`**: [`CoreError`] for settings I/O and validation

pub mod error;
pub mod settings;

pub use error::{CoreError, CoreResult};
pub use settings::{default_settings_path, load_settings, save_settings, FrontSettings};
