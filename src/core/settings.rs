//! Front end settings and their persistence
//!
//! Settings are stored as `settings.json` in the user's configuration
//! directory. Load failures fall back to defaults; save failures are
//! reported to the caller, which logs them without interrupting the game.

use super::error::{CoreError, CoreResult};
use crate::game::mode::{GameMode, SearchDepth};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

/// Local search service used during development
pub const DEFAULT_API_PREFIX: &str = "http://localhost:8081";

/// The search service refuses deeper searches
pub const MAX_SERVICE_DEPTH: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontSettings {
    /// Scheme and host of the search service, without the `/api/...` path
    pub api_prefix: String,
    pub default_search_depth: u32,
    pub min_search_depth: u32,
    pub max_search_depth: u32,
    /// Transport timeout for one best-move request
    pub request_timeout_secs: u64,
    pub game_mode: GameMode,
}

impl Default for FrontSettings {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            default_search_depth: SearchDepth::DEFAULT.get(),
            min_search_depth: 1,
            max_search_depth: MAX_SERVICE_DEPTH,
            request_timeout_secs: 30,
            game_mode: GameMode::default(),
        }
    }
}

impl FrontSettings {
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |message: String| Err(CoreError::InvalidSettings { message });

        if self.api_prefix.trim().is_empty() {
            return invalid("api_prefix must not be empty".to_string());
        }
        if self.min_search_depth == 0 {
            return invalid("min_search_depth must be at least 1".to_string());
        }
        if self.min_search_depth > self.max_search_depth {
            return invalid(format!(
                "min_search_depth {} is above max_search_depth {}",
                self.min_search_depth, self.max_search_depth
            ));
        }
        if !(self.min_search_depth..=self.max_search_depth).contains(&self.default_search_depth) {
            return invalid(format!(
                "default_search_depth {} is outside {}..={}",
                self.default_search_depth, self.min_search_depth, self.max_search_depth
            ));
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be positive".to_string());
        }
        Ok(())
    }

    pub fn default_depth(&self) -> SearchDepth {
        SearchDepth::try_from(self.default_search_depth).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Turn the depth text typed in the shell into a depth to use
    ///
    /// Empty input selects the default silently. Anything unparsable or
    /// outside the configured range is reported and replaced by the default.
    pub fn validate_search_depth(&self, input: &str) -> SearchDepth {
        let input = input.trim();
        if input.is_empty() {
            return self.default_depth();
        }

        let range = i64::from(self.min_search_depth)..=i64::from(self.max_search_depth);
        match input.parse::<i64>() {
            Ok(depth) if range.contains(&depth) => {
                SearchDepth::new(depth).unwrap_or_else(|_| self.default_depth())
            }
            Ok(depth) => {
                warn!(
                    "[SETTINGS] Search depth {} outside {}..={}, using default {}",
                    depth, self.min_search_depth, self.max_search_depth, self.default_search_depth
                );
                self.default_depth()
            }
            Err(_) => {
                warn!(
                    "[SETTINGS] Search depth {:?} is not a number, using default {}",
                    input, self.default_search_depth
                );
                self.default_depth()
            }
        }
    }
}

/// `settings.json` in the user's configuration directory
///
/// Falls back to a local `settings.json` if the system config dir cannot be found.
pub fn default_settings_path() -> PathBuf {
    match ProjectDirs::from("com", "trilltino", "XFChessFront") {
        Some(proj_dirs) => proj_dirs.config_dir().join(SETTINGS_FILENAME),
        None => PathBuf::from(SETTINGS_FILENAME),
    }
}

/// Read and validate a settings file
pub fn read_settings(path: &Path) -> CoreResult<FrontSettings> {
    let contents = fs::read_to_string(path)?;
    let settings: FrontSettings = serde_json::from_str(&contents)?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings, using defaults if the file is missing or unusable
pub fn load_settings(path: Option<&Path>) -> FrontSettings {
    let path = path.map_or_else(default_settings_path, Path::to_path_buf);

    if !path.exists() {
        info!("[SETTINGS] No settings file found at {:?}. Using defaults.", path);
        return FrontSettings::default();
    }

    match read_settings(&path) {
        Ok(settings) => {
            info!("[SETTINGS] Loaded settings from {:?}", path);
            settings
        }
        Err(e) => {
            warn!(
                "[SETTINGS] Failed to load settings file at {:?}: {}. Using defaults.",
                path, e
            );
            FrontSettings::default()
        }
    }
}

pub fn save_settings(settings: &FrontSettings, path: Option<&Path>) -> CoreResult<()> {
    let path = path.map_or_else(default_settings_path, Path::to_path_buf);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json)?;
    info!("[SETTINGS] Saved settings to {:?}", path);
    Ok(())
}
