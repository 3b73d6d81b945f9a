//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/forthwave/config.toml`
//! - macOS: `~/Library/Application Support/forthwave/config.toml`
//! - Windows: `%APPDATA%\forthwave\config.toml`

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "forthwave";

/// File name of the settings file.
pub const CONFIG_FILE: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default settings file path.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Replace a leading `~` component with the user's home directory.
///
/// Other paths, and every path when the home directory is unknown, are
/// returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
