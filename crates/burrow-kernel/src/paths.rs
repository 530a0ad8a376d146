//! XDG base directory paths for burrow.
//!
//! | Purpose | XDG Variable | Default | burrow Path |
//! |---------|--------------|---------|-------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/burrow/config.toml` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/burrow` or falls back to `~/.config/burrow`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("burrow")
}

/// Path of the config file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// The user's home directory, if one can be determined.
pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
}

fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
