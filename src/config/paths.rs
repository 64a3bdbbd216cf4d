//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHAT_RELAY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("chat-relay"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("chat-relay"))
                .unwrap_or_else(|| PathBuf::from(".chat-relay"))
        })
}

/// Get the main configuration file path
///
/// Prefers an explicit `CHAT_RELAY_CONFIG`, then `config.json`, then
/// `config.toml` in the configuration directory.
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHAT_RELAY_CONFIG") {
        return PathBuf::from(path);
    }

    let dir = config_dir();
    let toml = dir.join("config.toml");
    let json = dir.join("config.json");
    if !json.exists() && toml.exists() {
        toml
    } else {
        json
    }
}
