//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use super::types::Config;
use crate::error::{Error, Result};

/// A snapshot of the configuration file
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// Path to the config file
    pub path: std::path::PathBuf,
    /// Whether the file exists
    pub exists: bool,
    /// Raw file content
    pub raw: Option<String>,
    /// Parsed configuration
    pub config: Option<Config>,
    /// Validation issues
    pub issues: Vec<String>,
}

/// Load configuration with layered precedence:
/// 1. Config file (config.json / config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
/// 3. API key file, if the key itself is still unset
pub fn load_config() -> Result<Config> {
    let path = super::paths::config_path();
    let config = if path.exists() {
        load_config_from_path(&path)?
    } else {
        Config::default()
    };
    layer_overrides(config)
}

/// Same layering as [`load_config`], with a config file the caller named.
/// The file must exist.
pub fn load_layered_config(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        return Err(Error::Config(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }
    layer_overrides(load_config_from_path(config_path)?)
}

fn layer_overrides(mut config: Config) -> Result<Config> {
    apply_env_overrides(&mut config);
    resolve_api_key(&mut config)?;
    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// This loads the `.env` file and overlays any set environment variables
/// onto the config. Env vars have the highest precedence: defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();
    apply_overrides_with(config, |key| std::env::var(key).ok());
}

fn apply_overrides_with<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Provider overrides
    if let Some(api_key) = var("OPENAI_API_KEY") {
        config.provider.api_key = SecretString::from(api_key);
    }
    if let Some(path) = var("OPENAI_API_KEY_FILE") {
        config.provider.api_key_file = Some(path.into());
    }
    if let Some(url) = var("OPENAI_BASE_URL") {
        config.provider.base_url = url;
    }
    if let Some(model) = var("OPENAI_MODEL") {
        config.provider.model = model;
    }
    if let Some(model) = var("OPENAI_EMBEDDING_MODEL") {
        config.provider.embedding_model = model;
    }
    if let Some(timeout) = var("OPENAI_TIMEOUT") {
        if let Ok(v) = humantime_serde::re::humantime::parse_duration(&timeout) {
            config.provider.timeout = v;
        }
    }

    // Gateway overrides
    if let Some(bind) = var("CHAT_RELAY_BIND") {
        config.gateway.bind = bind;
    }
    if let Some(port) = var("CHAT_RELAY_PORT") {
        if let Ok(port) = port.parse() {
            config.gateway.port = port;
        }
    }
    if let Some(timeout) = var("CHAT_RELAY_ANSWER_TIMEOUT") {
        if let Ok(v) = humantime_serde::re::humantime::parse_duration(&timeout) {
            config.gateway.answer_timeout = v;
        }
    }
    if let Some(question) = var("CHAT_RELAY_OPENING_QUESTION") {
        config.gateway.opening_question = if question.trim().is_empty() {
            None
        } else {
            Some(question)
        };
    }

    // Answer profile overrides
    if let Some(mode) = var("CHAT_RELAY_MODE") {
        if let Ok(mode) = mode.parse() {
            config.answer.mode = mode;
        }
    }
    if let Some(k) = var("CHAT_RELAY_WINDOW_K") {
        if let Ok(k) = k.parse() {
            config.answer.window.k = k;
        }
    }
    if let Some(path) = var("CHAT_RELAY_INDEX_PATH") {
        config.answer.retrieval.index_path = Some(path.into());
    }

    // Logging overrides
    if let Some(level) = var("RUST_LOG") {
        config.log.level = level;
    }
    if let Some(format) = var("LOG_FORMAT") {
        if let Ok(format) = format.parse() {
            config.log.format = format;
        }
    }
    if let Some(file) = var("LOG_FILE") {
        config.log.file = Some(file.into());
    }
    if let Some(level) = var("LOG_FILE_LEVEL") {
        config.log.file_level = level;
    }
}

/// Fill the API key from `provider.api_key_file` when it was not given inline.
pub fn resolve_api_key(config: &mut Config) -> Result<()> {
    if !config.provider.api_key.expose_secret().is_empty() {
        return Ok(());
    }

    if let Some(ref path) = config.provider.api_key_file {
        let key = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read API key file {}: {}", path.display(), e))
        })?;
        config.provider.api_key = SecretString::from(key.trim().to_string());
    }

    Ok(())
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::to_string_pretty(config).map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config).map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}

/// Read a configuration file into a snapshot
pub fn read_config_snapshot(path: &Path) -> ConfigSnapshot {
    if !path.exists() {
        return ConfigSnapshot {
            path: path.to_path_buf(),
            exists: false,
            raw: None,
            config: None,
            issues: vec!["Configuration file does not exist".to_string()],
        };
    }

    let raw = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return ConfigSnapshot {
                path: path.to_path_buf(),
                exists: true,
                raw: None,
                config: None,
                issues: vec![format!("Failed to read file: {}", e)],
            };
        }
    };

    match load_config_from_path(path) {
        Ok(config) => ConfigSnapshot {
            path: path.to_path_buf(),
            exists: true,
            raw: Some(raw),
            config: Some(config),
            issues: Vec::new(),
        },
        Err(e) => ConfigSnapshot {
            path: path.to_path_buf(),
            exists: true,
            raw: Some(raw),
            config: None,
            issues: vec![format!("Failed to parse config: {}", e)],
        },
    }
}
