//! Configuration types module
//!
//! Re-exports all configuration types.

pub mod answer;
pub mod provider;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion service configuration
    #[serde(default)]
    pub provider: provider::ProviderConfig,

    /// Answer provider profile configuration
    #[serde(default)]
    pub answer: answer::AnswerConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from environment variables and files
    ///
    /// It loads configuration from:
    /// 1. Default values
    /// 2. Config file (if present)
    /// 3. Environment variable overrides
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Path of the chat WebSocket endpoint
    #[serde(default = "default_path")]
    pub path: String,
    /// Upper bound on a single answer provider call
    #[serde(default = "default_answer_timeout", with = "humantime_serde")]
    pub answer_timeout: Duration,
    /// Question sent to the provider as soon as a client connects.
    /// `None` skips the opening exchange.
    #[serde(default = "default_opening_question")]
    pub opening_question: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            port: default_port(),
            bind: default_bind(),
            path: default_path(),
            answer_timeout: default_answer_timeout(),
            opening_question: default_opening_question(),
        }
    }
}

fn default_port() -> u16 {
    9000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_path() -> String {
    "/chat".to_string()
}

fn default_answer_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_opening_question() -> Option<String> {
    Some(crate::agent::prompts::OPENING_QUESTION.to_string())
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid log format: {}. Valid options: pretty, json",
                s
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Stdout filter (`RUST_LOG` syntax)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
    /// Optional log file, written alongside stdout
    pub file: Option<PathBuf>,
    /// Filter for the log file
    #[serde(default = "default_file_log_level")]
    pub file_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
            file_level: default_file_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_log_level() -> String {
    "debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.path, "/chat");
        assert_eq!(config.gateway.answer_timeout, Duration::from_secs(60));
        assert!(config.gateway.opening_question.is_some());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_gateway_timeout_is_human_readable() {
        let gateway: GatewayConfig =
            serde_json::from_str(r#"{ "answer_timeout": "90s", "opening_question": null }"#).unwrap();
        assert_eq!(gateway.answer_timeout, Duration::from_secs(90));
        assert!(gateway.opening_question.is_none());
    }
}
