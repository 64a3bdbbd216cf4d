//! Answer provider configuration types
//!
//! Selects between the bounded-memory chat profile and the
//! retrieval-augmented profile, and carries the knobs for each.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which answer provider profile sessions use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Chat completion with a rolling window of the last k exchanges
    #[default]
    Window,
    /// Question answering over a pre-built document index
    Retrieval,
}

impl std::str::FromStr for AnswerMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_lowercase().as_str() {
            "window" | "chat" => Ok(AnswerMode::Window),
            "retrieval" | "rag" => Ok(AnswerMode::Retrieval),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid answer mode: {}. Valid options: window, retrieval",
                s
            ))),
        }
    }
}

impl std::fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerMode::Window => write!(f, "window"),
            AnswerMode::Retrieval => write!(f, "retrieval"),
        }
    }
}

/// Answer provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Active profile
    #[serde(default)]
    pub mode: AnswerMode,
    /// Bounded-memory settings
    #[serde(default)]
    pub window: WindowConfig,
    /// Retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Bounded-memory profile settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Number of past exchanges kept in the prompt
    #[serde(default = "default_k")]
    pub k: usize,
    /// System prompt override
    pub system_prompt: Option<String>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            k: default_k(),
            system_prompt: None,
        }
    }
}

fn default_k() -> usize {
    3
}

/// Retrieval-augmented profile settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Path to the pre-built document index (JSON)
    pub index_path: Option<PathBuf>,
    /// Number of chunks placed in the answer prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum cosine similarity for a chunk to be used
    #[serde(default)]
    pub min_score: f32,
    /// Number of most recent history entries used for reformulation
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        RetrievalConfig {
            index_path: None,
            top_k: default_top_k(),
            min_score: 0.0,
            max_history: default_max_history(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

fn default_max_history() -> usize {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_mode_parsing() {
        assert_eq!("window".parse::<AnswerMode>().unwrap(), AnswerMode::Window);
        assert_eq!("RAG".parse::<AnswerMode>().unwrap(), AnswerMode::Retrieval);
        assert!("summary".parse::<AnswerMode>().is_err());
    }

    #[test]
    fn test_answer_defaults() {
        let config = AnswerConfig::default();
        assert_eq!(config.mode, AnswerMode::Window);
        assert_eq!(config.window.k, 3);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.max_history, 20);
    }
}
