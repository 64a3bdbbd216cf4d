//! Provider configuration types
//!
//! Configuration for the OpenAI-compatible completion service.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key
    #[serde(skip_serializing, default = "default_secret")]
    pub api_key: SecretString,
    /// File holding the API key, read at startup when `api_key` is empty
    pub api_key_file: Option<PathBuf>,
    /// Base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chat completion model
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding model used for retrieval queries
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,
    /// Maximum tokens to generate per answer
    pub max_tokens: Option<u32>,
    /// HTTP request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            api_key: default_secret(),
            api_key_file: None,
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: 0.0,
            max_tokens: None,
            timeout: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}
