//! Configuration module - Modular configuration management
//!
//! - types/mod.rs: Core configuration types (Config, GatewayConfig, LogConfig)
//! - types/provider.rs: Completion service configuration
//! - types/answer.rs: Answer provider profile configuration
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{Config, GatewayConfig, LogConfig, LogFormat};

// Re-export provider types
pub use types::provider::ProviderConfig;

// Re-export answer profile types
pub use types::answer::{AnswerConfig, AnswerMode, RetrievalConfig, WindowConfig};

// Re-export IO and utilities
pub use io::{
    apply_env_overrides, load_config, load_config_from_path, load_layered_config, read_config_snapshot,
    resolve_api_key, save_config, ConfigSnapshot,
};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
