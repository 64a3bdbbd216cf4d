//! Configuration validation
//!
//! Validates configuration and reports issues.

use secrecy::ExposeSecret;

use super::types::answer::AnswerMode;
use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }

    /// Collapse the errors into a single configuration error
    pub fn into_result(self) -> crate::error::Result<()> {
        if self.valid {
            return Ok(());
        }

        let summary = self
            .errors
            .iter()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(crate::error::Error::Config(summary))
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_provider_config(config, result);
    result = validate_answer_config(config, result);
    result = validate_gateway_config(config, result);

    result
}

fn validate_provider_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.provider.api_key.expose_secret().trim().is_empty() {
        result = result.with_error(
            ValidationIssue::new("provider.api_key", "No API key for the completion service")
                .with_suggestion("Set OPENAI_API_KEY or OPENAI_API_KEY_FILE"),
        );
    }

    if let Err(e) = url::Url::parse(&config.provider.base_url) {
        result = result.with_error(
            ValidationIssue::new(
                "provider.base_url",
                format!("Invalid base URL {}: {}", config.provider.base_url, e),
            ),
        );
    }

    if !(0.0..=2.0).contains(&config.provider.temperature) {
        result = result.with_warning(
            ValidationIssue::new(
                "provider.temperature",
                format!("Temperature {} is outside 0.0-2.0", config.provider.temperature),
            ),
        );
    }

    result
}

fn validate_answer_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    match config.answer.mode {
        AnswerMode::Window => {
            if config.answer.window.k == 0 {
                result = result.with_error(
                    ValidationIssue::new("answer.window.k", "Window size must be at least 1")
                        .with_suggestion("Set CHAT_RELAY_WINDOW_K to a positive number"),
                );
            }
        }
        AnswerMode::Retrieval => {
            match config.answer.retrieval.index_path {
                None => {
                    result = result.with_error(
                        ValidationIssue::new(
                            "answer.retrieval.index_path",
                            "Retrieval mode selected but no document index configured",
                        )
                        .with_suggestion("Set CHAT_RELAY_INDEX_PATH"),
                    );
                }
                Some(ref path) if !path.exists() => {
                    result = result.with_error(ValidationIssue::new(
                        "answer.retrieval.index_path",
                        format!("Document index does not exist: {}", path.display()),
                    ));
                }
                Some(_) => {}
            }

            if config.answer.retrieval.top_k == 0 {
                result = result.with_error(ValidationIssue::new(
                    "answer.retrieval.top_k",
                    "At least one chunk must be retrieved",
                ));
            }
        }
    }

    result
}

fn validate_gateway_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if !config.gateway.path.starts_with('/') {
        result = result.with_error(ValidationIssue::new(
            "gateway.path",
            format!("Endpoint path must start with '/': {}", config.gateway.path),
        ));
    } else if crate::gateway::RESERVED_PATHS.contains(&config.gateway.path.as_str()) {
        result = result.with_error(
            ValidationIssue::new(
                "gateway.path",
                format!("Endpoint path {} is already served by the gateway", config.gateway.path),
            )
            .with_suggestion("Use a dedicated path such as /chat"),
        );
    }

    if config.gateway.answer_timeout.is_zero() {
        result = result.with_error(ValidationIssue::new(
            "gateway.answer_timeout",
            "Answer timeout must be greater than zero",
        ));
    } else if config.gateway.answer_timeout > config.provider.timeout {
        result = result.with_warning(
            ValidationIssue::new(
                "gateway.answer_timeout",
                "Answer timeout is longer than the HTTP request timeout",
            )
            .with_suggestion("Raise provider.timeout or lower gateway.answer_timeout"),
        );
    }

    result
}
