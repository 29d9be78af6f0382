//! Error types for brief-forge operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions
//! - Tool invocation (search, email)
//!
//! Configuration, task-chain and engine errors live next to the modules
//! that produce them (`config`, `tasks`, `engine`).

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: {0} environment variable not set")]
    MissingApiKey(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::config::ConfigError> for LlmError {
    fn from(err: crate::config::ConfigError) -> Self {
        LlmError::Configuration(err.to_string())
    }
}

/// Errors that can occur inside a tool invocation.
///
/// These never escape the tool boundary: every tool converts them into a
/// descriptive text observation so the reasoning loop can see the failure
/// and react to it.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("HTTP error {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
