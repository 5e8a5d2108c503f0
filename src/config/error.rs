//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Invalid Postgres URL format")]
    InvalidPostgresUrl,

    #[error("Invalid service URL: {0}")]
    InvalidServiceUrl(&'static str),

    #[error("Confidence threshold must be within [0, 1]")]
    InvalidConfidenceThreshold,

    #[error("Bot must declare at least one skill: {0}")]
    NoSkillsDeclared(&'static str),
}
