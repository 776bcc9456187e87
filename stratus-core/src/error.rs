//! Error types for stratus.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stratus operations.
pub type Result<T> = std::result::Result<T, StratusError>;

/// Main error type for stratus.
#[derive(Error, Debug)]
pub enum StratusError {
    // Remote stack errors
    #[error("Stack {stack} reached unexpected status {status}")]
    UnexpectedStatus { stack: String, status: String },

    #[error("Provider call {operation} failed for stack {stack}: {reason}")]
    ProviderCall { stack: String, operation: &'static str, reason: String },

    #[error("Stack {stack} cannot proceed: dependency {dependency} failed")]
    DependencyFailed { stack: String, dependency: String },

    #[error("Template for stack {stack} at {path:?} is invalid: {reason}")]
    TemplateInvalid { stack: String, path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid stack config at {path:?}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("Bad interpolation in [{section}] {option}: {reason}")]
    ConfigInterpolation { section: String, option: String, reason: String },

    #[error("Section [{section}] is missing required field '{field}'")]
    MissingField { section: String, field: &'static str },

    #[error("Stack {name} is declared more than once")]
    DuplicateStack { name: String },

    #[error("Missing dependency: stack '{stack}' depends on '{dependency}' which does not exist")]
    MissingDependency { stack: String, dependency: String },

    #[error("Circular dependency detected involving stack: {stack}")]
    CircularDependency { stack: String },

    #[error("Invalid parameters file {path:?}: {reason}")]
    InvalidParameters { path: PathBuf, reason: String },

    #[error("Invalid settings: {reason}")]
    InvalidSettings { reason: String },

    // File system errors
    #[error("File read error: {path:?}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write key pair {key_name} to {path:?}: {source}")]
    KeyPairWrite {
        key_name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StratusError {
    /// Create an Internal error from any error type.
    pub fn internal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Internal(err.to_string())
    }

    /// Name of the stack this error concerns, if any.
    pub fn stack(&self) -> Option<&str> {
        match self {
            Self::UnexpectedStatus { stack, .. }
            | Self::ProviderCall { stack, .. }
            | Self::DependencyFailed { stack, .. }
            | Self::TemplateInvalid { stack, .. }
            | Self::MissingDependency { stack, .. }
            | Self::CircularDependency { stack } => Some(stack),
            Self::DuplicateStack { name } => Some(name),
            _ => None,
        }
    }

    /// True for errors detected before any lifecycle task starts.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. }
                | Self::ConfigInterpolation { .. }
                | Self::MissingField { .. }
                | Self::DuplicateStack { .. }
                | Self::MissingDependency { .. }
                | Self::CircularDependency { .. }
                | Self::InvalidParameters { .. }
                | Self::InvalidSettings { .. }
                | Self::TemplateInvalid { .. }
                | Self::FileReadError { .. }
        )
    }
}
