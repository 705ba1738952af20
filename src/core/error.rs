//! Error types for configuration, preconditions and execution

use std::path::PathBuf;
use thiserror::Error;

/// Failure to split a free-form argument string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("unterminated quote: missing closing {quote}")]
    UnterminatedQuote { quote: char },
}

/// A boolean token outside the accepted set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid boolean value: '{0}'")]
pub struct InvalidBoolean(pub String);

/// Configuration could not be resolved into typed values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Input required and not supplied: {0}")]
    MissingInput(String),

    #[error("Invalid boolean value for input '{input}': '{value}' (expected one of 1/0, true/false, yes/no, y/n, on/off)")]
    InvalidBoolean { input: String, value: String },

    #[error("Could not parse input '{input}': {source}")]
    Tokenize {
        input: String,
        #[source]
        source: TokenizeError,
    },
}

/// The environment is not fit to start running steps
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("Working directory does not exist: {}", .0.display())]
    MissingWorkingDirectory(PathBuf),

    #[error("Forge authentication is not configured: {} must be set to a non-empty value", .0.join(" and "))]
    MissingAuthentication(Vec<&'static str>),
}

/// A subprocess could not be started or did not exit cleanly
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command_line}` failed with exit code {code}")]
    Exit { command_line: String, code: i32 },

    #[error("Command `{command_line}` was terminated by a signal")]
    Signal { command_line: String },

    #[error("Unable to locate bash (tried: {}). Install Git for Windows or set pre-run-shell to pwsh or powershell.", .tried.join(", "))]
    InterpreterNotFound { tried: Vec<String> },

    #[error("Failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// True only when the executable itself could not be found
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RunError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Top-level failure of a deploy run
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error("Step '{step}' failed: {source}")]
    Execution {
        step: String,
        #[source]
        source: RunError,
    },

    #[error("Failed to write to {channel}: {source}")]
    Channel {
        channel: &'static str,
        #[source]
        source: std::io::Error,
    },
}
