//! Error types and handling
//!
//! Each concern of the agent (option parsing, hook launching, correlation
//! records) has its own error enum. They are wrapped in [`AgentError`] for
//! callers that want a single error type.
//!
//! Most agent operations must never abort the host test run, so the public
//! entry points log these errors and swallow them. Only attaching the agent
//! (creating the output directory) surfaces an error to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Agent option parsing errors
#[derive(Error, Debug)]
pub enum OptionsError {
    /// The current directory could not be resolved for a relative output path
    #[error("Failed to resolve output directory '{path}'")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pre-test hook errors
#[derive(Error, Debug)]
pub enum HookError {
    /// The shell process could not be started
    #[error("Failed to spawn pre-test command '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The sync file could not be inspected while waiting for it
    #[error("Failed to access sync file {path}")]
    SyncFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Correlation record errors
#[derive(Error, Debug)]
pub enum RecordError {
    /// Appending to the lookup file failed
    #[error("Failed to write lookup file {path}")]
    Append {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main error enum wrapping all agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    /// Option parsing errors
    #[error("Options error: {0}")]
    Options(#[from] OptionsError),

    /// Pre-test hook errors
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    /// Correlation record errors
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// The output directory could not be created
    #[error("Failed to create output directory {path}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results with AgentError
pub type Result<T> = std::result::Result<T, AgentError>;

/// Render an error and all of its sources on one line
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
