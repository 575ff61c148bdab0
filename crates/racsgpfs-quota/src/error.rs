//! Error types for quota sources and their configuration.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A quota report could not be obtained from one source.
///
/// Scoped to a single source: the publisher logs it and moves on.
#[derive(Debug, Error)]
pub enum CommandFailure {
    #[error("source {source_name}: failed to start {program}: {error}")]
    Spawn {
        source_name: String,
        program: String,
        #[source]
        error: std::io::Error,
    },

    #[error("source {source_name}: {program} exited with {status}: {stderr}")]
    Exit {
        source_name: String,
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("source {source_name}: {program} did not finish within {timeout:?}")]
    Timeout {
        source_name: String,
        program: String,
        timeout: Duration,
    },

    #[error("source {source_name}: reading output of {program} failed: {error}")]
    Io {
        source_name: String,
        program: String,
        #[source]
        error: std::io::Error,
    },
}

impl CommandFailure {
    /// Name of the source that failed.
    pub fn source_name(&self) -> &str {
        match self {
            CommandFailure::Spawn { source_name, .. }
            | CommandFailure::Exit { source_name, .. }
            | CommandFailure::Timeout { source_name, .. }
            | CommandFailure::Io { source_name, .. } => source_name,
        }
    }
}

/// Invalid source configuration. Only ever fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no quota sources configured")]
    NoSources,

    #[error("duplicate source name: {0}")]
    DuplicateSource(String),

    #[error("source {source_name}: {message}")]
    Invalid { source_name: String, message: String },
}
