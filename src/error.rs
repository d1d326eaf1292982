/// Error types for the fallible edges: turn scripts and configuration.
///
/// The engine itself never fails; these only surface where files are
/// read or collaborator payloads are parsed.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain a turn from the turn source.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("failed to read turn script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid turn data in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no scripted response for choice {choice:?}")]
    NoResponse { choice: String },
}

/// Failure to load `config.toml`. Callers fall back to defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
