//! Engine error types.

use std::path::PathBuf;

use levelbar_types::SnapshotError;
use thiserror::Error;

/// Why a fetch produced no snapshot.
///
/// Never surfaces past [`Fetcher::fetch`](crate::Fetcher::fetch), which logs it
/// and substitutes the zero snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source command could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The source command ran but reported failure.
    #[error("{program} failed ({status}): {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    /// The source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source output is not a snapshot.
    #[error(transparent)]
    Parse(#[from] SnapshotError),
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("RON serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
