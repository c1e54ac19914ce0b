//! Error types for the inspector.

use std::path::PathBuf;
use thiserror::Error;
use zeq_formats::pfs::PfsError;
use zeq_formats::wld::WldError;
use zeq_formats::zone::ZoneError;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An input file or directory does not exist
    #[error("Input not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// The output location cannot be used
    #[error("Invalid output directory {}: {reason}", path.display())]
    InvalidOutput {
        /// Requested output path
        path: PathBuf,
        /// Reason for rejection
        reason: String,
    },

    /// A fragment type filter is not a supported type tag
    #[error("Unsupported fragment type filter '{0}'")]
    InvalidKind(String),
}

/// Errors raised while running a command.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Archive could not be read
    #[error("Archive error: {0}")]
    Pfs(#[from] PfsError),

    /// Stream could not be decoded
    #[error("WLD error: {0}")]
    Wld(#[from] WldError),

    /// Zone could not be loaded
    #[error("Zone error: {0}")]
    Zone(#[from] ZoneError),

    /// The archive has no entry with the requested name
    #[error("No entry named '{0}' in archive")]
    MissingEntry(String),

    /// Output could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output could not be produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
