//! Zone loading error types

use std::path::PathBuf;
use thiserror::Error;

use crate::pfs::PfsError;
use crate::wld::WldError;

/// Zone loading error type
#[derive(Debug, Error)]
pub enum ZoneError {
    /// The zone's main archive does not exist
    #[error("zone archive not found: {}", .0.display())]
    MissingArchive(PathBuf),

    /// An archive could not be read
    #[error("archive error: {0}")]
    Pfs(#[from] PfsError),

    /// A WLD entry of an archive could not be decoded
    #[error("failed to decode {entry}: {source}")]
    Wld {
        /// Archive entry name
        entry: String,
        /// Decoding failure
        #[source]
        source: WldError,
    },
}

impl ZoneError {
    /// Whether the error comes from malformed file content
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::MissingArchive(_) => false,
            Self::Pfs(err) => err.is_format_error(),
            Self::Wld { source, .. } => source.is_format_error(),
        }
    }
}

/// Result type for zone operations
pub type ZoneResult<T> = Result<T, ZoneError>;
