//! PFS archive error types

use thiserror::Error;

/// PFS-specific error type
#[derive(Debug, Error)]
pub enum PfsError {
    /// Header magic is not "PFS "
    #[error("invalid PFS magic: expected [50 46 53 20], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// A zlib block is corrupt, truncated, or inflates to the wrong size
    #[error("block decompression failed: {0}")]
    Decompression(String),

    /// An entry's blocks claim more bytes than its directory record declares
    #[error("entry at offset {offset} overran its declared size: expected {expected} bytes, got {actual}")]
    BlockOverrun {
        /// Entry offset within the archive
        offset: u32,
        /// Inflated size from the directory
        expected: usize,
        /// Bytes the block stream would produce
        actual: usize,
    },

    /// The trailing file-name entry is malformed
    #[error("invalid file name table: {0}")]
    InvalidNameTable(String),

    /// A builder was given an entry name the archive cannot store
    #[error("invalid entry name: {0:?}")]
    InvalidEntryName(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl PfsError {
    /// Whether the error comes from malformed archive content rather than
    /// from the environment
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            Self::InvalidEntryName(_) => false,
            Self::InvalidMagic(_)
            | Self::Decompression(_)
            | Self::BlockOverrun { .. }
            | Self::InvalidNameTable(_)
            | Self::BinRw(_) => true,
        }
    }
}

/// Result type for PFS operations
pub type PfsResult<T> = Result<T, PfsError>;
