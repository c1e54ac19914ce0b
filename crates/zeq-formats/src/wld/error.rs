//! WLD error types

use thiserror::Error;

/// WLD-specific error type
#[derive(Debug, Error)]
pub enum WldError {
    /// Stream magic is not `0x54503D02`
    #[error("invalid WLD magic: expected 0x54503D02, got 0x{0:08X}")]
    InvalidMagic(u32),

    /// Version word (low bit masked) is neither known format version
    #[error("unsupported WLD version: 0x{0:08X}")]
    UnsupportedVersion(u32),

    /// A name offset points at bytes with no null terminator before the end
    /// of the name table
    #[error("name at offset {offset} is not terminated within the name table")]
    UnterminatedName {
        /// Byte offset into the name table
        offset: u32,
    },

    /// A name offset is outside the name table or the name is not UTF-8
    #[error("invalid name at offset {offset}")]
    InvalidName {
        /// Byte offset into the name table
        offset: u32,
    },

    /// A read ran past the end of a fragment payload, or the stream ended
    /// before the header, name table, or a record was complete
    #[error("fragment {fragment} truncated at payload offset {position}")]
    Truncated {
        /// 1-based fragment sequence number, 0 for the stream header
        fragment: u32,
        /// Offset of the failed read
        position: u64,
    },

    /// A count field is negative
    #[error("fragment {fragment}: invalid {field} count {count}")]
    InvalidCount {
        /// 1-based fragment sequence number
        fragment: u32,
        /// Name of the count field
        field: &'static str,
        /// Raw value
        count: i64,
    },

    /// A record's length field is too small to cover its name field
    #[error("fragment {fragment}: invalid record length {length}")]
    InvalidRecordLength {
        /// 1-based fragment sequence number
        fragment: u32,
        /// Raw length field
        length: u32,
    },

    /// A decoder left payload bytes unread while strict length checking is on
    #[error("fragment {fragment} (type 0x{kind:02X}) left {remaining} payload bytes unread")]
    TrailingBytes {
        /// 1-based fragment sequence number
        fragment: u32,
        /// Fragment type tag
        kind: u32,
        /// Unread byte count
        remaining: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

impl WldError {
    /// Whether the error comes from malformed stream content
    pub fn is_format_error(&self) -> bool {
        match self {
            Self::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => true,
        }
    }
}

/// Result type for WLD operations
pub type WldResult<T> = Result<T, WldError>;
