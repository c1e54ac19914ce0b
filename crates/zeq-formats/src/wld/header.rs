//! Stream and record headers

use binrw::{BinRead, BinWrite};
use serde::Serialize;

use super::error::{WldError, WldResult};
use super::{VERSION_NEW, VERSION_OLD, WLD_MAGIC};

/// Stream header (28 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite, Serialize)]
#[brw(little)]
pub struct WldHeader {
    /// Magic word, `0x54503D02`
    pub magic: u32,
    /// Format version; the low bit is a flag and is ignored
    pub version: u32,
    /// Number of fragment records
    pub max_fragment: u32,
    /// Unused by readers
    pub reserved_a: [u32; 2],
    /// Size of the obfuscated name table
    pub name_block_len: u32,
    /// Unused by readers
    pub reserved_b: u32,
}

/// Size of [`WldHeader`] on disk
pub const WLD_HEADER_SIZE: usize = 28;

impl WldHeader {
    /// Create a header for a stream of the given version
    pub fn new(version: WldVersion, max_fragment: u32, name_block_len: u32) -> Self {
        Self {
            magic: WLD_MAGIC,
            version: version.raw(),
            max_fragment,
            reserved_a: [0; 2],
            name_block_len,
            reserved_b: 0,
        }
    }

    /// Check the magic word and classify the version
    pub fn validate(&self) -> WldResult<WldVersion> {
        if self.magic != WLD_MAGIC {
            return Err(WldError::InvalidMagic(self.magic));
        }
        WldVersion::from_raw(self.version)
            .ok_or(WldError::UnsupportedVersion(self.version & !1))
    }
}

/// Format generation of a stream
///
/// Old streams store mesh texture coordinates as 16-bit fixed point, new ones
/// as 32-bit integer pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WldVersion {
    /// Version word `0x00015500`
    Old,
    /// Version word `0x1000C800`
    New,
}

impl WldVersion {
    /// Classify a raw version word, ignoring its low bit
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw & !1 {
            VERSION_OLD => Some(Self::Old),
            VERSION_NEW => Some(Self::New),
            _ => None,
        }
    }

    /// Raw version word
    pub fn raw(self) -> u32 {
        match self {
            Self::Old => VERSION_OLD,
            Self::New => VERSION_NEW,
        }
    }
}

/// Record header (12 bytes)
///
/// `length` covers the name field and the payload but not the length and type
/// fields themselves, so the payload is `length - 4` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct FragmentHeader {
    /// Size of the name field plus payload
    pub length: u32,
    /// Fragment type tag
    pub kind: u32,
    /// Negated name table offset, or non-negative for an anonymous fragment
    pub name_ref: i32,
}

/// Size of [`FragmentHeader`] on disk
pub const FRAGMENT_HEADER_SIZE: usize = 12;

impl FragmentHeader {
    /// Payload size, if `length` covers at least the name field
    pub fn payload_len(&self) -> Option<usize> {
        self.length.checked_sub(4).map(|len| len as usize)
    }
}
