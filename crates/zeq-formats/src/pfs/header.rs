//! Fixed-layout PFS structures

use binrw::{BinRead, BinWrite};

use super::PFS_MAGIC;
use super::error::{PfsError, PfsResult};

/// Archive header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct PfsHeader {
    /// Absolute offset of the directory
    pub directory_offset: u32,
    /// Magic bytes: "PFS "
    pub magic: [u8; 4],
    /// Format version word, ignored by readers
    pub reserved: u32,
}

impl PfsHeader {
    /// Version word written by [`PfsBuilder`](super::PfsBuilder)
    pub const VERSION: u32 = 0x0002_0000;

    /// Create a header pointing at `directory_offset`
    pub fn new(directory_offset: u32) -> Self {
        Self {
            directory_offset,
            magic: PFS_MAGIC,
            reserved: Self::VERSION,
        }
    }

    /// Check the magic bytes
    pub fn validate(&self) -> PfsResult<()> {
        if self.magic != PFS_MAGIC {
            return Err(PfsError::InvalidMagic(self.magic));
        }
        Ok(())
    }
}

/// One directory record (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DirectoryEntry {
    /// Checksum of the entry's file name
    pub crc: u32,
    /// Absolute offset of the entry's first block header
    pub offset: u32,
    /// Total inflated size of the entry
    pub inflated_len: u32,
}

/// Header preceding every compressed block (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct BlockHeader {
    /// Size of the zlib stream that follows
    pub deflated_len: u32,
    /// Size of the block once inflated
    pub inflated_len: u32,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let bytes = [
            0x10, 0x00, 0x00, 0x00, b'P', b'F', b'S', b' ', 0x00, 0x00, 0x02, 0x00,
        ];
        let header = PfsHeader::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(header.directory_offset, 16);
        assert_eq!(header, PfsHeader::new(16));
        header.validate().unwrap();

        let mut written = Cursor::new(Vec::new());
        header.write(&mut written).unwrap();
        assert_eq!(written.into_inner(), bytes);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let header = PfsHeader {
            directory_offset: 0,
            magic: *b"PKZ\x03",
            reserved: 0,
        };
        assert!(matches!(
            header.validate(),
            Err(PfsError::InvalidMagic(magic)) if magic == *b"PKZ\x03"
        ));
    }

    #[test]
    fn test_directory_entry_is_little_endian() {
        let bytes = [1, 0, 0, 0, 2, 1, 0, 0, 3, 0, 0, 0];
        let entry = DirectoryEntry::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(
            entry,
            DirectoryEntry {
                crc: 1,
                offset: 0x102,
                inflated_len: 3,
            }
        );
    }
}
