//! PFS archive builder
//!
//! Produces archives laid out the way the reader expects:
//!
//! ```text
//! [header][blocks of file 0]...[blocks of file n][blocks of name table][directory]
//! ```
//!
//! File directory records are ordered by name checksum, with the name table's
//! record last.

use binrw::BinWrite;
use std::io::{Cursor, Seek, SeekFrom, Write};
use tracing::debug;

use super::checksum::name_crc;
use super::error::{PfsError, PfsResult};
use super::header::{BlockHeader, DirectoryEntry, PfsHeader};
use super::inflate::deflate_block;
use super::names::write_names;
use super::{DEFAULT_BLOCK_SIZE, NAME_TABLE_CRC};

/// Builder for PFS archives
#[derive(Debug, Clone)]
pub struct PfsBuilder {
    files: Vec<(String, Vec<u8>)>,
    block_size: usize,
}

impl PfsBuilder {
    /// Create a builder using [`DEFAULT_BLOCK_SIZE`] blocks
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Set the inflated size of each block (at least one byte)
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Queue a file; names are stored lowercase and must be unique
    pub fn add(&mut self, name: &str, data: Vec<u8>) -> PfsResult<()> {
        let name = name.to_ascii_lowercase();
        if name.is_empty() || name.contains('\0') {
            return Err(PfsError::InvalidEntryName(name));
        }
        if self.files.iter().any(|(existing, _)| *existing == name) {
            return Err(PfsError::InvalidEntryName(name));
        }

        self.files.push((name, data));
        Ok(())
    }

    /// Number of queued files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files are queued
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Build the archive into memory
    pub fn build(&self) -> PfsResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write the archive starting at the writer's current position
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> PfsResult<()> {
        let start = writer.stream_position()?;
        PfsHeader::new(0).write(writer)?;

        let mut directory = Vec::with_capacity(self.files.len() + 1);
        for (name, data) in &self.files {
            let offset = self.write_blocks(writer, start, data)?;
            directory.push(DirectoryEntry {
                crc: name_crc(name),
                offset,
                inflated_len: data.len() as u32,
            });
        }
        directory.sort_by_key(|entry| entry.crc);

        let names: Vec<&str> = self.files.iter().map(|(name, _)| name.as_str()).collect();
        let table = write_names(&names);
        let offset = self.write_blocks(writer, start, &table)?;
        directory.push(DirectoryEntry {
            crc: NAME_TABLE_CRC,
            offset,
            inflated_len: table.len() as u32,
        });

        let directory_offset = (writer.stream_position()? - start) as u32;
        (directory.len() as u32).write_le(writer)?;
        for entry in &directory {
            entry.write(writer)?;
        }

        let end = writer.stream_position()?;
        writer.seek(SeekFrom::Start(start))?;
        PfsHeader::new(directory_offset).write(writer)?;
        writer.seek(SeekFrom::Start(end))?;

        debug!(
            "Built PFS archive with {} files ({} bytes)",
            self.files.len(),
            end - start
        );
        Ok(())
    }

    /// Write `data` as a block run, returning the run's offset
    fn write_blocks<W: Write + Seek>(
        &self,
        writer: &mut W,
        start: u64,
        data: &[u8],
    ) -> PfsResult<u32> {
        let offset = (writer.stream_position()? - start) as u32;
        for chunk in data.chunks(self.block_size) {
            let compressed = deflate_block(chunk)?;
            BlockHeader {
                deflated_len: compressed.len() as u32,
                inflated_len: chunk.len() as u32,
            }
            .write(writer)?;
            writer.write_all(&compressed)?;
        }
        Ok(offset)
    }
}

impl Default for PfsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pfs::PfsArchive;
    use binrw::BinRead;

    #[test]
    fn test_build_and_read_back() {
        let mut builder = PfsBuilder::new();
        builder.add("Zone.WLD", b"zone data".to_vec()).unwrap();
        builder.add("objects.wld", b"object data".to_vec()).unwrap();
        builder.add("empty.txt", Vec::new()).unwrap();

        let archive = PfsArchive::from_bytes(&builder.build().unwrap()).unwrap();
        let names: Vec<_> = archive
            .entries()
            .iter()
            .map(|entry| entry.name.as_deref().unwrap())
            .collect();

        // Offset order is insertion order
        assert_eq!(names, vec!["zone.wld", "objects.wld", "empty.txt"]);
        assert_eq!(archive.entry("zone.wld").unwrap().data, b"zone data");
        assert!(archive.entry("empty.txt").unwrap().data.is_empty());
    }

    #[test]
    fn test_directory_sorted_by_checksum() {
        let mut builder = PfsBuilder::new();
        for name in ["c.bmp", "a.bmp", "b.bmp", "d.bmp"] {
            builder.add(name, name.as_bytes().to_vec()).unwrap();
        }
        let bytes = builder.build().unwrap();

        let mut cursor = Cursor::new(&bytes);
        let header = PfsHeader::read(&mut cursor).unwrap();
        cursor.set_position(u64::from(header.directory_offset));
        let count = u32::read_le(&mut cursor).unwrap();
        let records: Vec<DirectoryEntry> = (0..count)
            .map(|_| DirectoryEntry::read(&mut cursor).unwrap())
            .collect();

        assert_eq!(records.len(), 5);
        assert_eq!(records[4].crc, NAME_TABLE_CRC);
        assert!(records[..4].windows(2).all(|w| w[0].crc <= w[1].crc));
        assert_eq!(records[0].crc, records.iter().take(4).map(|r| r.crc).min().unwrap());
    }

    #[test]
    fn test_rejects_bad_names() {
        let mut builder = PfsBuilder::new();
        assert!(builder.add("", Vec::new()).is_err());
        assert!(builder.add("nul\0.txt", Vec::new()).is_err());

        builder.add("Same.txt", Vec::new()).unwrap();
        assert!(matches!(
            builder.add("same.TXT", Vec::new()),
            Err(PfsError::InvalidEntryName(_))
        ));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_empty_builder() {
        let archive = PfsArchive::from_bytes(&PfsBuilder::new().build().unwrap()).unwrap();
        assert!(archive.is_empty());
    }
}
