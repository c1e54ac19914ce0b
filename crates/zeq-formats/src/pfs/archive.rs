//! Archive reading and entry reassembly

use binrw::BinRead;
use memmap2::MmapOptions;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

use super::BLOCK_HEADER_SIZE;
use super::error::{PfsError, PfsResult};
use super::header::{BlockHeader, DirectoryEntry, PfsHeader};
use super::inflate::inflate_block;
use super::names::parse_names;
use crate::buffer::{ByteBuffer, MergeBuffer};

/// One file extracted from an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PfsEntry {
    /// Lowercase file name, if the name table covers this entry
    pub name: Option<String>,
    /// Name checksum from the directory
    pub crc: u32,
    /// Offset of the entry's first block within the archive
    pub offset: u32,
    /// Inflated contents
    pub data: Vec<u8>,
}

impl PfsEntry {
    /// Inflated size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File extension without the dot, e.g. `"wld"`
    pub fn extension(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension)
    }
}

/// A fully extracted PFS archive
///
/// Entries are kept in ascending offset order, which is the order the name
/// table lists them in. The name table entry itself is not exposed.
#[derive(Debug, Clone, Default)]
pub struct PfsArchive {
    entries: Vec<PfsEntry>,
}

impl PfsArchive {
    /// Extract every entry of an archive
    pub fn read<R: Read + Seek>(reader: &mut R) -> PfsResult<Self> {
        let header = PfsHeader::read(reader)?;
        header.validate()?;

        reader.seek(SeekFrom::Start(u64::from(header.directory_offset)))?;
        let count = u32::read_le(reader)?;

        let mut directory = Vec::new();
        for _ in 0..count {
            directory.push(DirectoryEntry::read(reader)?);
        }
        // Directories are stored in checksum order; names follow offset order
        directory.sort_by_key(|entry| entry.offset);

        debug!(
            "PFS directory at 0x{:X} lists {} entries",
            header.directory_offset, count
        );

        let mut entries = Vec::with_capacity(directory.len());
        for record in &directory {
            let data = read_entry(reader, record)?;
            entries.push(PfsEntry {
                name: None,
                crc: record.crc,
                offset: record.offset,
                data,
            });
        }

        let Some(name_entry) = entries.pop() else {
            return Ok(Self::default());
        };

        let names = parse_names(&name_entry.data)?;
        if names.len() > entries.len() {
            return Err(PfsError::InvalidNameTable(format!(
                "{} names for {} entries",
                names.len(),
                entries.len()
            )));
        }
        if names.len() < entries.len() {
            debug!(
                "{} entries have no name in the file name table",
                entries.len() - names.len()
            );
        }

        for (entry, name) in entries.iter_mut().zip(names) {
            entry.name = Some(name);
        }

        Ok(Self { entries })
    }

    /// Extract an archive held in memory
    pub fn from_bytes(data: &[u8]) -> PfsResult<Self> {
        Self::read(&mut Cursor::new(data))
    }

    /// Memory-map an archive file and extract it
    pub fn open<P: AsRef<Path>>(path: P) -> PfsResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        #[allow(unsafe_code)]
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        debug!("Mapped {} ({} bytes)", path.display(), mmap.len());
        Self::from_bytes(&mmap)
    }

    /// All entries in offset order
    pub fn entries(&self) -> &[PfsEntry] {
        &self.entries
    }

    /// Find an entry by file name, ignoring case
    pub fn entry(&self, name: &str) -> Option<&PfsEntry> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.name.as_deref() == Some(name.as_str()))
    }

    /// Entries whose file name has the given extension
    pub fn entries_with_extension<'a>(
        &'a self,
        extension: &'a str,
    ) -> impl Iterator<Item = &'a PfsEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.extension() == Some(extension))
    }

    /// Number of entries, excluding the name table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take ownership of the entries
    pub fn into_entries(self) -> Vec<PfsEntry> {
        self.entries
    }
}

/// Inflate the block run of one directory record
fn read_entry<R: Read + Seek>(reader: &mut R, record: &DirectoryEntry) -> PfsResult<Vec<u8>> {
    let expected = record.inflated_len as usize;
    let mut position = u64::from(record.offset);
    let mut produced = 0usize;
    let mut buffer = MergeBuffer::new();
    let mut blocks = 0usize;

    while produced < expected {
        reader.seek(SeekFrom::Start(position))?;
        let block = BlockHeader::read(reader)?;

        // The block header is untrusted; never allocate past the entry size
        let block_len = block.inflated_len as usize;
        if block_len > expected - produced {
            return Err(PfsError::BlockOverrun {
                offset: record.offset,
                expected,
                actual: produced.saturating_add(block_len),
            });
        }

        let mut compressed = Vec::new();
        reader
            .by_ref()
            .take(u64::from(block.deflated_len))
            .read_to_end(&mut compressed)?;
        if compressed.len() != block.deflated_len as usize {
            return Err(PfsError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "block at 0x{position:X} needs {} bytes, {} available",
                    block.deflated_len,
                    compressed.len()
                ),
            )));
        }

        let inflated = inflate_block(&compressed, block_len)?;
        produced += inflated.len();
        buffer.push_owned(inflated);
        position += u64::from(block.deflated_len) + BLOCK_HEADER_SIZE as u64;
        blocks += 1;
    }

    trace!(
        "Entry at 0x{:X}: {} bytes from {} blocks",
        record.offset, expected, blocks
    );

    Ok(buffer.take(true))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pfs::PfsBuilder;
    use crate::test_utils::{RawEntry, build_raw_archive};

    #[test]
    fn test_two_entry_archive() {
        // One file plus the name table
        let archive = build_raw_archive(&[
            RawEntry::file(b"hello world"),
            RawEntry::names(&["readme.txt"]),
        ]);

        let archive = PfsArchive::from_bytes(&archive).unwrap();
        assert_eq!(archive.len(), 1);

        let entry = &archive.entries()[0];
        assert_eq!(entry.name.as_deref(), Some("readme.txt"));
        assert_eq!(entry.data, b"hello world");
        assert_eq!(entry.extension(), Some("txt"));
        assert_eq!(entry.size(), 11);
    }

    #[test]
    fn test_directory_order_does_not_matter() {
        let archive = build_raw_archive(&[
            RawEntry::file(b"first"),
            RawEntry::file(b"second"),
            RawEntry::names(&["one.bmp", "two.bmp"]),
        ]);
        let reversed = crate::test_utils::reverse_directory(&archive);

        for bytes in [archive, reversed] {
            let archive = PfsArchive::from_bytes(&bytes).unwrap();
            assert_eq!(archive.entry("one.bmp").unwrap().data, b"first");
            assert_eq!(archive.entry("two.bmp").unwrap().data, b"second");
            assert!(archive.entries()[0].offset < archive.entries()[1].offset);
        }
    }

    #[test]
    fn test_multi_block_entry() {
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 253) as u8).collect();
        let mut builder = PfsBuilder::new().with_block_size(4096);
        builder.add("big.dat", payload.clone()).unwrap();
        let bytes = builder.build().unwrap();

        let archive = PfsArchive::from_bytes(&bytes).unwrap();
        assert_eq!(archive.entry("BIG.DAT").unwrap().data, payload);
    }

    #[test]
    fn test_block_overrun() {
        // Declared size is smaller than what the single block produces
        let bytes = build_raw_archive(&[
            RawEntry::file(b"0123456789").with_declared_len(4),
            RawEntry::names(&["x.bin"]),
        ]);
        assert!(matches!(
            PfsArchive::from_bytes(&bytes),
            Err(PfsError::BlockOverrun {
                expected: 4,
                actual: 10,
                ..
            })
        ));
    }

    #[test]
    fn test_oversized_block_header_rejected_before_inflating() {
        // A small payload whose block header claims a 4 GiB output
        let bytes = build_raw_archive(&[
            RawEntry::file(b"0123456789").with_block_inflated_len(u32::MAX),
            RawEntry::names(&["x.bin"]),
        ]);
        assert!(matches!(
            PfsArchive::from_bytes(&bytes),
            Err(PfsError::BlockOverrun {
                expected: 10,
                actual,
                ..
            }) if actual == u32::MAX as usize
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = build_raw_archive(&[RawEntry::names(&[])]);
        bytes[4..8].copy_from_slice(b"ZIP ");

        let err = PfsArchive::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, PfsError::InvalidMagic(_)));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_empty_directory() {
        let archive = build_raw_archive(&[]);
        assert!(PfsArchive::from_bytes(&archive).unwrap().is_empty());
    }

    #[test]
    fn test_extra_entries_stay_unnamed() {
        let archive = build_raw_archive(&[
            RawEntry::file(b"named"),
            RawEntry::file(b"anonymous"),
            RawEntry::names(&["named.txt"]),
        ]);

        let archive = PfsArchive::from_bytes(&archive).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.entries()[1].name, None);
        assert_eq!(archive.entries()[1].extension(), None);
    }

    #[test]
    fn test_too_many_names() {
        let archive = build_raw_archive(&[
            RawEntry::file(b"only"),
            RawEntry::names(&["a.txt", "b.txt"]),
        ]);
        assert!(matches!(
            PfsArchive::from_bytes(&archive),
            Err(PfsError::InvalidNameTable(_))
        ));
    }

    #[test]
    fn test_truncated_directory() {
        let mut bytes = build_raw_archive(&[
            RawEntry::file(&[7u8; 300]),
            RawEntry::names(&["seven.bin"]),
        ]);
        // The directory is written last; cut its final record short
        let len = bytes.len();
        bytes.truncate(len - 1);

        let err = PfsArchive::from_bytes(&bytes).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_overstated_block_length() {
        let bytes = build_raw_archive(&[
            RawEntry::file(&[7u8; 300]).with_deflated_len_delta(64),
            RawEntry::names(&["seven.bin"]),
        ]);
        assert!(PfsArchive::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_open_from_disk() {
        let mut builder = PfsBuilder::new();
        builder.add("gfay.wld", b"not really a wld".to_vec()).unwrap();
        builder.add("water.bmp", vec![0x42; 64]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gfay.s3d");
        std::fs::write(&path, builder.build().unwrap()).unwrap();

        let archive = PfsArchive::open(&path).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.entries_with_extension("wld").count(), 1);
        assert_eq!(archive.entry("water.bmp").unwrap().data, vec![0x42; 64]);
    }
}
