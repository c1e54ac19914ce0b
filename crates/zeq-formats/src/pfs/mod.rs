//! PFS archive format
//!
//! S3D files (and their siblings `.pfs`, `.pak`, `.eqg`) are PFS archives: a
//! 12-byte header pointing at a directory, and a sequence of zlib-compressed
//! blocks holding the file contents.
//!
//! # Layout
//!
//! ```text
//! header     { directory_offset u32, "PFS ", version u32 }
//! blocks     { deflated_len u32, inflated_len u32, zlib[deflated_len] } ...
//! directory  { count u32, { crc u32, offset u32, inflated_len u32 } * count }
//! ```
//!
//! Directory records are ordered by name checksum but file names are listed
//! in offset order, in a table stored as the last entry by offset.
//!
//! # Example
//!
//! ```rust
//! use zeq_formats::pfs::{PfsArchive, PfsBuilder};
//!
//! let mut builder = PfsBuilder::new();
//! builder.add("gfaydark.wld", b"fragments".to_vec())?;
//! let bytes = builder.build()?;
//!
//! let archive = PfsArchive::from_bytes(&bytes)?;
//! assert_eq!(archive.entry("gfaydark.wld").map(|e| e.size()), Some(9));
//! # Ok::<(), zeq_formats::pfs::PfsError>(())
//! ```

mod archive;
mod builder;
pub mod checksum;
mod error;
mod header;
mod inflate;
pub(crate) mod names;

pub use archive::{PfsArchive, PfsEntry};
pub use builder::PfsBuilder;
pub use error::{PfsError, PfsResult};
pub use header::{BlockHeader, DirectoryEntry, PfsHeader};
pub use inflate::{deflate_block, inflate_block};

/// Archive magic bytes
pub const PFS_MAGIC: [u8; 4] = *b"PFS ";

/// Size of the header preceding each compressed block
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Inflated size of the blocks written by [`PfsBuilder`]
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// Directory checksum conventionally stored for the file-name table
pub const NAME_TABLE_CRC: u32 = 0x6158_0AC9;
