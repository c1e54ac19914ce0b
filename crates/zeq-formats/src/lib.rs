//! Parsers and builders for the S3D/PFS archive and WLD fragment formats
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::cast_precision_loss)] // Fixed-point vertex data is converted to f32
#![allow(clippy::doc_markdown)] // Format names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::float_cmp)] // Binary format requirements
#![allow(clippy::derive_partial_eq_without_eq)] // Binary format structs
#![allow(clippy::redundant_closure_for_method_calls)] // Iterator chains
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! This crate decodes the asset containers and scene descriptions used by the
//! classic EverQuest client:
//!
//! # Supported Formats
//!
//! - **PFS/S3D**: directory-based container of zlib-compressed blocks, with a
//!   trailing entry holding the file names
//! - **WLD**: scene description stream made of typed "fragments" (meshes,
//!   texture lists, skeleton tracks, object placements) sharing an obfuscated
//!   name table
//!
//! # Pipeline
//!
//! ```text
//! .s3d file → PfsArchive → PfsEntry (*.wld) → WldFile → Fragment graph
//! ```
//!
//! Block reassembly goes through [`buffer::MergeBuffer`], which defers
//! concatenation until the whole entry has been inflated.
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: archives and streams can be parsed and built
//! - **Bounded Decoding**: every fragment decoder reads through a cursor
//!   limited to its record, so malformed counts fail instead of over-reading
//! - **Write Once, Read Many**: a decoded [`wld::WldFile`] exposes no mutation

#![warn(missing_docs)]

pub mod buffer;
/// PFS archive (`.s3d`) reading and building
///
/// Archives hold a directory of `{crc, offset, length}` records and store each
/// file as a run of zlib blocks. The last file by offset lists the names of all
/// the others.
///
/// See the [`pfs`] module for usage examples.
pub mod pfs;
/// WLD fragment stream decoding
///
/// A WLD stream carries an XOR-obfuscated name table and a flat sequence of
/// typed fragments that reference one another by 1-based sequence number or
/// by name.
///
/// See the [`wld`] module for usage examples.
pub mod wld;
/// Zone archive discovery and bulk loading
pub mod zone;

// Test utilities module
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

