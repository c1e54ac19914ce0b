//! WLD fragment streams
//!
//! A WLD stream describes a zone, its placeable objects, or its characters as
//! a flat list of typed fragments. Fragments point at each other by 1-based
//! sequence number or by name, so decoding is a single pass that indexes
//! every record; the graph is walked afterwards.
//!
//! # Layout
//!
//! ```text
//! header     { magic u32, version u32, max_fragment u32, u32[2], name_len u32, u32 }
//! names      name_len bytes, XORed with an 8-byte key
//! fragments  { length u32, type u32, name_ref i32, payload[length - 4] } * max_fragment
//! ```
//!
//! # Example
//!
//! ```rust
//! use zeq_formats::wld::{FragmentWriter, WldBuilder, WldFile, WldVersion};
//!
//! let mut builder = WldBuilder::new(WldVersion::Old);
//! let payload = FragmentWriter::new().i32(1).encoded_string("GRASS.BMP").finish();
//! builder.add_named(0x03, "GRASS_SPRITE", payload);
//!
//! let wld = WldFile::parse(&builder.build()?)?;
//! let names = wld
//!     .by_name("GRASS_SPRITE")
//!     .and_then(|f| f.data.as_texture_bitmap_name_list())
//!     .map(|list| list.names.clone());
//! assert_eq!(names, Some(vec!["grass.bmp_Material".to_string()]));
//! # Ok::<(), zeq_formats::wld::WldError>(())
//! ```

mod builder;
mod error;
mod file;
pub mod fragment;
mod header;
mod names;
mod reader;
mod reference;
mod resolve;

pub use builder::{FragmentWriter, WldBuilder};
pub use error::{WldError, WldResult};
pub use file::{WldFile, WldOptions};
pub use fragment::{Fragment, FragmentData, FragmentDecode, FragmentKind, TypedFragment};
pub use header::{FRAGMENT_HEADER_SIZE, FragmentHeader, WLD_HEADER_SIZE, WldHeader, WldVersion};
pub use names::{NameRef, NameTable, xor_names};
pub use reader::FragmentReader;
pub use reference::Reference;
pub use resolve::{AnimatedModel, Placement, StaticModel, Texture, TextureSet};

/// Stream magic word
pub const WLD_MAGIC: u32 = 0x5450_3D02;

/// Version word of old-format streams
pub const VERSION_OLD: u32 = 0x0001_5500;

/// Version word of new-format streams
pub const VERSION_NEW: u32 = 0x1000_C800;

/// XOR key of the name table and of bitmap names
pub const NAME_KEY: [u8; 8] = [0x95, 0x3A, 0xC5, 0x2A, 0x95, 0x7A, 0x95, 0x6A];

/// Mesh flags marking zone geometry
pub const ZONE_MESH_FLAGS: u32 = 0x0001_8003;

/// Default suffix appended to decoded bitmap names
pub const BITMAP_NAME_SUFFIX: &str = "_Material";
