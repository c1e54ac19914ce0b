//! Fragment stream parsing and lookup

use binrw::BinRead;
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use tracing::{debug, trace};

use super::BITMAP_NAME_SUFFIX;
use super::error::{WldError, WldResult};
use super::fragment::{self, Fragment, FragmentKind, Mesh, TypedFragment};
use super::header::{FRAGMENT_HEADER_SIZE, FragmentHeader, WLD_HEADER_SIZE, WldHeader, WldVersion};
use super::names::{NameRef, NameTable};
use super::reader::FragmentReader;
use super::reference::Reference;

/// Parse options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WldOptions {
    /// Reject fragments whose decoder leaves payload bytes unread
    ///
    /// Off by default: several record types carry trailing fields no decoder
    /// reads.
    pub strict_length: bool,
    /// Suffix appended to bitmap names from 0x03 fragments
    pub bitmap_suffix: String,
}

impl Default for WldOptions {
    fn default() -> Self {
        Self {
            strict_length: false,
            bitmap_suffix: BITMAP_NAME_SUFFIX.to_string(),
        }
    }
}

impl WldOptions {
    /// Default options with trailing-byte checking turned on
    pub fn strict() -> Self {
        Self {
            strict_length: true,
            ..Self::default()
        }
    }

    /// Replace the bitmap name suffix
    pub fn with_bitmap_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.bitmap_suffix = suffix.into();
        self
    }
}

/// A decoded fragment stream
///
/// Owns the name table and every decoded fragment. Fragments are addressed
/// by 1-based sequence number or by name; records of unsupported types keep
/// their sequence number but cannot be looked up.
#[derive(Debug, Clone)]
pub struct WldFile {
    header: WldHeader,
    version: WldVersion,
    names: NameTable,
    slots: Vec<Option<Fragment>>,
    by_name: HashMap<String, usize>,
}

impl WldFile {
    /// Decode a stream with default options
    pub fn parse(data: &[u8]) -> WldResult<Self> {
        Self::parse_with(data, &WldOptions::default())
    }

    /// Decode a stream
    pub fn parse_with(data: &[u8], options: &WldOptions) -> WldResult<Self> {
        let header = WldHeader::read(&mut Cursor::new(data)).map_err(|err| {
            if err.is_eof() {
                WldError::Truncated {
                    fragment: 0,
                    position: 0,
                }
            } else {
                WldError::BinRw(err)
            }
        })?;
        let version = header.validate()?;

        let names_end = WLD_HEADER_SIZE + header.name_block_len as usize;
        let encoded = data
            .get(WLD_HEADER_SIZE..names_end)
            .ok_or(WldError::Truncated {
                fragment: 0,
                position: WLD_HEADER_SIZE as u64,
            })?;
        let names = NameTable::decode(encoded);

        let record_capacity = (data.len() - names_end) / FRAGMENT_HEADER_SIZE;
        let mut slots = Vec::with_capacity((header.max_fragment as usize).min(record_capacity));
        let mut by_name = HashMap::new();
        let mut position = names_end;

        for index in 1..=header.max_fragment {
            let truncated = |at: usize| WldError::Truncated {
                fragment: index,
                position: at as u64,
            };

            let record = data
                .get(position..position + FRAGMENT_HEADER_SIZE)
                .ok_or_else(|| truncated(position))?;
            let record = FragmentHeader::read(&mut Cursor::new(record))?;
            let payload_len = record.payload_len().ok_or(WldError::InvalidRecordLength {
                fragment: index,
                length: record.length,
            })?;

            let payload_start = position + FRAGMENT_HEADER_SIZE;
            let payload = payload_start
                .checked_add(payload_len)
                .and_then(|end| data.get(payload_start..end))
                .ok_or_else(|| truncated(payload_start))?;
            position = payload_start + payload_len;

            let Some(kind) = FragmentKind::from_tag(record.kind) else {
                trace!(
                    "Skipping fragment {} of unsupported type 0x{:02X} ({} bytes)",
                    index, record.kind, payload_len
                );
                slots.push(None);
                continue;
            };

            let name = names.from_raw(record.name_ref)?;
            let mut reader = FragmentReader::new(payload, &names, version, options, index);
            let decoded = fragment::decode(kind, &mut reader)?;

            let remaining = reader.remaining();
            if remaining > 0 {
                if options.strict_length {
                    return Err(WldError::TrailingBytes {
                        fragment: index,
                        kind: record.kind,
                        remaining,
                    });
                }
                trace!(
                    "Fragment {} ({}) left {} payload bytes unread",
                    index, kind, remaining
                );
            }

            if let Some(name) = name {
                by_name.insert(names.get(name).to_string(), slots.len());
            }
            slots.push(Some(Fragment {
                index,
                name,
                data: decoded,
            }));
        }

        if position < data.len() {
            trace!("{} bytes follow the last fragment", data.len() - position);
        }

        let file = Self {
            header,
            version,
            names,
            slots,
            by_name,
        };
        debug!(
            "Decoded {} of {} fragments ({:?} format, {} named)",
            file.fragment_count(),
            file.len(),
            file.version,
            file.by_name.len()
        );
        Ok(file)
    }

    /// Stream header
    pub fn header(&self) -> &WldHeader {
        &self.header
    }

    /// Format generation
    pub fn version(&self) -> WldVersion {
        self.version
    }

    /// Decoded name table
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// Number of records, including unsupported ones
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the stream holds no records
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of decoded fragments
    pub fn fragment_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Decoded fragments in stream order
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.slots.iter().flatten()
    }

    /// Decoded fragments of type `T`, with their envelopes
    pub fn fragments_of<T: TypedFragment>(&self) -> impl Iterator<Item = (&Fragment, &T)> {
        self.fragments()
            .filter_map(|fragment| fragment.payload::<T>().map(|data| (fragment, data)))
    }

    /// Number of decoded fragments of each kind
    pub fn kind_counts(&self) -> BTreeMap<FragmentKind, usize> {
        let mut counts = BTreeMap::new();
        for fragment in self.fragments() {
            *counts.entry(fragment.kind()).or_default() += 1;
        }
        counts
    }

    /// Fragment by 1-based sequence number
    pub fn get(&self, index: u32) -> Option<&Fragment> {
        let slot = index.checked_sub(1)? as usize;
        self.slots.get(slot)?.as_ref()
    }

    /// Fragment registered under `name`
    pub fn by_name(&self, name: &str) -> Option<&Fragment> {
        let slot = *self.by_name.get(name)?;
        self.slots.get(slot)?.as_ref()
    }

    /// Fragment for a raw reference field
    ///
    /// Positive values are sequence numbers; a negative value names the string
    /// at offset `1 - raw`. Zero, unknown indices, and unknown names yield
    /// `None`.
    pub fn lookup(&self, raw: i32) -> Option<&Fragment> {
        match raw {
            0 => None,
            1.. => self.get(raw as u32),
            _ => self.by_name(self.names.get_at(Reference::name_offset(raw))?),
        }
    }

    /// Fragment a decoded reference points at
    pub fn resolve(&self, reference: &Reference) -> Option<&Fragment> {
        match *reference {
            Reference::None => None,
            Reference::Index(index) => self.get(index),
            Reference::Name(name) => self.by_name(self.names.get(name)),
        }
    }

    /// Payload a reference points at, if it has type `T`
    pub fn resolve_as<T: TypedFragment>(&self, reference: &Reference) -> Option<&T> {
        self.resolve(reference)?.payload()
    }

    /// Name of a fragment
    pub fn name(&self, fragment: &Fragment) -> Option<&str> {
        fragment.name.map(|name| self.names.get(name))
    }

    /// Text of a name handle
    pub fn name_text(&self, name: NameRef) -> &str {
        self.names.get(name)
    }

    /// Meshes flagged as zone geometry
    pub fn zone_meshes(&self) -> impl Iterator<Item = (&Fragment, &Mesh)> {
        self.fragments_of::<Mesh>()
            .filter(|(_, mesh)| mesh.is_zone_mesh())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::wld::fragment::{MeshReference, TextureBitmapNameList};
    use crate::wld::{FragmentWriter, WldBuilder};

    fn bitmap_names(name: &str) -> Vec<u8> {
        FragmentWriter::new().i32(1).encoded_string(name).finish()
    }

    #[test]
    fn test_minimal_stream() {
        let mut builder = WldBuilder::new(WldVersion::Old);
        builder.add_named(0x03, "WATER_SPRITE", bitmap_names("WATER.BMP"));
        let wld = WldFile::parse(&builder.build().unwrap()).unwrap();

        assert_eq!(wld.len(), 1);
        let fragment = wld.get(1).unwrap();
        assert_eq!(fragment.kind(), FragmentKind::TextureBitmapNameList);
        assert_eq!(wld.name(fragment), Some("WATER_SPRITE"));

        let names = fragment.payload::<TextureBitmapNameList>().unwrap();
        assert_eq!(names.names, vec!["water.bmp_Material"]);
        assert_eq!(wld.by_name("WATER_SPRITE").unwrap().index, 1);
    }

    #[test]
    fn test_lookup_forms() {
        let mut builder = WldBuilder::new(WldVersion::New);
        builder.add_named(0x03, "FIRST", bitmap_names("A.BMP"));
        let second = builder.add_named(0x03, "SECOND", bitmap_names("B.BMP"));
        let wld = WldFile::parse(&builder.build().unwrap()).unwrap();

        assert_eq!(wld.lookup(1).unwrap().index, 1);
        assert_eq!(wld.lookup(2).unwrap().index, 2);
        assert!(wld.lookup(0).is_none());
        assert!(wld.lookup(3).is_none());
        assert!(wld.get(0).is_none());

        // "SECOND" sits at offset 7, so the reference is 1 - 7
        let raw = builder.reference_to("SECOND").unwrap();
        assert_eq!(raw, -6);
        assert_eq!(wld.lookup(raw).unwrap().index, second);
        // The unbiased header form lands one byte late, on "ECOND"
        assert!(wld.lookup(builder.name_ref("SECOND").unwrap()).is_none());
        assert!(wld.by_name("MISSING").is_none());
        // Past the end of the name table
        assert!(wld.lookup(-10_000).is_none());
    }

    #[test]
    fn test_unknown_record_keeps_numbering() {
        let mut builder = WldBuilder::new(WldVersion::Old);
        builder.add(0x03, bitmap_names("A.BMP"));
        builder.add(0x22, vec![0xAB; 37]);
        builder.add(0x2D, FragmentWriter::new().i32(1).u32(0).finish());
        let wld = WldFile::parse(&builder.build().unwrap()).unwrap();

        assert_eq!(wld.len(), 3);
        assert_eq!(wld.fragment_count(), 2);
        assert!(wld.get(2).is_none());

        let third = wld.get(3).unwrap();
        assert_eq!(third.index, 3);
        let mesh_ref = third.payload::<MeshReference>().unwrap();
        assert_eq!(
            wld.resolve_as::<TextureBitmapNameList>(&mesh_ref.reference)
                .unwrap()
                .names,
            vec!["a.bmp_Material"]
        );
    }

    #[test]
    fn test_later_duplicate_name_wins() {
        let mut builder = WldBuilder::new(WldVersion::Old);
        builder.add_named(0x03, "DUP", bitmap_names("OLD.BMP"));
        builder.add_named(0x03, "DUP", bitmap_names("NEW.BMP"));
        let wld = WldFile::parse(&builder.build().unwrap()).unwrap();

        assert_eq!(wld.by_name("DUP").unwrap().index, 2);
    }

    #[test]
    fn test_truncated_payload_aborts() {
        let mut builder = WldBuilder::new(WldVersion::Old);
        builder.add(0x2D, FragmentWriter::new().i32(1).finish());
        assert!(matches!(
            WldFile::parse(&builder.build().unwrap()),
            Err(WldError::Truncated { fragment: 1, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_policy() {
        let mut builder = WldBuilder::new(WldVersion::Old);
        builder.add(0x2D, FragmentWriter::new().i32(0).u32(0).u32(0xFFFF).finish());
        let bytes = builder.build().unwrap();

        assert!(WldFile::parse(&bytes).is_ok());
        assert!(matches!(
            WldFile::parse_with(&bytes, &WldOptions::strict()),
            Err(WldError::TrailingBytes {
                fragment: 1,
                kind: 0x2D,
                remaining: 4
            })
        ));
    }

    #[test]
    fn test_stream_cut_short() {
        let mut builder = WldBuilder::new(WldVersion::Old);
        builder.add(0x03, bitmap_names("A.BMP"));
        let mut bytes = builder.build().unwrap();
        bytes.truncate(bytes.len() - 3);

        assert!(matches!(
            WldFile::parse(&bytes),
            Err(WldError::Truncated { fragment: 1, .. })
        ));
    }

    #[test]
    fn test_header_rejections() {
        let mut bytes = WldBuilder::new(WldVersion::Old).build().unwrap();
        bytes[0] ^= 0xFF;
        assert!(matches!(
            WldFile::parse(&bytes),
            Err(WldError::InvalidMagic(_))
        ));

        let mut bytes = WldBuilder::new(WldVersion::Old).build().unwrap();
        bytes[4..8].copy_from_slice(&0x0002_0000u32.to_le_bytes());
        assert!(matches!(
            WldFile::parse(&bytes),
            Err(WldError::UnsupportedVersion(0x0002_0000))
        ));

        assert!(matches!(
            WldFile::parse(&[0x02, 0x3D]),
            Err(WldError::Truncated { fragment: 0, .. })
        ));
    }

    #[test]
    fn test_unterminated_header_name() {
        let mut builder = WldBuilder::new(WldVersion::Old);
        builder.add_with_raw_name(0x2D, -1, FragmentWriter::new().i32(0).u32(0).finish());
        builder.set_raw_names(b"\0UNTERMINATED".to_vec());

        assert!(matches!(
            WldFile::parse(&builder.build().unwrap()),
            Err(WldError::UnterminatedName { offset: 1 })
        ));
    }

    #[test]
    fn test_custom_suffix() {
        let mut builder = WldBuilder::new(WldVersion::Old);
        builder.add(0x03, bitmap_names("ROCK.BMP"));
        let options = WldOptions::default().with_bitmap_suffix("");
        let wld = WldFile::parse_with(&builder.build().unwrap(), &options).unwrap();

        let (_, names) = wld.fragments_of::<TextureBitmapNameList>().next().unwrap();
        assert_eq!(names.names, vec!["rock.bmp"]);
    }
}
