//! Stream assembly
//!
//! [`WldBuilder`] lays out a header, an obfuscated name table, and a run of
//! fragment records. [`FragmentWriter`] composes payloads field by field.

use binrw::BinWrite;
use std::collections::HashMap;
use std::io::{Cursor, Seek, Write};

use super::error::WldResult;
use super::fragment::Vec3;
use super::header::{FragmentHeader, WldHeader, WldVersion};
use super::names::xor_names;

/// Little-endian payload writer with chainable methods
#[derive(Debug, Clone, Default)]
pub struct FragmentWriter {
    data: Vec<u8>,
}

impl FragmentWriter {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `u8`
    pub fn u8(mut self, value: u8) -> Self {
        self.data.push(value);
        self
    }

    /// Append an `i8`
    pub fn i8(self, value: i8) -> Self {
        self.u8(value as u8)
    }

    /// Append a `u16`
    pub fn u16(self, value: u16) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    /// Append an `i16`
    pub fn i16(self, value: i16) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    /// Append a `u32`
    pub fn u32(self, value: u32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    /// Append an `i32`
    pub fn i32(self, value: i32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    /// Append an `f32`
    pub fn f32(self, value: f32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    /// Append three `f32` components
    pub fn vec3(self, value: Vec3) -> Self {
        self.f32(value.x).f32(value.y).f32(value.z)
    }

    /// Append raw bytes
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Append a length-prefixed, obfuscated string as found in bitmap name
    /// lists
    ///
    /// The `u16` length counts the terminating null.
    pub fn encoded_string(self, text: &str) -> Self {
        let mut encoded = Vec::with_capacity(text.len() + 1);
        encoded.extend_from_slice(text.as_bytes());
        encoded.push(0);
        xor_names(&mut encoded);
        self.u16(encoded.len() as u16).bytes(&encoded)
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take the payload
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

struct PendingFragment {
    kind: u32,
    name_ref: i32,
    payload: Vec<u8>,
}

/// Builder for complete WLD streams
pub struct WldBuilder {
    version: WldVersion,
    names: Vec<u8>,
    offsets: HashMap<String, u32>,
    fragments: Vec<PendingFragment>,
}

impl WldBuilder {
    /// Create an empty stream of the given version
    pub fn new(version: WldVersion) -> Self {
        Self {
            version,
            // Offset 0 is unreachable: a zero name field means "no name"
            names: vec![0],
            offsets: HashMap::new(),
            fragments: Vec::new(),
        }
    }

    /// Intern `name` and return its raw (negated) header name field
    pub fn add_name(&mut self, name: &str) -> i32 {
        if let Some(&offset) = self.offsets.get(name) {
            return -(offset as i32);
        }
        let offset = self.names.len() as u32;
        self.names.extend_from_slice(name.as_bytes());
        self.names.push(0);
        self.offsets.insert(name.to_string(), offset);
        -(offset as i32)
    }

    /// Raw header name field of a name added earlier
    pub fn name_ref(&self, name: &str) -> Option<i32> {
        self.offsets.get(name).map(|&offset| -(offset as i32))
    }

    /// Raw cross-reference field naming a fragment added earlier
    ///
    /// Reference fields carry the offset biased by one: `1 - offset`. The
    /// first interned name sits at offset 1, which would encode as 0, so it
    /// has no reference form.
    pub fn reference_to(&self, name: &str) -> Option<i32> {
        let offset = *self.offsets.get(name)?;
        (offset > 1).then(|| 1 - offset as i32)
    }

    /// Replace the plain name table, for streams no interning would produce
    pub fn set_raw_names(&mut self, names: Vec<u8>) {
        self.names = names;
        self.offsets.clear();
    }

    /// Append an anonymous fragment and return its 1-based sequence number
    pub fn add(&mut self, kind: u32, payload: Vec<u8>) -> u32 {
        self.add_with_raw_name(kind, 0, payload)
    }

    /// Append a fragment named `name`
    pub fn add_named(&mut self, kind: u32, name: &str, payload: Vec<u8>) -> u32 {
        let name_ref = self.add_name(name);
        self.add_with_raw_name(kind, name_ref, payload)
    }

    /// Append a fragment with an arbitrary raw name field
    pub fn add_with_raw_name(&mut self, kind: u32, name_ref: i32, payload: Vec<u8>) -> u32 {
        self.fragments.push(PendingFragment {
            kind,
            name_ref,
            payload,
        });
        self.fragments.len() as u32
    }

    /// Number of fragments added
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether no fragments were added
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Serialize the stream
    pub fn build(&self) -> WldResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Serialize the stream into `writer`
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> WldResult<()> {
        let header = WldHeader::new(
            self.version,
            self.fragments.len() as u32,
            self.names.len() as u32,
        );
        header.write(writer)?;

        let mut names = self.names.clone();
        xor_names(&mut names);
        writer.write_all(&names)?;

        for fragment in &self.fragments {
            FragmentHeader {
                length: fragment.payload.len() as u32 + 4,
                kind: fragment.kind,
                name_ref: fragment.name_ref,
            }
            .write(writer)?;
            writer.write_all(&fragment.payload)?;
        }
        Ok(())
    }
}
