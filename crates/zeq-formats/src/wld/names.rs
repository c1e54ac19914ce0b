//! The obfuscated name table
//!
//! Fragment names live in one block of null-terminated strings, XORed with a
//! repeating 8-byte key. The block is decoded once; fragments refer to names
//! by byte offset.

use serde::Serialize;

use super::NAME_KEY;
use super::error::{WldError, WldResult};

/// XOR `data` with the name key, starting at key index 0
///
/// Applying it twice restores the input.
pub fn xor_names(data: &mut [u8]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= NAME_KEY[i & 7];
    }
}

/// Handle to a validated, null-terminated name inside a [`NameTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NameRef {
    offset: u32,
    len: u32,
}

impl NameRef {
    /// Byte offset of the name within its table
    pub fn offset(self) -> u32 {
        self.offset
    }

    /// Raw (negated) form used in header name fields
    pub fn raw(self) -> i32 {
        -(self.offset as i32)
    }
}

/// Decoded name table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    data: Vec<u8>,
}

impl NameTable {
    /// Decode an obfuscated name block
    pub fn decode(encoded: &[u8]) -> Self {
        let mut data = encoded.to_vec();
        xor_names(&mut data);
        Self { data }
    }

    /// Wrap an already decoded block
    pub fn from_plain(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Decoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Validate the name starting at `offset`
    pub fn name_ref(&self, offset: u32) -> WldResult<NameRef> {
        let start = offset as usize;
        let tail = self
            .data
            .get(start..)
            .filter(|tail| !tail.is_empty())
            .ok_or(WldError::InvalidName { offset })?;

        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(WldError::UnterminatedName { offset })?;

        if std::str::from_utf8(&tail[..len]).is_err() {
            return Err(WldError::InvalidName { offset });
        }

        Ok(NameRef {
            offset,
            len: len as u32,
        })
    }

    /// Decode a raw name field: negative values are negated offsets,
    /// anything else means "no name"
    pub fn from_raw(&self, raw: i32) -> WldResult<Option<NameRef>> {
        if raw >= 0 {
            return Ok(None);
        }
        self.name_ref(raw.unsigned_abs()).map(Some)
    }

    /// Text of a name
    ///
    /// A handle from a different table yields an empty string or an
    /// unrelated name, never a panic.
    pub fn get(&self, name: NameRef) -> &str {
        let start = name.offset as usize;
        self.data
            .get(start..start + name.len as usize)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or_default()
    }

    /// Look up a name by offset without validating it up front
    pub fn get_at(&self, offset: u32) -> Option<&str> {
        self.name_ref(offset).ok().map(|name| self.get(name))
    }
}
