//! Cross-references between fragments

use serde::Serialize;

use super::error::WldResult;
use super::names::{NameRef, NameTable};

/// A reference field decoded from its raw `i32` form
///
/// Positive values are 1-based fragment sequence numbers and zero means
/// "nothing". A negative value `raw` names the fragment registered under the
/// string at offset `1 - raw`, so `-1` points at offset 2. Fragment header
/// names use the unbiased `-raw` form instead, see [`NameTable::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Reference {
    /// Raw value 0
    #[default]
    None,
    /// 1-based fragment sequence number
    Index(u32),
    /// Fragment registered under the name at this offset
    Name(NameRef),
}

impl Reference {
    /// Decode a raw field, validating name offsets against `names`
    pub fn from_raw(raw: i32, names: &NameTable) -> WldResult<Self> {
        Ok(match raw {
            0 => Self::None,
            1.. => Self::Index(raw as u32),
            _ => Self::Name(names.name_ref(Self::name_offset(raw))?),
        })
    }

    /// Name table offset addressed by a negative raw field
    pub fn name_offset(raw: i32) -> u32 {
        raw.unsigned_abs() + 1
    }

    /// Raw field value
    pub fn raw(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Index(index) => index as i32,
            Self::Name(name) => 1i32.wrapping_sub(name.offset() as i32),
        }
    }

    /// Whether the field is empty
    pub fn is_none(self) -> bool {
        self == Self::None
    }
}
