//! Texture fragments: bitmap names, bitmaps, and the lists meshes index into

use serde::Serialize;

use super::{FragmentDecode, FragmentKind};
use crate::wld::error::WldResult;
use crate::wld::names::xor_names;
use crate::wld::reader::FragmentReader;
use crate::wld::reference::Reference;

/// Bitmap flag: `params[0]` is present
const BITMAP_HAS_PARAM0: u32 = 1 << 2;
/// Bitmap flag: `params[1]` (frame delay) is present
const BITMAP_HAS_DELAY: u32 = 1 << 3;

/// 0x03: bitmap file names
///
/// Names are stored XOR-obfuscated. Decoded names are lowercased and carry
/// the configured material suffix, so `"WATER.BMP"` becomes
/// `"water.bmp_Material"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureBitmapNameList {
    /// Decoded, suffixed names
    pub names: Vec<String>,
}

impl FragmentDecode for TextureBitmapNameList {
    const KIND: FragmentKind = FragmentKind::TextureBitmapNameList;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let raw = reader.i32()?;
        // A zero count still stores one name
        let count = if raw == 0 {
            1
        } else {
            reader.check_count("bitmap name", i64::from(raw))?
        };

        let suffix = &reader.options().bitmap_suffix;
        let mut names = Vec::with_capacity(count.min(reader.remaining() / 2));
        for _ in 0..count {
            let len = reader.u16()? as usize;
            if len == 0 {
                continue;
            }

            let mut decoded = reader.bytes(len)?.to_vec();
            xor_names(&mut decoded);
            let end = decoded.iter().position(|&b| b == 0).unwrap_or(decoded.len());

            let mut name = String::from_utf8_lossy(&decoded[..end]).to_ascii_lowercase();
            name.push_str(suffix);
            names.push(name);
        }

        Ok(Self { names })
    }
}

/// 0x04: one bitmap, or the frames of an animated one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureBitmap {
    /// Flag bits
    pub flags: u32,
    /// Optional parameters; absent ones are 0. `params[1]` is the frame delay
    /// in milliseconds.
    pub params: [i32; 2],
    /// Bitmap name lists (0x03), one per frame
    pub references: Vec<Reference>,
}

impl TextureBitmap {
    /// Whether the bitmap cycles through its frames
    pub fn is_animated(&self) -> bool {
        self.flags & BITMAP_HAS_DELAY != 0
    }

    /// Delay between frames in milliseconds, for animated bitmaps
    pub fn animation_delay(&self) -> Option<i32> {
        self.is_animated().then_some(self.params[1])
    }
}

impl FragmentDecode for TextureBitmap {
    const KIND: FragmentKind = FragmentKind::TextureBitmap;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let flags = reader.u32()?;
        let count = reader.count("bitmap reference")?;

        let mut params = [0; 2];
        if flags & BITMAP_HAS_PARAM0 != 0 {
            params[0] = reader.i32()?;
        }
        if flags & BITMAP_HAS_DELAY != 0 {
            params[1] = reader.i32()?;
        }

        let references = reader.references(count)?;
        Ok(Self {
            flags,
            params,
            references,
        })
    }
}

/// 0x05: indirection to a [`TextureBitmap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureBitmapReference {
    /// Target bitmap (0x04)
    pub reference: Reference,
    /// Flag bits
    pub flags: u32,
}

impl FragmentDecode for TextureBitmapReference {
    const KIND: FragmentKind = FragmentKind::TextureBitmapReference;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        Ok(Self {
            reference: reader.reference()?,
            flags: reader.u32()?,
        })
    }
}

/// 0x30: a material, pointing at bitmap names (0x03) or a bitmap
/// reference (0x05)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextureReference {
    /// Flag bits
    pub flags: u32,
    /// Render method word
    pub params1: u32,
    /// Tint
    pub params2: i32,
    /// Unknown pair
    pub params3: [f32; 2],
    /// Bitmap source
    pub reference: Reference,
}

impl FragmentDecode for TextureReference {
    const KIND: FragmentKind = FragmentKind::TextureReference;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        Ok(Self {
            flags: reader.u32()?,
            params1: reader.u32()?,
            params2: reader.i32()?,
            params3: [reader.f32()?, reader.f32()?],
            reference: reader.reference()?,
        })
    }
}

/// 0x31: the texture slots a mesh's polygon textures index into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureList {
    /// Flag bits
    pub flags: u32,
    /// 0-based position of this record in the stream
    pub position: u32,
    /// Texture references (0x30), one per slot
    pub references: Vec<Reference>,
}

impl FragmentDecode for TextureList {
    const KIND: FragmentKind = FragmentKind::TextureList;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let flags = reader.u32()?;
        let count = reader.count("texture reference")?;
        Ok(Self {
            flags,
            position: reader.index().saturating_sub(1),
            references: reader.references(count)?,
        })
    }
}
