//! Model fragments: model definitions, placements, and mesh indirections

use serde::Serialize;

use super::{FragmentDecode, FragmentKind, Vec3};
use crate::wld::error::WldResult;
use crate::wld::names::NameRef;
use crate::wld::reader::FragmentReader;
use crate::wld::reference::Reference;

const MODEL_HAS_PARAM0: u32 = 1 << 0;
const MODEL_HAS_PARAM1: u32 = 1 << 1;

/// Rotation fields are stored in 1/512ths of a full turn
const ROTATION_UNITS: f32 = 512.0;

/// 0x14: a model definition
///
/// Static models reference a [`MeshReference`]; animated ones reference
/// animation references (0x11).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    /// Flag bits
    pub flags: u32,
    /// Unknown reference
    pub reference: Reference,
    /// Unknown value following the counts
    pub fragment2: i32,
    /// Meshes or animations making up the model
    pub references: Vec<Reference>,
}

impl FragmentDecode for Model {
    const KIND: FragmentKind = FragmentKind::Model;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let flags = reader.u32()?;
        let reference = reader.reference()?;
        let skip_count = reader.count("skipped block")?;
        let reference_count = reader.count("model reference")?;
        let fragment2 = reader.i32()?;

        if flags & MODEL_HAS_PARAM0 != 0 {
            reader.skip(4)?;
        }
        if flags & MODEL_HAS_PARAM1 != 0 {
            reader.skip(4)?;
        }

        for _ in 0..skip_count {
            let size = reader.count("skipped block size")?;
            reader.skip(size.saturating_mul(8))?;
        }

        Ok(Self {
            flags,
            reference,
            fragment2,
            references: reader.references(reference_count)?,
        })
    }
}

/// 0x15: one placed instance of a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectPlacement {
    /// Name of the placed model
    ///
    /// Stored like a fragment header name (`-raw`), not as a biased
    /// cross-reference. Non-negative values mean no name.
    pub model: Option<NameRef>,
    /// Flag bits
    pub flags: u32,
    /// Unknown value
    pub fragment1: i32,
    /// Position
    pub position: Vec3,
    /// Rotation about each axis, in degrees
    pub rotation: Vec3,
    /// Scale per axis; the stored z scale is replaced by the y scale
    pub scale: Vec3,
    /// Vertex color reference
    pub color_ref: i32,
    /// Color parameter, 0 when there is no color reference
    pub color_param: i32,
}

impl FragmentDecode for ObjectPlacement {
    const KIND: FragmentKind = FragmentKind::ObjectPlacement;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let model = reader.name()?;
        let flags = reader.u32()?;
        let fragment1 = reader.i32()?;
        let position: Vec3 = reader.read()?;

        let to_degrees = |raw: f32| raw / ROTATION_UNITS * 360.0;
        let rot_z = to_degrees(reader.f32()?);
        let rot_y = to_degrees(reader.f32()?);
        let rot_x = to_degrees(reader.f32()?);

        let _scale_z = reader.f32()?;
        let scale_y = reader.f32()?;
        let scale_x = reader.f32()?;

        let color_ref = reader.i32()?;
        let color_param = if color_ref != 0 { reader.i32()? } else { 0 };

        Ok(Self {
            model,
            flags,
            fragment1,
            position,
            rotation: Vec3::new(rot_x, rot_y, rot_z),
            scale: Vec3::new(scale_x, scale_y, scale_y),
            color_ref,
            color_param,
        })
    }
}

/// 0x2D: indirection to a mesh (0x36)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshReference {
    /// Target mesh
    pub reference: Reference,
    /// Flag bits
    pub flags: u32,
}

impl FragmentDecode for MeshReference {
    const KIND: FragmentKind = FragmentKind::MeshReference;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        Ok(Self {
            reference: reader.reference()?,
            flags: reader.u32()?,
        })
    }
}

/// 0x2F: indirection to an animated mesh (0x37)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnimatedMeshReference {
    /// Target animated mesh
    pub reference: Reference,
    /// Flag bits
    pub flags: u32,
}

impl FragmentDecode for AnimatedMeshReference {
    const KIND: FragmentKind = FragmentKind::AnimatedMeshReference;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        Ok(Self {
            reference: reader.reference()?,
            flags: reader.u32()?,
        })
    }
}
