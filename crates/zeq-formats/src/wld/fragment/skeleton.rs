//! Skeleton fragments: bone hierarchies and their animation tracks

use binrw::BinRead;
use serde::Serialize;
use std::f32::consts::FRAC_PI_2;

use super::{FragmentDecode, FragmentKind};
use crate::wld::error::WldResult;
use crate::wld::names::NameRef;
use crate::wld::reader::FragmentReader;
use crate::wld::reference::Reference;

const TRACK_SET_HAS_PARAMS1: u32 = 1 << 0;
const TRACK_SET_HAS_PARAMS2: u32 = 1 << 1;
const TRACK_SET_HAS_MESHES: u32 = 1 << 9;

/// Size of one bone entry before its child list
const ENTRY_SIZE: usize = 20;
/// Size of one [`TrackFrame`]
const FRAME_SIZE: usize = 16;

/// One bone of a [`SkeletonTrackSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkeletonEntry {
    /// Bone name
    pub name: Option<NameRef>,
    /// Flag bits
    pub flags: u32,
    /// Piece reference (0x13) holding the bone's default track
    pub track: Reference,
    /// Mesh attached to the bone
    pub mesh: Reference,
    /// Indices of child bones within the set
    pub children: Vec<i32>,
}

/// 0x10: a skeleton
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkeletonTrackSet {
    /// Flag bits
    pub flags: u32,
    /// Unknown reference
    pub reference: Reference,
    /// Present when flag bit 0 is set; zero otherwise
    pub params1: [i32; 3],
    /// Bounding radius, when flag bit 1 is set
    pub params2: Option<f32>,
    /// Bones in depth-first order
    pub entries: Vec<SkeletonEntry>,
    /// Skin meshes, when flag bit 9 is set
    pub meshes: Vec<Reference>,
    /// One data word per skin mesh
    pub mesh_data: Vec<i32>,
}

impl SkeletonTrackSet {
    /// Parent bone of every entry, `None` for roots
    ///
    /// Child indices outside the set are ignored.
    pub fn parents(&self) -> Vec<Option<usize>> {
        let mut parents = vec![None; self.entries.len()];
        for (parent, entry) in self.entries.iter().enumerate() {
            for &child in &entry.children {
                if let Some(slot) = usize::try_from(child).ok().and_then(|c| parents.get_mut(c)) {
                    *slot = Some(parent);
                }
            }
        }
        parents
    }
}

impl FragmentDecode for SkeletonTrackSet {
    const KIND: FragmentKind = FragmentKind::SkeletonTrackSet;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let flags = reader.u32()?;
        let entry_count = reader.count("bone")?;
        let reference = reader.reference()?;

        let mut params1 = [0; 3];
        if flags & TRACK_SET_HAS_PARAMS1 != 0 {
            params1 = [reader.i32()?, reader.i32()?, reader.i32()?];
        }
        let params2 = if flags & TRACK_SET_HAS_PARAMS2 != 0 {
            Some(reader.f32()?)
        } else {
            None
        };

        reader.ensure(entry_count.saturating_mul(ENTRY_SIZE))?;
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            let name = reader.name()?;
            let flags = reader.u32()?;
            let track = reader.reference()?;
            let mesh = reader.reference()?;
            let child_count = reader.count("child")?;
            let children = reader.read_many(child_count, 4)?;
            entries.push(SkeletonEntry {
                name,
                flags,
                track,
                mesh,
                children,
            });
        }

        let (meshes, mesh_data) = if flags & TRACK_SET_HAS_MESHES != 0 {
            let mesh_count = reader.count("skin mesh")?;
            let meshes = reader.references(mesh_count)?;
            let data = reader.read_many(mesh_count, 4)?;
            (meshes, data)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(Self {
            flags,
            reference,
            params1,
            params2,
            entries,
            meshes,
            mesh_data,
        })
    }
}

/// 0x11: indirection to a [`SkeletonTrackSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnimationReference {
    /// Target skeleton (0x10)
    pub reference: Reference,
    /// Parameter word
    pub params: u32,
}

impl FragmentDecode for AnimationReference {
    const KIND: FragmentKind = FragmentKind::AnimationReference;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        Ok(Self {
            reference: reader.reference()?,
            params: reader.u32()?,
        })
    }
}

/// One keyframe of a [`SkeletonPieceTrack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, Serialize)]
#[br(little)]
pub struct TrackFrame {
    /// Divisor for `rotation`
    pub rotation_denominator: i16,
    /// Rotation numerators
    pub rotation: [i16; 3],
    /// Translation numerators
    pub shift: [i16; 3],
    /// Divisor for `shift`
    pub shift_denominator: i16,
}

impl TrackFrame {
    /// Rotation in radians; a zero denominator means no rotation
    pub fn rotation_radians(&self) -> [f32; 3] {
        if self.rotation_denominator == 0 {
            return [0.0; 3];
        }
        let denominator = f32::from(self.rotation_denominator);
        self.rotation
            .map(|value| f32::from(value) / denominator * FRAC_PI_2)
    }

    /// Translation; a zero denominator means no translation
    pub fn translation(&self) -> [f32; 3] {
        if self.shift_denominator == 0 {
            return [0.0; 3];
        }
        let denominator = f32::from(self.shift_denominator);
        self.shift.map(|value| f32::from(value) / denominator)
    }
}

/// 0x12: keyframes of one bone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkeletonPieceTrack {
    /// Flag bits
    pub flags: u32,
    /// Keyframes; the first is the rest pose
    pub frames: Vec<TrackFrame>,
}

impl SkeletonPieceTrack {
    /// Rest pose, if the track has any frames
    pub fn first_frame(&self) -> Option<&TrackFrame> {
        self.frames.first()
    }
}

impl FragmentDecode for SkeletonPieceTrack {
    const KIND: FragmentKind = FragmentKind::SkeletonPieceTrack;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let flags = reader.u32()?;
        let frame_count = reader.count("frame")?;
        Ok(Self {
            flags,
            frames: reader.read_many(frame_count, FRAME_SIZE)?,
        })
    }
}

/// 0x13: indirection to a [`SkeletonPieceTrack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkeletonPieceReference {
    /// Target track (0x12)
    pub reference: Reference,
    /// Parameter word
    pub params: u32,
}

impl FragmentDecode for SkeletonPieceReference {
    const KIND: FragmentKind = FragmentKind::SkeletonPieceReference;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        Ok(Self {
            reference: reader.reference()?,
            params: reader.u32()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::{decode_payload, decode_payload_with};
    use crate::wld::{FragmentWriter, NameTable, WldError, WldVersion};
    use pretty_assertions::assert_eq;

    fn entry(writer: FragmentWriter, name: i32, track: i32, children: &[i32]) -> FragmentWriter {
        let mut writer = writer
            .i32(name)
            .u32(0)
            .i32(track)
            .i32(0)
            .i32(children.len() as i32);
        for &child in children {
            writer = writer.i32(child);
        }
        writer
    }

    #[test]
    fn test_track_set_walks_variable_entries() {
        let names = NameTable::from_plain(b"\0HUM_DAG\0HEAD_DAG\0".to_vec());

        let mut writer = FragmentWriter::new()
            .u32(TRACK_SET_HAS_PARAMS2 | TRACK_SET_HAS_MESHES)
            .i32(3)
            .i32(0)
            .f32(12.5);
        writer = entry(writer, -1, 2, &[1, 2]);
        writer = entry(writer, -9, 3, &[]);
        writer = entry(writer, 0, 4, &[]);
        let payload = writer.i32(1).i32(7).i32(99).finish();

        let set: SkeletonTrackSet = decode_payload_with(&payload, &names, WldVersion::Old).unwrap();
        assert_eq!(set.params1, [0; 3]);
        assert_eq!(set.params2, Some(12.5));
        assert_eq!(set.entries.len(), 3);
        assert_eq!(names.get(set.entries[0].name.unwrap()), "HUM_DAG");
        assert_eq!(names.get(set.entries[1].name.unwrap()), "HEAD_DAG");
        assert_eq!(set.entries[2].name, None);
        assert_eq!(set.entries[0].children, vec![1, 2]);
        assert_eq!(set.entries[2].track, Reference::Index(4));
        assert_eq!(set.meshes, vec![Reference::Index(7)]);
        assert_eq!(set.mesh_data, vec![99]);
        assert_eq!(set.parents(), vec![None, Some(0), Some(0)]);
    }

    #[test]
    fn test_track_set_params1() {
        let payload = FragmentWriter::new()
            .u32(TRACK_SET_HAS_PARAMS1)
            .i32(0)
            .i32(5)
            .i32(1)
            .i32(2)
            .i32(3)
            .finish();

        let set: SkeletonTrackSet = decode_payload(&payload).unwrap();
        assert_eq!(set.reference, Reference::Index(5));
        assert_eq!(set.params1, [1, 2, 3]);
        assert_eq!(set.params2, None);
        assert!(set.entries.is_empty());
        assert!(set.meshes.is_empty());
    }

    #[test]
    fn test_child_count_past_payload() {
        let payload = entry(FragmentWriter::new().u32(0).i32(1).i32(0), 0, 1, &[])
            .finish();
        let mut overstated = payload.clone();
        // Patch the child count to claim far more children than remain
        let len = overstated.len();
        overstated[len - 4..].copy_from_slice(&1000i32.to_le_bytes());

        assert!(decode_payload::<SkeletonTrackSet>(&payload).is_ok());
        assert!(matches!(
            decode_payload::<SkeletonTrackSet>(&overstated),
            Err(WldError::Truncated { .. })
        ));
    }

    #[test]
    fn test_piece_track_frames() {
        let payload = FragmentWriter::new()
            .u32(0)
            .i32(2)
            .i16(4)
            .i16(4)
            .i16(0)
            .i16(-2)
            .i16(10)
            .i16(20)
            .i16(30)
            .i16(10)
            .i16(0)
            .i16(1)
            .i16(1)
            .i16(1)
            .i16(5)
            .i16(5)
            .i16(5)
            .i16(0)
            .finish();

        let track: SkeletonPieceTrack = decode_payload(&payload).unwrap();
        assert_eq!(track.frames.len(), 2);

        let rest = track.first_frame().unwrap();
        assert_eq!(rest.rotation, [4, 0, -2]);
        assert_eq!(rest.rotation_radians(), [FRAC_PI_2, 0.0, -FRAC_PI_2 / 2.0]);
        assert_eq!(rest.translation(), [1.0, 2.0, 3.0]);

        // Zero denominators neutralize the frame
        assert_eq!(track.frames[1].rotation_radians(), [0.0; 3]);
        assert_eq!(track.frames[1].translation(), [0.0; 3]);
    }

    #[test]
    fn test_piece_references() {
        let payload = FragmentWriter::new().i32(3).u32(0).finish();
        let piece: SkeletonPieceReference = decode_payload(&payload).unwrap();
        assert_eq!(piece.reference, Reference::Index(3));

        let animation: AnimationReference = decode_payload(&payload).unwrap();
        assert_eq!(animation.reference, Reference::Index(3));
        assert_eq!(animation.params, 0);
    }
}
