//! Typed fragment records
//!
//! Each supported type tag has a struct implementing [`FragmentDecode`]. A
//! decoded fragment is wrapped in a [`Fragment`] envelope carrying its
//! sequence number and name.

mod mesh;
mod model;
mod skeleton;
mod texture;

pub use mesh::{AnimatedMesh, Mesh, Polygon, PolygonTexture, VertexPiece};
pub use model::{AnimatedMeshReference, MeshReference, Model, ObjectPlacement};
pub use skeleton::{
    AnimationReference, SkeletonEntry, SkeletonPieceReference, SkeletonPieceTrack,
    SkeletonTrackSet, TrackFrame,
};
pub use texture::{
    TextureBitmap, TextureBitmapNameList, TextureBitmapReference, TextureList, TextureReference,
};

use binrw::BinRead;
use serde::Serialize;
use std::fmt;

use super::error::WldResult;
use super::names::NameRef;
use super::reader::FragmentReader;

/// Two-component float vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec2 {
    /// First component
    pub u: f32,
    /// Second component
    pub v: f32,
}

/// Three-component float vector
#[derive(Debug, Clone, Copy, PartialEq, Default, BinRead, Serialize)]
#[br(little)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Create a vector
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Decoder for one fragment type
pub trait FragmentDecode: Sized {
    /// Type tag handled by this decoder
    const KIND: FragmentKind;

    /// Decode the record payload
    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self>;
}

/// Typed access to one [`FragmentData`] variant
pub trait TypedFragment: 'static {
    /// Borrow the payload if it holds this type
    fn extract(data: &FragmentData) -> Option<&Self>;
}

macro_rules! fragment_types {
    ($($variant:ident = $tag:literal => $accessor:ident, $label:literal;)+) => {
        /// Type tag of a supported fragment
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[repr(u32)]
        pub enum FragmentKind {
            $(
                #[doc = $label]
                $variant = $tag,
            )+
        }

        impl FragmentKind {
            /// Every supported kind, in tag order
            pub const ALL: &'static [FragmentKind] = &[$(FragmentKind::$variant),+];

            /// Map a raw tag to a supported kind
            pub fn from_tag(tag: u32) -> Option<Self> {
                match tag {
                    $($tag => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Human-readable name
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        /// Decoded payload of a fragment
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(tag = "type", content = "data")]
        pub enum FragmentData {
            $(
                #[doc = $label]
                $variant($variant),
            )+
        }

        impl FragmentData {
            /// Kind of the payload
            pub fn kind(&self) -> FragmentKind {
                match self {
                    $(Self::$variant(_) => FragmentKind::$variant,)+
                }
            }

            $(
                #[doc = concat!("The payload, if it is a ", $label)]
                pub fn $accessor(&self) -> Option<&$variant> {
                    match self {
                        Self::$variant(data) => Some(data),
                        _ => None,
                    }
                }
            )+
        }

        $(
            impl TypedFragment for $variant {
                fn extract(data: &FragmentData) -> Option<&Self> {
                    data.$accessor()
                }
            }
        )+

        /// Run the decoder registered for `kind`
        pub(crate) fn decode(
            kind: FragmentKind,
            reader: &mut FragmentReader<'_>,
        ) -> WldResult<FragmentData> {
            Ok(match kind {
                $(FragmentKind::$variant => FragmentData::$variant($variant::decode(reader)?),)+
            })
        }
    };
}

fragment_types! {
    TextureBitmapNameList = 0x03 => as_texture_bitmap_name_list, "texture bitmap name list";
    TextureBitmap = 0x04 => as_texture_bitmap, "texture bitmap";
    TextureBitmapReference = 0x05 => as_texture_bitmap_reference, "texture bitmap reference";
    SkeletonTrackSet = 0x10 => as_skeleton_track_set, "skeleton track set";
    AnimationReference = 0x11 => as_animation_reference, "animation reference";
    SkeletonPieceTrack = 0x12 => as_skeleton_piece_track, "skeleton piece track";
    SkeletonPieceReference = 0x13 => as_skeleton_piece_reference, "skeleton piece reference";
    Model = 0x14 => as_model, "model";
    ObjectPlacement = 0x15 => as_object_placement, "object placement";
    MeshReference = 0x2D => as_mesh_reference, "mesh reference";
    AnimatedMeshReference = 0x2F => as_animated_mesh_reference, "animated mesh reference";
    TextureReference = 0x30 => as_texture_reference, "texture reference";
    TextureList = 0x31 => as_texture_list, "texture list";
    Mesh = 0x36 => as_mesh, "mesh";
    AnimatedMesh = 0x37 => as_animated_mesh, "animated mesh";
}

impl FragmentKind {
    /// Raw type tag
    pub fn tag(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} {}", self.tag(), self.label())
    }
}

/// A decoded fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// 1-based sequence number within the stream
    pub index: u32,
    /// Name, if the record header carries one
    pub name: Option<NameRef>,
    /// Typed payload
    pub data: FragmentData,
}

impl Fragment {
    /// Kind of the payload
    pub fn kind(&self) -> FragmentKind {
        self.data.kind()
    }

    /// Borrow the payload as `T`, if it has that type
    pub fn payload<T: TypedFragment>(&self) -> Option<&T> {
        T::extract(&self.data)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for &kind in FragmentKind::ALL {
            assert_eq!(FragmentKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(FragmentKind::ALL.len(), 15);
    }

    #[test]
    fn test_unsupported_tags() {
        for tag in [0x00, 0x01, 0x06, 0x08, 0x16, 0x21, 0x22, 0x28, 0x35] {
            assert_eq!(FragmentKind::from_tag(tag), None);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(FragmentKind::Mesh.to_string(), "0x36 mesh");
        assert_eq!(
            FragmentKind::TextureBitmapNameList.to_string(),
            "0x03 texture bitmap name list"
        );
    }

    #[test]
    fn test_typed_access() {
        let fragment = Fragment {
            index: 4,
            name: None,
            data: FragmentData::MeshReference(MeshReference {
                reference: crate::wld::Reference::Index(2),
                flags: 0,
            }),
        };

        assert_eq!(fragment.kind(), FragmentKind::MeshReference);
        assert!(fragment.payload::<MeshReference>().is_some());
        assert!(fragment.payload::<Mesh>().is_none());
        assert!(fragment.data.as_texture_list().is_none());
    }

    #[test]
    fn test_json_shape() {
        let data = FragmentData::TextureBitmapReference(TextureBitmapReference {
            reference: crate::wld::Reference::Index(9),
            flags: 1,
        });

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "TextureBitmapReference");
        assert_eq!(json["data"]["flags"], 1);
        assert_eq!(json["data"]["reference"]["Index"], 9);
    }
}
