//! Mesh fragments

use binrw::BinRead;
use serde::Serialize;

use super::{FragmentDecode, FragmentKind, Vec2, Vec3};
use crate::wld::ZONE_MESH_FLAGS;
use crate::wld::error::WldResult;
use crate::wld::header::WldVersion;
use crate::wld::reader::FragmentReader;
use crate::wld::reference::Reference;

/// A triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, Serialize)]
#[br(little)]
pub struct Polygon {
    /// Flag bits; bit 4 marks a polygon the player can walk through
    pub flags: u16,
    /// Vertex indices
    pub vertices: [u16; 3],
}

/// A run of vertices bound to one bone
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, Serialize)]
#[br(little)]
pub struct VertexPiece {
    /// Number of consecutive vertices
    pub count: i16,
    /// Bone index within the skeleton
    pub bone: i16,
}

/// A run of polygons sharing one texture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, Serialize)]
#[br(little)]
pub struct PolygonTexture {
    /// Number of consecutive polygons
    pub count: i16,
    /// Slot in the mesh's texture list
    pub texture: i16,
}

/// 0x36: a mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mesh {
    /// Flag bits; [`ZONE_MESH_FLAGS`] marks zone geometry
    pub flags: u32,
    /// Texture list (0x31) the polygon textures index into
    pub texture_list: Reference,
    /// Animated vertex source (0x2F)
    pub animated_vertices: Reference,
    /// Origin the vertex offsets are relative to
    pub center: Vec3,
    /// Unknown parameters
    pub params: [i32; 3],
    /// Bounding radius
    pub max_distance: f32,
    /// Bounding box minimum
    pub min: Vec3,
    /// Bounding box maximum
    pub max: Vec3,
    /// Vertex positions, already offset by `center`
    pub vertices: Vec<Vec3>,
    /// Texture coordinates
    pub texture_coords: Vec<Vec2>,
    /// Unit normals
    pub normals: Vec<Vec3>,
    /// Packed vertex colors
    pub colors: Vec<u32>,
    /// Triangles
    pub polygons: Vec<Polygon>,
    /// Bone bindings
    pub vertex_pieces: Vec<VertexPiece>,
    /// Texture runs over `polygons`
    pub polygon_textures: Vec<PolygonTexture>,
    /// Declared size of the vertex texture section, which is not decoded
    pub vertex_texture_count: i16,
    /// Declared size of the trailing unknown section, which is not decoded
    pub size9: i16,
    /// Fixed-point shift applied to vertices
    pub scale: i16,
}

impl Mesh {
    /// Whether this is zone (terrain) geometry
    pub fn is_zone_mesh(&self) -> bool {
        self.flags == ZONE_MESH_FLAGS
    }

    /// Texture list slot of each polygon, expanded from the texture runs
    ///
    /// Polygons past the last run get no slot.
    pub fn polygon_texture_slots(&self) -> Vec<Option<i16>> {
        let mut slots = Vec::with_capacity(self.polygons.len());
        for run in &self.polygon_textures {
            let count = usize::try_from(run.count).unwrap_or(0);
            let take = count.min(self.polygons.len() - slots.len());
            slots.extend(std::iter::repeat_n(Some(run.texture), take));
        }
        slots.resize(self.polygons.len(), None);
        slots
    }
}

/// Multiplier turning a fixed-point value with `scale` fractional bits into
/// a float
fn fixed_point(scale: i16) -> f32 {
    1.0 / 2f32.powi(i32::from(scale))
}

impl FragmentDecode for Mesh {
    const KIND: FragmentKind = FragmentKind::Mesh;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let flags = reader.u32()?;
        let texture_list = reader.reference()?;
        let animated_vertices = reader.reference()?;
        reader.skip(8)?;
        let center: Vec3 = reader.read()?;
        let params = [reader.i32()?, reader.i32()?, reader.i32()?];
        let max_distance = reader.f32()?;
        let min: Vec3 = reader.read()?;
        let max: Vec3 = reader.read()?;

        let vertex_count = reader.count16("vertex")?;
        let texcoord_count = reader.count16("texture coordinate")?;
        let normal_count = reader.count16("normal")?;
        let color_count = reader.count16("color")?;
        let polygon_count = reader.count16("polygon")?;
        let vertex_piece_count = reader.count16("vertex piece")?;
        let polygon_texture_count = reader.count16("polygon texture")?;
        let vertex_texture_count = reader.i16()?;
        let size9 = reader.i16()?;
        let scale = reader.i16()?;

        let factor = fixed_point(scale);
        let raw_vertices: Vec<[i16; 3]> = reader.read_many(vertex_count, 6)?;
        let vertices = raw_vertices
            .into_iter()
            .map(|[x, y, z]| {
                Vec3::new(
                    center.x + f32::from(x) * factor,
                    center.y + f32::from(y) * factor,
                    center.z + f32::from(z) * factor,
                )
            })
            .collect();

        let texture_coords = match reader.version() {
            WldVersion::Old => {
                let raw: Vec<[i16; 2]> = reader.read_many(texcoord_count, 4)?;
                raw.into_iter()
                    .map(|[u, v]| Vec2 {
                        u: f32::from(u) / 256.0,
                        v: f32::from(v) / 256.0,
                    })
                    .collect()
            }
            WldVersion::New => {
                let raw: Vec<[i32; 2]> = reader.read_many(texcoord_count, 8)?;
                raw.into_iter()
                    .map(|[u, v]| Vec2 {
                        u: u as f32,
                        v: v as f32,
                    })
                    .collect()
            }
        };

        let raw_normals: Vec<[i8; 3]> = reader.read_many(normal_count, 3)?;
        let normals = raw_normals
            .into_iter()
            .map(|[x, y, z]| {
                Vec3::new(
                    f32::from(x) / 127.0,
                    f32::from(y) / 127.0,
                    f32::from(z) / 127.0,
                )
            })
            .collect();

        let colors = reader.read_many(color_count, 4)?;
        let polygons = reader.read_many(polygon_count, 8)?;
        let vertex_pieces = reader.read_many(vertex_piece_count, 4)?;
        let polygon_textures = reader.read_many(polygon_texture_count, 4)?;

        Ok(Self {
            flags,
            texture_list,
            animated_vertices,
            center,
            params,
            max_distance,
            min,
            max,
            vertices,
            texture_coords,
            normals,
            colors,
            polygons,
            vertex_pieces,
            polygon_textures,
            vertex_texture_count,
            size9,
            scale,
        })
    }
}

/// 0x37: per-frame vertex positions for a vertex-animated mesh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimatedMesh {
    /// Flag bits
    pub flags: u32,
    /// Unknown parameter
    pub param1: i16,
    /// Unknown parameter
    pub param2: i16,
    /// Fixed-point shift applied to positions
    pub scale: i16,
    /// One vertex array per frame
    pub frames: Vec<Vec<Vec3>>,
}

impl AnimatedMesh {
    /// Vertices per frame
    pub fn vertex_count(&self) -> usize {
        self.frames.first().map_or(0, Vec::len)
    }
}

impl FragmentDecode for AnimatedMesh {
    const KIND: FragmentKind = FragmentKind::AnimatedMesh;

    fn decode(reader: &mut FragmentReader<'_>) -> WldResult<Self> {
        let flags = reader.u32()?;
        let vertex_count = reader.count16("animated vertex")?;
        let frame_count = reader.count16("frame")?;
        let param1 = reader.i16()?;
        let param2 = reader.i16()?;
        let scale = reader.i16()?;

        let factor = fixed_point(scale);
        reader.ensure(vertex_count.saturating_mul(frame_count).saturating_mul(6))?;
        let mut frames = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            let raw: Vec<[i16; 3]> = reader.read_many(vertex_count, 6)?;
            frames.push(
                raw.into_iter()
                    .map(|[x, y, z]| {
                        Vec3::new(
                            f32::from(x) * factor,
                            f32::from(y) * factor,
                            f32::from(z) * factor,
                        )
                    })
                    .collect(),
            );
        }

        Ok(Self {
            flags,
            param1,
            param2,
            scale,
            frames,
        })
    }
}
