//! Test utilities for hand-assembled archives and streams
//!
//! These helpers write bytes directly instead of going through the builders,
//! so tests can produce layouts the builders never would: misordered
//! directories, lying length fields, truncated data.

use crate::pfs::{PFS_MAGIC, deflate_block};
use crate::wld::fragment::Vec3;
use crate::wld::{
    FragmentDecode, FragmentReader, FragmentWriter, NameTable, WldOptions, WldResult, WldVersion,
};

/// One entry of a hand-built archive, stored as a single block
pub struct RawEntry {
    data: Vec<u8>,
    declared_len: Option<u32>,
    block_inflated_len: Option<u32>,
    deflated_len_delta: u32,
}

impl RawEntry {
    /// A file entry
    pub fn file(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            declared_len: None,
            block_inflated_len: None,
            deflated_len_delta: 0,
        }
    }

    /// A file-name table entry listing `names`
    pub fn names(names: &[&str]) -> Self {
        Self::file(&crate::pfs::names::write_names(names))
    }

    /// Override the inflated size written to the directory
    pub fn with_declared_len(mut self, len: u32) -> Self {
        self.declared_len = Some(len);
        self
    }

    /// Override the inflated size written to the block header
    pub fn with_block_inflated_len(mut self, len: u32) -> Self {
        self.block_inflated_len = Some(len);
        self
    }

    /// Overstate the block's deflated size by `delta` bytes
    pub fn with_deflated_len_delta(mut self, delta: u32) -> Self {
        self.deflated_len_delta = delta;
        self
    }
}

/// Assemble an archive: header, one block per entry, then the directory
pub fn build_raw_archive(entries: &[RawEntry]) -> Vec<u8> {
    let mut out = vec![0u8; 12];
    let mut directory = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let offset = out.len() as u32;
        if !entry.data.is_empty() {
            let compressed = deflate_block(&entry.data).unwrap();
            let deflated_len = compressed.len() as u32 + entry.deflated_len_delta;
            out.extend_from_slice(&deflated_len.to_le_bytes());
            let inflated_len = entry
                .block_inflated_len
                .unwrap_or(entry.data.len() as u32);
            out.extend_from_slice(&inflated_len.to_le_bytes());
            out.extend_from_slice(&compressed);
        }
        let declared = entry.declared_len.unwrap_or(entry.data.len() as u32);
        directory.push((index as u32, offset, declared));
    }

    let directory_offset = out.len() as u32;
    out.extend_from_slice(&(directory.len() as u32).to_le_bytes());
    for (crc, offset, len) in directory {
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&len.to_le_bytes());
    }

    out[0..4].copy_from_slice(&directory_offset.to_le_bytes());
    out[4..8].copy_from_slice(&PFS_MAGIC);
    out[8..12].copy_from_slice(&0x0002_0000u32.to_le_bytes());
    out
}

/// Reverse the order of the directory records of an archive
pub fn reverse_directory(archive: &[u8]) -> Vec<u8> {
    let mut out = archive.to_vec();
    let directory_offset = u32::from_le_bytes(archive[0..4].try_into().unwrap()) as usize;
    let count_end = directory_offset + 4;
    let count =
        u32::from_le_bytes(archive[directory_offset..count_end].try_into().unwrap()) as usize;

    let records: Vec<&[u8]> = archive[count_end..count_end + count * 12]
        .chunks(12)
        .rev()
        .collect();
    out[count_end..count_end + count * 12].copy_from_slice(&records.concat());
    out
}

/// Decode a payload as fragment 1 of a new-format stream with no names
pub fn decode_payload<T: FragmentDecode>(payload: &[u8]) -> WldResult<T> {
    decode_payload_with(payload, &NameTable::default(), WldVersion::New)
}

/// Decode a payload against a name table and version
pub fn decode_payload_with<T: FragmentDecode>(
    payload: &[u8],
    names: &NameTable,
    version: WldVersion,
) -> WldResult<T> {
    let options = WldOptions::default();
    T::decode(&mut FragmentReader::new(payload, names, version, &options, 1))
}

/// Decode a payload as the fragment at 1-based `index`
pub fn decode_payload_at<T: FragmentDecode>(payload: &[u8], index: u32) -> WldResult<T> {
    let names = NameTable::default();
    let options = WldOptions::default();
    T::decode(&mut FragmentReader::new(
        payload,
        &names,
        WldVersion::New,
        &options,
        index,
    ))
}

/// Section counts of a hand-built mesh
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshCounts {
    pub vertices: i16,
    pub texture_coords: i16,
    pub normals: i16,
    pub colors: i16,
    pub polygons: i16,
    pub vertex_pieces: i16,
    pub polygon_textures: i16,
    pub scale: i16,
}

/// Mesh header with no references and a zero bounding box; section data
/// is appended by the caller
pub fn mesh_payload(flags: u32, center: Vec3, counts: MeshCounts) -> FragmentWriter {
    FragmentWriter::new()
        .u32(flags)
        .i32(0)
        .i32(0)
        .bytes(&[0; 8])
        .vec3(center)
        .i32(0)
        .i32(0)
        .i32(0)
        .f32(0.0)
        .bytes(&[0; 24])
        .i16(counts.vertices)
        .i16(counts.texture_coords)
        .i16(counts.normals)
        .i16(counts.colors)
        .i16(counts.polygons)
        .i16(counts.vertex_pieces)
        .i16(counts.polygon_textures)
        .i16(0)
        .i16(0)
        .i16(counts.scale)
}
