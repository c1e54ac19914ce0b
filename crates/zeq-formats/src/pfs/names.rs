//! The trailing file-name entry

use binrw::BinRead;
use std::io::Cursor;

use super::error::{PfsError, PfsResult};

/// Decode a file-name table: `count`, then `count` length-prefixed,
/// null-terminated names. Names come back lowercased.
pub(crate) fn parse_names(data: &[u8]) -> PfsResult<Vec<String>> {
    let mut cursor = Cursor::new(data);
    let count = u32::read_le(&mut cursor)
        .map_err(|_| PfsError::InvalidNameTable("missing name count".to_string()))?;

    // Every name needs at least its length field
    let max_possible = data.len().saturating_sub(4) / 4;
    let mut names = Vec::with_capacity((count as usize).min(max_possible));

    for index in 0..count {
        let len = u32::read_le(&mut cursor).map_err(|_| {
            PfsError::InvalidNameTable(format!("table ends before name {index} of {count}"))
        })? as usize;

        let start = cursor.position() as usize;
        let remaining = data.len() - start;
        if len > remaining {
            return Err(PfsError::InvalidNameTable(format!(
                "name {index} claims {len} bytes but only {remaining} remain"
            )));
        }

        let raw = &data[start..start + len];
        let terminated = raw.split(|&b| b == 0).next().unwrap_or_default();
        names.push(String::from_utf8_lossy(terminated).to_ascii_lowercase());
        cursor.set_position((start + len) as u64);
    }

    Ok(names)
}

/// Encode names as a file-name table, appending the null terminators
pub(crate) fn write_names<S: AsRef<str>>(names: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(names.len() as u32).to_le_bytes());
    for name in names {
        let bytes = name.as_ref().as_bytes();
        out.extend_from_slice(&(bytes.len() as u32 + 1).to_le_bytes());
        out.extend_from_slice(bytes);
        out.push(0);
    }
    out
}
