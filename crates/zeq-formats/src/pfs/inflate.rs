//! Single-shot zlib block compression

use flate2::read::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use std::io::Read;

use super::error::{PfsError, PfsResult};

/// Inflate one zlib block whose output size is known in advance
///
/// The whole input must be consumed, the stream must end cleanly, and exactly
/// `expected_len` bytes must come out.
pub fn inflate_block(compressed: &[u8], expected_len: usize) -> PfsResult<Vec<u8>> {
    let mut output = Vec::with_capacity(expected_len);
    let mut decompress = Decompress::new(true);

    let status = decompress
        .decompress_vec(compressed, &mut output, FlushDecompress::Finish)
        .map_err(|e| PfsError::Decompression(format!("corrupt zlib stream: {e}")))?;

    if status != Status::StreamEnd {
        return Err(PfsError::Decompression(format!(
            "zlib stream did not end within {expected_len} output bytes"
        )));
    }

    let consumed = decompress.total_in();
    if consumed != compressed.len() as u64 {
        return Err(PfsError::Decompression(format!(
            "{} trailing bytes after zlib stream",
            compressed.len() as u64 - consumed
        )));
    }

    if output.len() != expected_len {
        return Err(PfsError::Decompression(format!(
            "inflated {} bytes, expected {expected_len}",
            output.len()
        )));
    }

    Ok(output)
}

/// Deflate one block for storage in an archive
pub fn deflate_block(data: &[u8]) -> PfsResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(data, Compression::default());
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| PfsError::Decompression(format!("zlib compression failed: {e}")))?;
    Ok(compressed)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_inflate_known_length() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(20);
        let compressed = deflate_block(&data).unwrap();
        assert!(compressed.len() < data.len());

        let inflated = inflate_block(&compressed, data.len()).unwrap();
        assert_eq!(inflated, data);
    }

    #[test]
    fn test_wrong_expected_length() {
        let data = vec![0xAAu8; 512];
        let compressed = deflate_block(&data).unwrap();

        // Too little room: the stream cannot finish
        assert!(matches!(
            inflate_block(&compressed, 100),
            Err(PfsError::Decompression(_))
        ));
        // Too much room: the stream finishes short
        assert!(matches!(
            inflate_block(&compressed, 1024),
            Err(PfsError::Decompression(_))
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let data = b"some block payload that compresses".repeat(8);
        let compressed = deflate_block(&data).unwrap();
        let truncated = &compressed[..compressed.len() / 2];

        let err = inflate_block(truncated, data.len()).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let data = b"payload".to_vec();
        let mut compressed = deflate_block(&data).unwrap();
        compressed.extend_from_slice(&[1, 2, 3]);

        assert!(matches!(
            inflate_block(&compressed, data.len()),
            Err(PfsError::Decompression(_))
        ));
    }

    #[test]
    fn test_garbage_input() {
        assert!(matches!(
            inflate_block(&[0xFF; 16], 16),
            Err(PfsError::Decompression(_))
        ));
    }
}
