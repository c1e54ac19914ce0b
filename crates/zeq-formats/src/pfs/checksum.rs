//! Directory checksums
//!
//! Directory records carry a CRC-32 of the entry's file name: the
//! non-reflected CRC-32 polynomial `0x04C11DB7`, zero initial value and no
//! final XOR, taken over the lowercase name followed by its null terminator.
//! Readers locate entries by offset and never verify it; the builder needs it
//! to order the directory.

use crc::{Algorithm, Crc};

/// CRC parameters of PFS directory records
pub const PFS_NAME_CRC: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04C1_1DB7,
    init: 0,
    refin: false,
    refout: false,
    xorout: 0,
    check: 0x89A1_897F,
    residue: 0,
};

const NAME_CRC: Crc<u32> = Crc::<u32>::new(&PFS_NAME_CRC);

/// Checksum of arbitrary bytes under the directory CRC
pub fn checksum(data: &[u8]) -> u32 {
    NAME_CRC.checksum(data)
}

/// Checksum stored in the directory record of a file called `name`
pub fn name_crc(name: &str) -> u32 {
    let lowered = name.to_ascii_lowercase();
    let mut digest = NAME_CRC.digest();
    digest.update(lowered.as_bytes());
    digest.update(&[0]);
    digest.finalize()
}
