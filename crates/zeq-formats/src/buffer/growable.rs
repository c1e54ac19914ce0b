//! Power-of-two dynamic byte array

use super::ByteBuffer;

/// Capacity floor for a freshly initialized [`GrowableBuffer`]
pub const MIN_CAPACITY: usize = 32;

/// Dynamic byte array whose capacity is always a power of two
///
/// Storage is a zero-filled allocation of exactly `capacity` bytes, so the
/// capacity reported is the capacity allocated. When an append overflows it,
/// capacity doubles until the data fits and the contents move to the new
/// allocation.
#[derive(Debug, Clone)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    len: usize,
}

impl GrowableBuffer {
    /// Create an empty buffer with [`MIN_CAPACITY`] bytes of storage
    pub fn new() -> Self {
        Self {
            data: vec![0u8; MIN_CAPACITY],
            len: 0,
        }
    }

    /// Current capacity in bytes
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Restore minimum-capacity storage after a non-resetting [`take`]
    ///
    /// [`take`]: ByteBuffer::take
    pub fn reinit(&mut self) {
        if self.data.is_empty() {
            self.data = vec![0u8; MIN_CAPACITY];
        }
        self.len = 0;
    }

    fn grow_to(&mut self, required: usize) {
        let mut capacity = self.capacity().max(MIN_CAPACITY);
        while capacity < required {
            capacity <<= 1;
        }

        let mut grown = vec![0u8; capacity];
        grown[..self.len].copy_from_slice(&self.data[..self.len]);
        self.data = grown;
    }
}

impl Default for GrowableBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBuffer for GrowableBuffer {
    fn append(&mut self, bytes: &[u8]) {
        let new_len = self.len + bytes.len();
        if new_len > self.capacity() {
            self.grow_to(new_len);
        }
        self.data[self.len..new_len].copy_from_slice(bytes);
        self.len = new_len;
    }

    fn read(&mut self) -> &[u8] {
        &self.data[..self.len]
    }

    fn take(&mut self, reset: bool) -> Vec<u8> {
        let replacement = if reset {
            vec![0u8; MIN_CAPACITY]
        } else {
            Vec::new()
        };
        let mut taken = std::mem::replace(&mut self.data, replacement);
        taken.truncate(self.len);
        self.len = 0;
        taken
    }

    fn len(&mut self) -> usize {
        self.len
    }
}
