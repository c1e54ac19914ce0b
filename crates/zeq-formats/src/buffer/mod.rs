//! Byte accumulation buffers
//!
//! Archive entries arrive as a run of independently inflated blocks that must
//! be joined into one contiguous body. Two strategies are provided:
//!
//! - [`GrowableBuffer`]: a power-of-two dynamic array. Every append that
//!   overflows capacity copies everything accumulated so far.
//! - [`MergeBuffer`]: keeps recent chunks un-merged on a size-ordered stack and
//!   only joins runs of smaller entries into a larger one, so a run of
//!   equal-sized blocks is copied exactly once.
//!
//! Both implement [`ByteBuffer`].

mod growable;
mod merge;

pub use growable::{GrowableBuffer, MIN_CAPACITY};
pub use merge::MergeBuffer;

/// Shared interface of the accumulation buffers
///
/// Accessors take `&mut self` because a [`MergeBuffer`] has to collapse its
/// stack before it can hand out a contiguous view.
pub trait ByteBuffer {
    /// Append a copy of `data`
    fn append(&mut self, data: &[u8]);

    /// Borrow the accumulated bytes; valid until the next mutation
    fn read(&mut self) -> &[u8];

    /// Return an owned copy of the accumulated bytes
    fn copy(&mut self) -> Vec<u8> {
        self.read().to_vec()
    }

    /// Transfer the accumulated bytes to the caller
    ///
    /// With `reset` the buffer is immediately ready for reuse; without it the
    /// buffer is left empty and may need re-initialization before its next use.
    fn take(&mut self, reset: bool) -> Vec<u8>;

    /// Number of accumulated bytes
    fn len(&mut self) -> usize;

    /// Whether nothing has been accumulated
    fn is_empty(&mut self) -> bool {
        self.len() == 0
    }
}
