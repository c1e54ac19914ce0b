//! Deferred-concatenation buffer with a size-ordered merge stack
//!
//! Chunks are pushed onto a stack whose entries shrink from bottom to top.
//! When an incoming chunk is larger than the top entry, the run of entries
//! that is collectively smaller than the chunk is joined with it into a single
//! new top entry, much like carries in a binary counter. Archive entries are
//! split into equal-sized blocks with a shorter tail, which never triggers a
//! merge: each byte is copied once, by the final collapse.

use std::borrow::Cow;

use super::ByteBuffer;

const INITIAL_STACK_CAPACITY: usize = 4;

/// Buffer optimized for many appends followed by one read
///
/// Reading forces finalization: the stack collapses into a residual buffer.
/// Appending after a read is allowed; new chunks stack on top of the residual
/// and are joined into it by the next read.
#[derive(Debug, Clone)]
pub struct MergeBuffer {
    residual: Vec<u8>,
    stack: Vec<Vec<u8>>,
    bytes_copied: usize,
}

impl MergeBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            residual: Vec::new(),
            stack: Vec::with_capacity(INITIAL_STACK_CAPACITY),
            bytes_copied: 0,
        }
    }

    /// Push a copy of `chunk`
    pub fn push(&mut self, chunk: &[u8]) {
        self.push_chunk(Cow::Borrowed(chunk));
    }

    /// Push a chunk the caller no longer needs, avoiding a copy when it can
    /// sit on the stack as is
    pub fn push_owned(&mut self, chunk: Vec<u8>) {
        self.push_chunk(Cow::Owned(chunk));
    }

    /// Number of chunks waiting on the stack
    pub fn pending_chunks(&self) -> usize {
        self.stack.len()
    }

    /// Total bytes copied by merges and finalization so far
    pub fn bytes_copied(&self) -> usize {
        self.bytes_copied
    }

    /// Collapse the stack onto the residual buffer
    pub fn finalize(&mut self) {
        if self.stack.is_empty() {
            return;
        }

        if self.residual.is_empty() && self.stack.len() == 1 {
            self.residual = self.stack.pop().unwrap_or_default();
            return;
        }

        let pending: usize = self.stack.iter().map(Vec::len).sum();
        self.residual.reserve_exact(pending);
        for entry in self.stack.drain(..) {
            self.residual.extend_from_slice(&entry);
        }
        self.bytes_copied += pending;
    }

    fn push_chunk(&mut self, chunk: Cow<'_, [u8]>) {
        let merge_needed = self
            .stack
            .last()
            .is_some_and(|top| top.len() < chunk.len());

        if !merge_needed {
            self.stack.push(chunk.into_owned());
            return;
        }

        // Walk down until an entry at least as large as everything above it
        // (plus the new chunk) is found; everything above that entry merges.
        let mut total = chunk.len();
        let mut boundary = 0;
        for (index, entry) in self.stack.iter().enumerate().rev() {
            if entry.len() >= total {
                boundary = index + 1;
                break;
            }
            total += entry.len();
        }

        let mut merged = Vec::with_capacity(total);
        for entry in self.stack.drain(boundary..) {
            merged.extend_from_slice(&entry);
        }
        merged.extend_from_slice(&chunk);
        self.bytes_copied += total;

        self.stack.push(merged);
    }
}

impl Default for MergeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBuffer for MergeBuffer {
    fn append(&mut self, data: &[u8]) {
        self.push(data);
    }

    fn read(&mut self) -> &[u8] {
        self.finalize();
        &self.residual
    }

    fn take(&mut self, _reset: bool) -> Vec<u8> {
        self.finalize();
        std::mem::take(&mut self.residual)
    }

    fn len(&mut self) -> usize {
        self.finalize();
        self.residual.len()
    }
}
