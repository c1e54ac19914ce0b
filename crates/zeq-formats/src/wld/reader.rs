//! Bounded little-endian cursor over one fragment payload

use binrw::{BinRead, Endian};
use std::io::{Cursor, Seek, SeekFrom};

use super::WldOptions;
use super::error::{WldError, WldResult};
use super::header::WldVersion;
use super::names::{NameRef, NameTable};
use super::reference::Reference;

/// Reader handed to each fragment decoder
///
/// Every read is limited to the record's payload. Running past the end fails
/// with [`WldError::Truncated`] instead of reading into the next record.
pub struct FragmentReader<'a> {
    cursor: Cursor<&'a [u8]>,
    names: &'a NameTable,
    version: WldVersion,
    options: &'a WldOptions,
    index: u32,
}

impl<'a> FragmentReader<'a> {
    /// Create a reader over `payload` for the fragment at 1-based `index`
    pub fn new(
        payload: &'a [u8],
        names: &'a NameTable,
        version: WldVersion,
        options: &'a WldOptions,
        index: u32,
    ) -> Self {
        Self {
            cursor: Cursor::new(payload),
            names,
            version,
            options,
            index,
        }
    }

    /// Stream version, for layouts that depend on it
    pub fn version(&self) -> WldVersion {
        self.version
    }

    /// Stream name table
    pub fn names(&self) -> &'a NameTable {
        self.names
    }

    /// Parse options
    pub fn options(&self) -> &'a WldOptions {
        self.options
    }

    /// 1-based sequence number of the fragment being decoded
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Current offset within the payload
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Unread payload bytes
    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len();
        len.saturating_sub(self.cursor.position() as usize)
    }

    /// Read any fixed-layout value
    pub fn read<T>(&mut self) -> WldResult<T>
    where
        for<'b> T: BinRead<Args<'b> = ()>,
    {
        let position = self.cursor.position();
        T::read_options(&mut self.cursor, Endian::Little, ()).map_err(|err| {
            if err.is_eof() {
                self.truncated(position)
            } else {
                WldError::BinRw(err)
            }
        })
    }

    /// Read `count` fixed-layout values of `size` bytes each
    ///
    /// The whole run is bounds-checked before anything is allocated.
    pub fn read_many<T>(&mut self, count: usize, size: usize) -> WldResult<Vec<T>>
    where
        for<'b> T: BinRead<Args<'b> = ()>,
    {
        self.ensure(count.saturating_mul(size))?;
        (0..count).map(|_| self.read()).collect()
    }

    /// Read a `u8`
    pub fn u8(&mut self) -> WldResult<u8> {
        self.read()
    }

    /// Read an `i8`
    pub fn i8(&mut self) -> WldResult<i8> {
        self.read()
    }

    /// Read a `u16`
    pub fn u16(&mut self) -> WldResult<u16> {
        self.read()
    }

    /// Read an `i16`
    pub fn i16(&mut self) -> WldResult<i16> {
        self.read()
    }

    /// Read a `u32`
    pub fn u32(&mut self) -> WldResult<u32> {
        self.read()
    }

    /// Read an `i32`
    pub fn i32(&mut self) -> WldResult<i32> {
        self.read()
    }

    /// Read an `f32`
    pub fn f32(&mut self) -> WldResult<f32> {
        self.read()
    }

    /// Read an `i32` count; negative values are rejected
    pub fn count(&mut self, field: &'static str) -> WldResult<usize> {
        let raw = self.i32()?;
        self.check_count(field, i64::from(raw))
    }

    /// Read an `i16` count; negative values are rejected
    pub fn count16(&mut self, field: &'static str) -> WldResult<usize> {
        let raw = self.i16()?;
        self.check_count(field, i64::from(raw))
    }

    /// Validate a count read some other way
    pub fn check_count(&self, field: &'static str, raw: i64) -> WldResult<usize> {
        usize::try_from(raw).map_err(|_| WldError::InvalidCount {
            fragment: self.index,
            field,
            count: raw,
        })
    }

    /// Read a reference field
    pub fn reference(&mut self) -> WldResult<Reference> {
        let raw = self.i32()?;
        Reference::from_raw(raw, self.names)
    }

    /// Read `count` reference fields
    pub fn references(&mut self, count: usize) -> WldResult<Vec<Reference>> {
        self.ensure(count.saturating_mul(4))?;
        (0..count).map(|_| self.reference()).collect()
    }

    /// Read a name field
    pub fn name(&mut self) -> WldResult<Option<NameRef>> {
        let raw = self.i32()?;
        self.names.from_raw(raw)
    }

    /// Borrow the next `len` bytes
    pub fn bytes(&mut self, len: usize) -> WldResult<&'a [u8]> {
        self.ensure(len)?;
        let start = self.cursor.position() as usize;
        let payload: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + len) as u64);
        Ok(&payload[start..start + len])
    }

    /// Skip `len` bytes
    pub fn skip(&mut self, len: usize) -> WldResult<()> {
        self.ensure(len)?;
        self.cursor.seek(SeekFrom::Current(len as i64))?;
        Ok(())
    }

    /// Fail unless at least `len` bytes remain
    pub fn ensure(&self, len: usize) -> WldResult<()> {
        if len > self.remaining() {
            return Err(self.truncated(self.position()));
        }
        Ok(())
    }

    fn truncated(&self, position: u64) -> WldError {
        WldError::Truncated {
            fragment: self.index,
            position,
        }
    }
}
