//! ResourceStream - append-only byte buffer backing resource builders.
//!
//! All offsets handed out by the stream are absolute positions from the
//! start of the stream. Builders convert them into resource-relative and
//! field-relative offsets.

use crate::error::{Result, RuntimeError};
use crate::wire::Flat;

/// An append-only growable byte buffer.
///
/// Exactly one builder owns a stream at a time; nested builders take it from
/// their parent and hand it back when they are finished.
#[derive(Debug, Default)]
pub struct ResourceStream {
    data: Vec<u8>,
}

impl ResourceStream {
    /// Creates a new empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new stream with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Appends `bytes` and returns the offset they were written at.
    pub fn write(&mut self, bytes: &[u8]) -> Result<u32> {
        let offset = self.widen(bytes.len())?;
        let start = offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(offset)
    }

    /// Appends a single fixed-width value and returns its offset.
    pub fn write_value<T: Flat>(&mut self, value: &T) -> Result<u32> {
        let offset = self.widen(T::WIDTH)?;
        let start = offset as usize;
        value.write_to(&mut self.data[start..start + T::WIDTH]);
        Ok(offset)
    }

    /// Grows the stream by `width` zeroed bytes and returns the offset of
    /// the new region.
    ///
    /// # Errors
    /// Returns `CapacityOverflow` if the stream would outgrow the 32-bit
    /// offset range of the wire format.
    pub fn widen(&mut self, width: usize) -> Result<u32> {
        let offset = self.size()?;
        let new_len = self
            .data
            .len()
            .checked_add(width)
            .filter(|len| u32::try_from(*len).is_ok())
            .ok_or(RuntimeError::CapacityOverflow {
                operation: "stream widen",
            })?;
        self.data.resize(new_len, 0);
        Ok(offset)
    }

    /// Overwrites a fixed-width value at an absolute offset.
    ///
    /// # Panics
    /// Panics if the value does not lie inside the written stream. Builders
    /// only patch slots they reserved themselves.
    pub fn patch<T: Flat>(&mut self, offset: u32, value: &T) {
        let start = offset as usize;
        value.write_to(&mut self.data[start..start + T::WIDTH]);
    }

    /// Reads back a fixed-width value at an absolute offset.
    pub fn peek<T: Flat>(&self, offset: u32) -> Option<T> {
        let start = offset as usize;
        self.data.get(start..start + T::WIDTH).map(T::read_from)
    }

    /// Current length of the stream as a wire offset.
    pub fn size(&self) -> Result<u32> {
        u32::try_from(self.data.len()).map_err(|_| RuntimeError::CapacityOverflow {
            operation: "stream size",
        })
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the stream, returning its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
