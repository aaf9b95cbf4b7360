//! Typed offsets: builder-side `Ref<T>` and read-side `RelRef`.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Result, RuntimeError};
use crate::wire::{Flat, OffsetType, HEADER_WIDTH};

/// Builder-side handle to data appended to a resource.
///
/// Holds the target's offset relative to the data base of the resource that
/// created it (the first byte after the resource's length header). Storing a
/// `Ref` into a field converts it to a field-relative offset. `T` names the
/// view the target is read back through.
pub struct Ref<T: ?Sized> {
    offset: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized> Ref<T> {
    /// Wraps a base-relative offset.
    pub const fn new(offset: u32) -> Self {
        Self {
            offset,
            _marker: PhantomData,
        }
    }

    /// The marker returned by a root builder's `build()`.
    pub const fn root() -> Self {
        Self::new(0)
    }

    /// Base-relative offset of the target.
    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// Reinterprets the handle as pointing at a different view type.
    pub const fn cast<U: ?Sized>(self) -> Ref<U> {
        Ref::new(self.offset)
    }
}

impl<T: ?Sized> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Ref<T> {}

impl<T: ?Sized> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl<T: ?Sized> Eq for Ref<T> {}

impl<T: ?Sized> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.offset).finish()
    }
}

/// A stored self-relative offset as read from a reference slot.
///
/// The target address is `slot position + value`; nothing else about the
/// surrounding memory is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelRef(OffsetType);

impl RelRef {
    /// Wraps a raw stored value.
    pub const fn new(value: OffsetType) -> Self {
        Self(value)
    }

    /// Reads the stored value from the slot at `slot` in `bytes`.
    pub fn read(bytes: &[u8], slot: usize) -> Result<Self> {
        let end = slot.checked_add(OffsetType::WIDTH);
        match end.and_then(|end| bytes.get(slot..end)) {
            Some(raw) => Ok(Self(OffsetType::read_from(raw))),
            None => Err(RuntimeError::OutOfBounds {
                offset: slot,
                len: OffsetType::WIDTH,
                span: bytes.len(),
            }),
        }
    }

    /// Raw stored value.
    pub const fn value(self) -> OffsetType {
        self.0
    }

    /// Returns `true` if the slot was never assigned.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Resolves the reference stored at `slot` against a span of
    /// `span_len` bytes.
    ///
    /// Every target starts with a length header, so the target must leave
    /// room for one inside the span.
    pub fn resolve(self, slot: usize, span_len: usize) -> Result<usize> {
        let dangling = RuntimeError::DanglingReference {
            field: slot,
            value: self.0,
            span: span_len,
        };
        let target = i64::try_from(slot).map_err(|_| RuntimeError::CapacityOverflow {
            operation: "reference resolve",
        })? + i64::from(self.0);
        if target < 0 {
            return Err(dangling);
        }
        let target = target as u64;
        if target + HEADER_WIDTH as u64 > span_len as u64 {
            return Err(dangling);
        }
        Ok(target as usize)
    }
}
