//! Non-owning views over resource bytes.
//!
//! A view is a byte slice plus a position. Every view is built through
//! [`ViewAt::view_at`], which checks that the header and the data it
//! announces fit inside the borrowed span. Reference slots are resolved
//! relative to their own position within the enclosing resource span, so
//! views read the same values wherever the bytes happen to live.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Result, RuntimeError};
use crate::reference::RelRef;
use crate::wire::{read_header, Flat, HEADER_WIDTH, OFFSET_WIDTH};

/// Constructs a view over the data whose length header sits at `pos`.
pub trait ViewAt<'a>: Sized {
    fn view_at(bytes: &'a [u8], pos: usize) -> Result<Self>;
}

/// Reads the header at `pos` and returns the position one past the data
/// it announces.
fn checked_extent(bytes: &[u8], pos: usize) -> Result<(usize, usize)> {
    let len = read_header(bytes, pos).ok_or(RuntimeError::OutOfBounds {
        offset: pos,
        len: HEADER_WIDTH,
        span: bytes.len(),
    })? as usize;
    let start = pos + HEADER_WIDTH;
    match start.checked_add(len) {
        Some(end) if end <= bytes.len() => Ok((len, end)),
        _ => Err(RuntimeError::OutOfBounds {
            offset: start,
            len,
            span: bytes.len(),
        }),
    }
}

/// Reads the reference slot at `slot` and resolves it inside `span`.
fn resolve_slot(span: &[u8], slot: usize) -> Result<usize> {
    let reference = RelRef::read(span, slot)?;
    if reference.is_null() {
        return Err(RuntimeError::NullReference { field: slot });
    }
    reference.resolve(slot, span.len())
}

// ---------------------------------------------------------------------------
// Resource view
// ---------------------------------------------------------------------------

/// View over one resource: `[u32 payload length][payload]`.
///
/// Field offsets passed to the accessors are relative to the start of the
/// payload, matching the offsets a builder stores fields at.
#[derive(Clone, Copy)]
pub struct ResourceView<'a> {
    span: &'a [u8],
}

impl<'a> ResourceView<'a> {
    /// Views a resource whose header is at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        Self::view_at(bytes, 0)
    }

    /// Wraps a span already known to hold exactly one resource.
    pub(crate) fn from_span(span: &'a [u8]) -> Self {
        Self { span }
    }

    /// Payload length in bytes (excluding the header).
    pub fn byte_size(&self) -> usize {
        self.span.len() - HEADER_WIDTH
    }

    /// The whole resource, header included.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.span
    }

    /// The payload: fixed field slots followed by child data.
    pub fn payload(&self) -> &'a [u8] {
        &self.span[HEADER_WIDTH..]
    }

    /// Fails unless the payload has room for `fields_size` bytes of slots.
    pub fn expect_fields(self, fields_size: u32) -> Result<Self> {
        if self.byte_size() < fields_size as usize {
            return Err(RuntimeError::TooSmall {
                offset: 0,
                size: self.byte_size(),
                expected: fields_size as usize,
            });
        }
        Ok(self)
    }

    /// Reads an inline value stored at `field`.
    pub fn try_read<T: Flat>(&self, field: u32) -> Result<T> {
        let start = HEADER_WIDTH + field as usize;
        self.span
            .get(start..start + T::WIDTH)
            .map(T::read_from)
            .ok_or(RuntimeError::OutOfBounds {
                offset: start,
                len: T::WIDTH,
                span: self.span.len(),
            })
    }

    /// Reads an inline value stored at `field`.
    ///
    /// # Panics
    /// Panics if the slot lies outside the payload. Typed views check the
    /// payload against their fixed slots when they are constructed, so
    /// their accessors never hit this.
    pub fn read<T: Flat>(&self, field: u32) -> T {
        let start = HEADER_WIDTH + field as usize;
        T::read_from(&self.span[start..start + T::WIDTH])
    }

    /// Reads the raw self-relative offset stored at `field`.
    pub fn reference(&self, field: u32) -> Result<RelRef> {
        RelRef::read(self.span, HEADER_WIDTH + field as usize)
    }

    /// Returns `true` if the reference slot at `field` has been assigned.
    pub fn has(&self, field: u32) -> bool {
        self.reference(field).is_ok_and(|r| !r.is_null())
    }

    /// Follows the reference stored at `field` and views its target.
    pub fn deref<V: ViewAt<'a>>(&self, field: u32) -> Result<V> {
        let slot = HEADER_WIDTH + field as usize;
        let target = resolve_slot(self.span, slot)?;
        V::view_at(self.span, target)
    }
}

impl<'a> ViewAt<'a> for ResourceView<'a> {
    fn view_at(bytes: &'a [u8], pos: usize) -> Result<Self> {
        let (_, end) = checked_extent(bytes, pos)?;
        Ok(Self {
            span: &bytes[pos..end],
        })
    }
}

impl fmt::Debug for ResourceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceView")
            .field("byte_size", &self.byte_size())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Array views
// ---------------------------------------------------------------------------

/// View over an array of inline values: `[u32 byte length][elements]`.
pub struct ArrayView<'a, T: Flat> {
    elements: &'a [u8],
    offset: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Flat + 'a> ArrayView<'a, T> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len() / T::WIDTH
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Length of the element data in bytes.
    pub fn byte_len(&self) -> usize {
        self.elements.len()
    }

    /// Encoded element bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.elements
    }

    /// Returns the element at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(T::WIDTH)?;
        let end = start.checked_add(T::WIDTH)?;
        self.elements.get(start..end).map(T::read_from)
    }

    /// Iterates the decoded elements.
    pub fn iter(&self) -> impl Iterator<Item = T> + 'a {
        self.elements.chunks_exact(T::WIDTH).map(T::read_from)
    }

    /// Decodes every element into a vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<'a, T: Flat> ViewAt<'a> for ArrayView<'a, T> {
    fn view_at(bytes: &'a [u8], pos: usize) -> Result<Self> {
        let (byte_len, end) = checked_extent(bytes, pos)?;
        if T::WIDTH == 0 || byte_len % T::WIDTH != 0 {
            return Err(RuntimeError::MisalignedArray {
                offset: pos,
                byte_len,
                width: T::WIDTH,
            });
        }
        Ok(Self {
            elements: &bytes[pos + HEADER_WIDTH..end],
            offset: pos,
            _marker: PhantomData,
        })
    }
}

impl<T: Flat> Clone for ArrayView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Flat> Copy for ArrayView<'_, T> {}

impl<'a, T: Flat + fmt::Debug + 'a> fmt::Debug for ArrayView<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// View over a NUL-terminated string stored as a byte array.
///
/// The stored length counts the terminator.
#[derive(Clone, Copy)]
pub struct StringView<'a> {
    chars: ArrayView<'a, u8>,
}

impl<'a> StringView<'a> {
    /// Stored length in bytes, terminator included.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Raw stored bytes, terminator included.
    pub fn as_bytes_with_nul(&self) -> &'a [u8] {
        self.chars.as_bytes()
    }

    /// Returns the stored text without its terminator. Interior NULs are
    /// part of the text.
    pub fn to_str(&self) -> Result<&'a str> {
        let text = match self.chars.as_bytes() {
            [text @ .., 0] => text,
            _ => {
                return Err(RuntimeError::MissingTerminator {
                    offset: self.chars.offset,
                })
            }
        };
        std::str::from_utf8(text).map_err(|_| RuntimeError::InvalidUtf8 {
            offset: self.chars.offset,
        })
    }
}

impl<'a> ViewAt<'a> for StringView<'a> {
    fn view_at(bytes: &'a [u8], pos: usize) -> Result<Self> {
        Ok(Self {
            chars: ArrayView::view_at(bytes, pos)?,
        })
    }
}

impl fmt::Debug for StringView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_str() {
            Ok(s) => fmt::Debug::fmt(s, f),
            Err(_) => f.debug_list().entries(self.chars.iter()).finish(),
        }
    }
}

/// View over an array of self-relative references.
///
/// Each element is a 4-byte slot resolved against its own position and
/// viewed as `V`.
pub struct RefArrayView<'a, V> {
    span: &'a [u8],
    first_slot: usize,
    len: usize,
    _marker: PhantomData<fn() -> V>,
}

impl<'a, V: ViewAt<'a>> RefArrayView<'a, V> {
    /// Number of references.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw stored offset of element `index`.
    pub fn reference(&self, index: usize) -> Option<RelRef> {
        if index >= self.len {
            return None;
        }
        RelRef::read(self.span, self.first_slot + index * OFFSET_WIDTH).ok()
    }

    /// Resolves element `index` and views its target.
    pub fn get(&self, index: usize) -> Result<V> {
        if index >= self.len {
            return Err(RuntimeError::OutOfBounds {
                offset: self.first_slot + index.saturating_mul(OFFSET_WIDTH),
                len: OFFSET_WIDTH,
                span: self.first_slot + self.len * OFFSET_WIDTH,
            });
        }
        let slot = self.first_slot + index * OFFSET_WIDTH;
        let target = resolve_slot(self.span, slot)?;
        V::view_at(self.span, target)
    }

    /// Resolves every element in order.
    pub fn iter(self) -> impl Iterator<Item = Result<V>> + 'a
    where
        V: 'a,
    {
        (0..self.len).map(move |i| self.get(i))
    }
}

impl<'a, V> ViewAt<'a> for RefArrayView<'a, V> {
    fn view_at(bytes: &'a [u8], pos: usize) -> Result<Self> {
        let (byte_len, _) = checked_extent(bytes, pos)?;
        if byte_len % OFFSET_WIDTH != 0 {
            return Err(RuntimeError::MisalignedArray {
                offset: pos,
                byte_len,
                width: OFFSET_WIDTH,
            });
        }
        Ok(Self {
            span: bytes,
            first_slot: pos + HEADER_WIDTH,
            len: byte_len / OFFSET_WIDTH,
            _marker: PhantomData,
        })
    }
}

impl<V> Clone for RefArrayView<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for RefArrayView<'_, V> {}

impl<V> fmt::Debug for RefArrayView<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefArrayView")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::encode;

    fn blob(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    #[test]
    fn resource_view_reads_inline_fields() {
        let bytes = blob(&[&encode(&6u32), &encode(&10u32), &encode(&-3i16)]);
        let view = ResourceView::new(&bytes).unwrap();
        assert_eq!(view.byte_size(), 6);
        assert_eq!(view.read::<u32>(0), 10);
        assert_eq!(view.read::<i16>(4), -3);
        assert!(view.try_read::<u32>(4).is_err());
    }

    #[test]
    fn resource_view_rejects_truncated_payload() {
        let bytes = blob(&[&encode(&16u32), &[0u8; 4]]);
        assert!(matches!(
            ResourceView::new(&bytes),
            Err(RuntimeError::OutOfBounds { .. })
        ));
        assert!(ResourceView::new(&[1, 0]).is_err());
    }

    #[test]
    fn expect_fields_checks_slot_room() {
        let bytes = blob(&[&encode(&4u32), &encode(&1u32)]);
        let view = ResourceView::new(&bytes).unwrap();
        assert!(view.expect_fields(4).is_ok());
        assert!(matches!(
            view.expect_fields(8),
            Err(RuntimeError::TooSmall { size: 4, expected: 8, .. })
        ));
    }

    #[test]
    fn deref_follows_self_relative_slot() {
        // payload: [ref slot][array header][3 x u16]
        // slot at span offset 4, array header at span offset 8 -> stored value 4
        let bytes = blob(&[
            &encode(&14u32),
            &encode(&4i32),
            &encode(&6u32),
            &encode(&1u16),
            &encode(&2u16),
            &encode(&3u16),
        ]);
        let view = ResourceView::new(&bytes).unwrap();
        assert!(view.has(0));
        let array: ArrayView<u16> = view.deref(0).unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.to_vec(), vec![1, 2, 3]);
        assert_eq!(array.get(3), None);
    }

    #[test]
    fn unassigned_reference_is_reported() {
        let bytes = blob(&[&encode(&4u32), &encode(&0i32)]);
        let view = ResourceView::new(&bytes).unwrap();
        assert!(!view.has(0));
        assert!(matches!(
            view.deref::<StringView>(0),
            Err(RuntimeError::NullReference { field: 4 })
        ));
    }

    #[test]
    fn misaligned_array_is_rejected() {
        let bytes = blob(&[&encode(&3u32), &[1, 2, 3]]);
        assert!(matches!(
            ArrayView::<u16>::view_at(&bytes, 0),
            Err(RuntimeError::MisalignedArray { byte_len: 3, width: 2, .. })
        ));
    }

    #[test]
    fn string_view_strips_terminator() {
        let bytes = blob(&[&encode(&6u32), b"brick\0"]);
        let s = StringView::view_at(&bytes, 0).unwrap();
        assert_eq!(s.len(), 6);
        assert_eq!(s.to_str().unwrap(), "brick");
    }

    #[test]
    fn string_view_keeps_interior_nul() {
        let bytes = blob(&[&encode(&4u32), b"a\0b\0"]);
        let s = StringView::view_at(&bytes, 0).unwrap();
        assert_eq!(s.to_str().unwrap(), "a\0b");

        let bytes = blob(&[&encode(&1u32), b"\0"]);
        assert_eq!(StringView::view_at(&bytes, 0).unwrap().to_str().unwrap(), "");
    }

    #[test]
    fn array_get_with_huge_index_is_none() {
        let bytes = blob(&[&encode(&8u32), &encode(&1u32), &encode(&2u32)]);
        let array = ArrayView::<u32>::view_at(&bytes, 0).unwrap();
        assert_eq!(array.get(1), Some(2));
        assert_eq!(array.get(usize::MAX / 4), None);
        assert_eq!(array.get(usize::MAX), None);
    }

    #[test]
    fn ref_array_iter_outlives_the_view_value() {
        let bytes = blob(&[&encode(&4u32), &encode(&4i32), &encode(&2u32), b"z\0"]);
        let strings = {
            let refs: RefArrayView<StringView> = RefArrayView::view_at(&bytes, 0).unwrap();
            refs.iter()
        };
        let strings = strings
            .map(|s| s.and_then(|s| s.to_str()))
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(strings, vec!["z"]);
    }

    #[test]
    fn string_view_without_terminator_fails() {
        let bytes = blob(&[&encode(&3u32), b"abc"]);
        let s = StringView::view_at(&bytes, 0).unwrap();
        assert!(matches!(
            s.to_str(),
            Err(RuntimeError::MissingTerminator { .. })
        ));
    }

    #[test]
    fn ref_array_resolves_each_slot() {
        // [hdr 8][slot0 -> +8][slot1 -> +10][str "a\0"][str "bc\0"]
        let bytes = blob(&[
            &encode(&8u32),
            &encode(&8i32),
            &encode(&10i32),
            &encode(&2u32),
            b"a\0",
            &encode(&3u32),
            b"bc\0",
        ]);
        let refs: RefArrayView<StringView> = RefArrayView::view_at(&bytes, 0).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs.get(0).unwrap().to_str().unwrap(), "a");
        assert_eq!(refs.get(1).unwrap().to_str().unwrap(), "bc");
        assert!(refs.get(2).is_err());
        assert_eq!(refs.reference(1), Some(RelRef::new(10)));
    }
}
